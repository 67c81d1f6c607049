//! Container codec over JSON bundles

use filez_core::content::{ContainerCodec, MemberInfo};
use filez_core::error::InternalError;
use filez_core::Result;
use std::collections::BTreeMap;

/// Reads `.bundle` files: a JSON object mapping member paths to text
#[derive(Debug, Default, Clone, Copy)]
pub struct BundleCodec;

impl BundleCodec {
    /// Encode members into a bundle
    pub fn encode<'a>(members: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<u8> {
        let map: BTreeMap<&str, &str> = members.into_iter().collect();
        serde_json::to_vec(&map).unwrap_or_default()
    }

    fn decode(container: &[u8]) -> Result<BTreeMap<String, String>> {
        serde_json::from_slice(container)
            .map_err(|e| InternalError::codec("bundle", e.to_string()).into())
    }
}

impl ContainerCodec for BundleCodec {
    fn name(&self) -> &str {
        "bundle"
    }

    fn extensions(&self) -> &[&str] {
        &[".bundle"]
    }

    fn list_members(&self, container: &[u8]) -> Result<Vec<MemberInfo>> {
        Ok(Self::decode(container)?
            .into_iter()
            .map(|(name, value)| MemberInfo {
                name,
                size: value.len() as u64,
            })
            .collect())
    }

    fn extract_member(&self, container: &[u8], member: &str) -> Result<Vec<u8>> {
        Self::decode(container)?
            .remove(member)
            .map(String::into_bytes)
            .ok_or_else(|| InternalError::codec("bundle", format!("no member {member}")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_members() {
        let data = BundleCodec::encode([("docs/a.txt", "alpha"), ("b.txt", "beta")]);

        let members = BundleCodec.list_members(&data).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name, "b.txt");
        assert_eq!(BundleCodec.extract_member(&data, "docs/a.txt").unwrap(), b"alpha");
        assert!(BundleCodec.extract_member(&data, "c.txt").is_err());
        assert!(BundleCodec.list_members(b"[").is_err());
    }
}
