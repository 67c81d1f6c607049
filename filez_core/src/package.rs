//! Unpack pipeline steps
//!
//! The `package` step lists the members of a container file. Each member
//! becomes a [`FileEntry`] whose content is a [`NestedBuffer`]: the
//! container is reopened and the member decoded only when that content is
//! first read.

use crate::content::{
    ContainerCodec, ContainerOrigin, ContentBuffer, ContentSource, MemberInfo, NestedBuffer,
};
use crate::error::{ContentError, ValidationError};
use crate::file::FileEntry;
use crate::naming::NamingState;
use crate::pipeline::{Outcome, Params, Processor, ProcessorRegistry};
use crate::workspace::Environment;
use crate::Result;
use log::debug;
use std::sync::Arc;

#[cfg(feature = "zip")]
mod zip_codec;

#[cfg(feature = "zip")]
pub use zip_codec::ZipCodec;

/// Codecs available without extra features
pub fn default_codecs() -> Vec<Arc<dyn ContainerCodec>> {
    #[allow(unused_mut)]
    let mut codecs: Vec<Arc<dyn ContainerCodec>> = Vec::new();
    #[cfg(feature = "zip")]
    codecs.push(Arc::new(ZipCodec));
    codecs
}

/// Register the built-in unpackers
pub fn register(registry: &mut ProcessorRegistry<FileEntry, Environment>) {
    registry.register_instance(PackageUnpacker);
}

/// List container members with the codec matching the file's extension.
///
/// Files without a matching codec fail with the skippable unsupported
/// extension error, so the pipeline moves on quietly. The `codec` parameter
/// picks a codec by name instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackageUnpacker;

impl PackageUnpacker {
    fn codec(env: &Environment, entry: &FileEntry, params: &Params) -> Result<Arc<dyn ContainerCodec>> {
        if let Some(name) = params.str("codec")? {
            return env
                .codecs
                .iter()
                .find(|codec| codec.name() == name)
                .cloned()
                .ok_or_else(|| ValidationError::invalid_parameter("codec", &format!("unknown codec '{name}'")).into());
        }

        let extension = entry.naming.extension().to_ascii_lowercase();
        env.codec_for(&extension)
            .ok_or_else(|| ValidationError::unsupported_extension("package", &extension).into())
    }

    /// Stored files are reread from storage; anything else is copied out
    fn origin(env: &Environment, entry: &mut FileEntry) -> Result<ContainerOrigin> {
        let untouched = !(entry.state.adding || entry.state.changing);
        match &entry.path {
            Some(path) if untouched && env.storage.is_file(path) => Ok(ContainerOrigin::Stored {
                storage: env.storage.clone(),
                path: path.clone(),
            }),
            _ => {
                let display = entry.display_name();
                let content = entry
                    .content
                    .as_mut()
                    .ok_or_else(|| ContentError::missing(&display))?;
                Ok(ContainerOrigin::Memory(Arc::from(content.full_content()?)))
            }
        }
    }

    fn member_entry(
        env: &Environment,
        parent: &FileEntry,
        origin: &ContainerOrigin,
        codec: &Arc<dyn ContainerCodec>,
        member: MemberInfo,
    ) -> Result<FileEntry> {
        let basename = member.name.rsplit('/').next().unwrap_or(&member.name);
        let stream = NestedBuffer::new(origin.clone(), codec.clone(), member.name.clone());
        let content = ContentBuffer::new(
            ContentSource::Stream {
                stream: Box::new(stream),
                binary: true,
            },
            env.config.block_size,
            env.config.cache.clone(),
        )?;

        let mut entry = FileEntry::new(parent.options.clone());
        entry.naming = NamingState::new(basename);
        entry.content = Some(content);
        entry.overrides = parent.overrides.clone();
        entry.state.adding = true;
        entry.meta.size = Some(member.size);
        entry.meta.internal = true;
        entry.meta.member_path = Some(member.name);
        Ok(entry)
    }
}

impl Processor<FileEntry, Environment> for PackageUnpacker {
    fn name(&self) -> &str {
        "package"
    }

    fn process(&self, entry: &mut FileEntry, env: &Environment, params: &Params) -> Result<Outcome> {
        let codec = Self::codec(env, entry, params)?;
        let origin = Self::origin(env, entry)?;
        let members = codec.list_members(&origin.load()?)?;
        debug!(
            "Listed {} member(s) of {} with {}",
            members.len(),
            entry.display_name(),
            codec.name()
        );

        let members = members
            .into_iter()
            .map(|member| Self::member_entry(env, entry, &origin, &codec, member))
            .collect::<Result<Vec<_>>>()?;
        entry.members = members;
        entry.meta.packed = true;
        Ok(Some(true))
    }

    fn stopper(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::error::InternalError;
    use crate::storage::LocalStorage;
    use crate::workspace::Workspace;

    /// `name=value` per line
    #[derive(Debug)]
    struct PairsCodec;

    impl ContainerCodec for PairsCodec {
        fn name(&self) -> &str {
            "pairs"
        }

        fn extensions(&self) -> &[&str] {
            &[".pairs"]
        }

        fn list_members(&self, container: &[u8]) -> Result<Vec<MemberInfo>> {
            String::from_utf8_lossy(container)
                .lines()
                .map(|line| {
                    let (name, value) = line
                        .split_once('=')
                        .ok_or_else(|| InternalError::codec("pairs", "missing '='"))?;
                    Ok(MemberInfo {
                        name: name.to_string(),
                        size: value.len() as u64,
                    })
                })
                .collect()
        }

        fn extract_member(&self, container: &[u8], member: &str) -> Result<Vec<u8>> {
            String::from_utf8_lossy(container)
                .lines()
                .find_map(|line| {
                    line.split_once('=')
                        .filter(|(name, _)| *name == member)
                        .map(|(_, value)| value.as_bytes().to_vec())
                })
                .ok_or_else(|| InternalError::codec("pairs", format!("no member {member}")).into())
        }
    }

    fn workspace() -> Workspace {
        Workspace::builder()
            .storage(Arc::new(LocalStorage::new()))
            .config(EngineConfig::test())
            .codec(Arc::new(PairsCodec))
            .build()
            .unwrap()
    }

    #[test]
    fn test_lists_members_from_memory() {
        let workspace = workspace();
        let mut entry = FileEntry::default();
        entry.naming.set_complete_filename("bundle.pairs");
        entry.state.adding = true;
        entry.content = Some(ContentBuffer::from_text("dir/a.txt=alpha\nb.txt=beta", 4).unwrap());

        let outcome = PackageUnpacker
            .process(&mut entry, workspace.env(), &Params::new())
            .unwrap();

        assert_eq!(outcome, Some(true));
        assert!(entry.meta.packed);
        assert_eq!(entry.members.len(), 2);

        let first = &mut entry.members[0];
        assert_eq!(first.complete_filename(), "a.txt");
        assert_eq!(first.meta.member_path.as_deref(), Some("dir/a.txt"));
        assert!(first.meta.internal);
        assert_eq!(first.content.as_mut().unwrap().full_text().unwrap(), "alpha");
    }

    #[test]
    fn test_unknown_extension_is_skippable() {
        let workspace = workspace();
        let mut entry = FileEntry::default();
        entry.naming.set_complete_filename("notes.txt");
        entry.content = Some(ContentBuffer::from_text("x=y", 4).unwrap());

        let error = PackageUnpacker
            .process(&mut entry, workspace.env(), &Params::new())
            .unwrap_err();
        assert!(error.is_skippable());
    }

    #[test]
    fn test_codec_parameter_overrides_extension() {
        let workspace = workspace();
        let mut entry = FileEntry::default();
        entry.naming.set_complete_filename("notes.txt");
        entry.content = Some(ContentBuffer::from_text("x=y", 4).unwrap());

        PackageUnpacker
            .process(&mut entry, workspace.env(), &Params::new().with("codec", "pairs"))
            .unwrap();
        assert_eq!(entry.members.len(), 1);

        let error = PackageUnpacker
            .process(&mut entry, workspace.env(), &Params::new().with("codec", "rar"))
            .unwrap_err();
        assert!(!error.is_skippable());
    }
}
