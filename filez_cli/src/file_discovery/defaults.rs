//! Files skipped unless asked for

use filez_core::HashAlgorithm;

/// Extensions of files the engine writes next to the files it manages
pub fn generated_extensions() -> Vec<&'static str> {
    let mut extensions: Vec<&'static str> = HashAlgorithm::ALL.iter().map(|algorithm| algorithm.id()).collect();
    extensions.extend(["bak", "cache"]);
    extensions
}

/// Convert extensions to glob patterns, in both cases
pub fn extensions_to_patterns(extensions: &[&str]) -> Vec<String> {
    extensions
        .iter()
        .flat_map(|ext| [format!("*.{ext}"), format!("*.{}", ext.to_uppercase())])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_extensions_cover_sidecars() {
        let extensions = generated_extensions();
        for algorithm in HashAlgorithm::ALL {
            assert!(extensions.contains(&algorithm.id()));
        }
        assert!(extensions.contains(&"bak"));
    }

    #[test]
    fn test_extensions_to_patterns() {
        let patterns = extensions_to_patterns(&["md5", "bak"]);
        assert_eq!(patterns, vec!["*.md5", "*.MD5", "*.bak", "*.BAK"]);
    }
}
