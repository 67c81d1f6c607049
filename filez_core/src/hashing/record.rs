//! Per-file hash records

use super::sidecar::{self, SidecarHit};
use super::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The sidecar file a digest belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashFile {
    /// Sidecar filename, e.g. `photo.jpg.md5`
    pub name: String,
    /// Sidecar content, `<digest> <filename>`
    pub content: String,
    /// Where the sidecar was read from, if it exists on disk
    pub source: Option<PathBuf>,
    /// Whether this is a multi-file `CHECKSUM.*` sidecar
    pub from_checksum: bool,
    /// Whether the content still has to be written
    pub pending_save: bool,
}

impl HashFile {
    /// Sidecar that still has to be written next to the file
    pub fn pending(digest: &str, complete_filename: &str, algorithm: HashAlgorithm) -> Self {
        Self {
            name: sidecar::dedicated_name(complete_filename, algorithm),
            content: sidecar::entry(digest, complete_filename),
            source: None,
            from_checksum: false,
            pending_save: true,
        }
    }

    /// Sidecar found on disk
    pub fn found(hit: &SidecarHit, complete_filename: &str, algorithm: HashAlgorithm) -> Self {
        let name = hit
            .source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| sidecar::dedicated_name(complete_filename, algorithm));
        Self {
            name,
            content: sidecar::entry(&hit.digest, complete_filename),
            source: Some(hit.source.clone()),
            from_checksum: hit.from_checksum,
            pending_save: false,
        }
    }
}

/// Digest of one file under one algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashRecord {
    pub algorithm: HashAlgorithm,
    pub digest: String,
    pub hash_file: HashFile,
    /// Read from a sidecar rather than computed from content
    pub loaded: bool,
}

impl HashRecord {
    pub fn computed(algorithm: HashAlgorithm, digest: String, complete_filename: &str) -> Self {
        Self {
            algorithm,
            hash_file: HashFile::pending(&digest, complete_filename, algorithm),
            digest,
            loaded: false,
        }
    }

    pub fn loaded(algorithm: HashAlgorithm, hit: &SidecarHit, complete_filename: &str) -> Self {
        Self {
            algorithm,
            digest: hit.digest.clone(),
            hash_file: HashFile::found(hit, complete_filename, algorithm),
            loaded: true,
        }
    }
}

/// All hash records of one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHashes {
    records: BTreeMap<HashAlgorithm, HashRecord>,
    /// Algorithms whose digest came from a sidecar, in load order
    loaded: Vec<HashAlgorithm>,
}

impl FileHashes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: HashRecord) {
        let algorithm = record.algorithm;
        self.loaded.retain(|loaded| *loaded != algorithm);
        if record.loaded {
            self.loaded.push(algorithm);
        }
        self.records.insert(algorithm, record);
    }

    pub fn get(&self, algorithm: HashAlgorithm) -> Option<&HashRecord> {
        self.records.get(&algorithm)
    }

    pub fn digest(&self, algorithm: HashAlgorithm) -> Option<&str> {
        self.records.get(&algorithm).map(|record| record.digest.as_str())
    }

    pub fn contains(&self, algorithm: HashAlgorithm) -> bool {
        self.records.contains_key(&algorithm)
    }

    pub fn algorithms(&self) -> Vec<HashAlgorithm> {
        self.records.keys().copied().collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &HashRecord> {
        self.records.values()
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut HashRecord> {
        self.records.values_mut()
    }

    /// Algorithms loaded from sidecars, in load order
    pub fn loaded(&self) -> &[HashAlgorithm] {
        &self.loaded
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Algorithms `verify` checks: loaded ones if any, otherwise every record
    pub fn verification_order(&self) -> Vec<HashAlgorithm> {
        if self.loaded.is_empty() {
            self.algorithms()
        } else {
            self.loaded.clone()
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.loaded.clear();
    }

    /// Point every dedicated sidecar at `new_filename`.
    ///
    /// `CHECKSUM.*` sidecars describe many files and are left alone. Nothing
    /// is written; renamed sidecars are marked pending.
    pub fn rename(&mut self, new_filename: &str) {
        for record in self.records.values_mut() {
            let hash_file = &mut record.hash_file;
            if hash_file.from_checksum {
                continue;
            }
            hash_file.name = sidecar::dedicated_name(new_filename, record.algorithm);
            hash_file.content = sidecar::entry(&record.digest, new_filename);
            hash_file.pending_save = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(digest: &str, source: &str, from_checksum: bool) -> SidecarHit {
        SidecarHit {
            digest: digest.to_string(),
            source: PathBuf::from(source),
            from_checksum,
        }
    }

    #[test]
    fn test_computed_record_is_pending() {
        let record = HashRecord::computed(HashAlgorithm::Md5, "aa".into(), "photo.jpg");
        assert!(!record.loaded);
        assert!(record.hash_file.pending_save);
        assert_eq!(record.hash_file.name, "photo.jpg.md5");
        assert_eq!(record.hash_file.content, "aa photo.jpg");
    }

    #[test]
    fn test_loaded_order_and_verification() {
        let mut hashes = FileHashes::new();
        hashes.insert(HashRecord::computed(HashAlgorithm::Md5, "aa".into(), "x"));
        assert_eq!(hashes.verification_order(), vec![HashAlgorithm::Md5]);

        hashes.insert(HashRecord::loaded(HashAlgorithm::Sha1, &hit("bb", "/d/x.sha1", false), "x"));
        hashes.insert(HashRecord::loaded(HashAlgorithm::Crc32, &hit("cc", "/d/CHECKSUM.crc32", true), "x"));

        assert_eq!(hashes.loaded(), &[HashAlgorithm::Sha1, HashAlgorithm::Crc32]);
        assert_eq!(hashes.verification_order(), vec![HashAlgorithm::Sha1, HashAlgorithm::Crc32]);
        assert_eq!(hashes.len(), 3);
    }

    #[test]
    fn test_rename_skips_checksum_files() {
        let mut hashes = FileHashes::new();
        hashes.insert(HashRecord::loaded(HashAlgorithm::Md5, &hit("aa", "/d/photo.jpg.md5", false), "photo.jpg"));
        hashes.insert(HashRecord::loaded(HashAlgorithm::Sha1, &hit("bb", "/d/CHECKSUM.sha1", true), "photo.jpg"));

        hashes.rename("photo (1).jpg");

        let md5 = hashes.get(HashAlgorithm::Md5).unwrap();
        assert_eq!(md5.hash_file.name, "photo (1).jpg.md5");
        assert_eq!(md5.hash_file.content, "aa photo (1).jpg");
        assert!(md5.hash_file.pending_save);

        let sha1 = hashes.get(HashAlgorithm::Sha1).unwrap();
        assert_eq!(sha1.hash_file.name, "CHECKSUM.sha1");
        assert!(!sha1.hash_file.pending_save);
    }

    #[test]
    fn test_rename_keeps_digest_intact() {
        // every character of the old name also appears in the digest
        let mut hashes = FileHashes::new();
        hashes.insert(HashRecord::computed(
            HashAlgorithm::Md5,
            "900150983cd24fb0d6963f7d28e17f72".into(),
            "c",
        ));

        hashes.rename("x");
        hashes.rename("c (1)");

        let md5 = hashes.get(HashAlgorithm::Md5).unwrap();
        assert_eq!(md5.hash_file.name, "c (1).md5");
        assert_eq!(md5.hash_file.content, "900150983cd24fb0d6963f7d28e17f72 c (1)");
        assert_eq!(sidecar::parse_line(&md5.hash_file.content, "c (1)", HashAlgorithm::Md5).as_deref(), Some(md5.digest.as_str()));
    }
}
