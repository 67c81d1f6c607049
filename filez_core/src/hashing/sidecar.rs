//! Sidecar checksum files
//!
//! A sidecar is a plain text file next to the files it describes, one
//! `<digest><whitespace><filename>` entry per line. Lines starting with `;`
//! are comments. Both dedicated sidecars (`photo.jpg.md5`) and multi-file
//! ones (`CHECKSUM.md5`) use the same format; `md5sum -b` output with its
//! `*` marker in front of the filename is accepted too.

use super::HashAlgorithm;
use crate::naming::split_extension;
use crate::storage::Storage;
use crate::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Stem of multi-file sidecars
pub const CHECKSUM_STEM: &str = "CHECKSUM";

/// A digest found in a sidecar file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarHit {
    pub digest: String,
    /// Sidecar the digest was read from
    pub source: PathBuf,
    /// Whether the sidecar is a multi-file `CHECKSUM.*` file
    pub from_checksum: bool,
}

/// Whether `filename` names a multi-file checksum sidecar
pub fn is_checksum_file(filename: &str) -> bool {
    filename.contains(&format!("{CHECKSUM_STEM}."))
}

/// Name of the dedicated sidecar for `complete_filename`
pub fn dedicated_name(complete_filename: &str, algorithm: HashAlgorithm) -> String {
    format!("{complete_filename}{}", algorithm.extension())
}

/// Render one sidecar entry
pub fn entry(digest: &str, complete_filename: &str) -> String {
    format!("{digest} {complete_filename}")
}

/// Sidecar names to try for `complete_filename`, most specific first:
/// `<name><ext>.<algo>`, `<name>.<algo>`, `CHECKSUM.<algo>`, `<directory>.<algo>`.
pub fn candidate_names(directory: &Path, complete_filename: &str, algorithm: HashAlgorithm) -> Vec<String> {
    let extension = algorithm.extension();
    let (stem, _) = split_extension(complete_filename);

    let mut names = vec![
        dedicated_name(complete_filename, algorithm),
        format!("{stem}{extension}"),
        format!("{CHECKSUM_STEM}{extension}"),
    ];
    if let Some(dirname) = directory.file_name() {
        names.push(format!("{}{extension}", dirname.to_string_lossy()));
    }

    let mut unique = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

/// Digest for `complete_filename` in one sidecar line, if the line has one
pub fn parse_line(line: &str, complete_filename: &str, algorithm: HashAlgorithm) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(';') {
        return None;
    }

    let (digest, rest) = line.split_once(char::is_whitespace)?;
    let rest = rest.trim();
    let name = rest.strip_prefix('*').unwrap_or(rest);

    let matches = name == complete_filename
        || rest.split_whitespace().any(|token| token == complete_filename);
    if matches && algorithm.is_digest(digest) {
        Some(digest.to_ascii_lowercase())
    } else {
        None
    }
}

/// Scan one sidecar file for `complete_filename`
pub fn scan(
    storage: &dyn Storage,
    sidecar: &Path,
    complete_filename: &str,
    algorithm: HashAlgorithm,
) -> Result<Option<String>> {
    for line in storage.read_lines(sidecar)? {
        if let Some(digest) = parse_line(&line?, complete_filename, algorithm) {
            return Ok(Some(digest));
        }
    }
    Ok(None)
}

/// Search `directory` for a sidecar entry of `complete_filename`.
///
/// Candidates are tried in priority order; with `full_scan` every other
/// `*.<algo>` file in the directory is tried afterwards, sorted by name.
pub fn search(
    storage: &dyn Storage,
    directory: &Path,
    complete_filename: &str,
    algorithm: HashAlgorithm,
    full_scan: bool,
) -> Result<Option<SidecarHit>> {
    let mut candidates: Vec<PathBuf> = candidate_names(directory, complete_filename, algorithm)
        .into_iter()
        .map(|name| storage.join(directory, &name))
        .collect();

    if full_scan {
        for path in storage.list_files(directory, &format!("*{}", algorithm.extension()))? {
            if !candidates.contains(&path) {
                candidates.push(path);
            }
        }
    }

    for path in candidates {
        if !storage.is_file(&path) {
            continue;
        }
        if let Some(digest) = scan(storage, &path, complete_filename, algorithm)? {
            let from_checksum = storage
                .filename_of(&path)
                .is_some_and(|name| is_checksum_file(&name));
            debug!("Found {algorithm} of '{complete_filename}' in {}", path.display());
            return Ok(Some(SidecarHit {
                digest,
                source: path,
                from_checksum,
            }));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LocalStorage, SaveMode};
    use tempfile::TempDir;

    const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";
    const OTHER_MD5: &str = "900150983cd24fb0d6963f7d28e17f72";

    fn write(dir: &Path, name: &str, content: &str) {
        LocalStorage::new()
            .save(&dir.join(name), content.as_bytes(), SaveMode::Truncate)
            .unwrap();
    }

    #[test]
    fn test_candidate_order() {
        let names = candidate_names(Path::new("/media/holiday"), "photo.jpg", HashAlgorithm::Md5);
        assert_eq!(
            names,
            vec!["photo.jpg.md5", "photo.md5", "CHECKSUM.md5", "holiday.md5"]
        );
    }

    #[test]
    fn test_candidate_dedup() {
        let names = candidate_names(Path::new("/x/CHECKSUM"), "CHECKSUM", HashAlgorithm::Md5);
        assert_eq!(names, vec!["CHECKSUM.md5"]);
    }

    #[test]
    fn test_parse_line_forms() {
        let md5 = HashAlgorithm::Md5;
        assert_eq!(parse_line(&format!("{EMPTY_MD5}  empty.txt"), "empty.txt", md5), Some(EMPTY_MD5.into()));
        assert_eq!(parse_line(&format!("{EMPTY_MD5} *empty.txt"), "empty.txt", md5), Some(EMPTY_MD5.into()));
        assert_eq!(
            parse_line(&format!("{EMPTY_MD5} my file.txt"), "my file.txt", md5),
            Some(EMPTY_MD5.into())
        );
        assert_eq!(parse_line(&format!("; {EMPTY_MD5} empty.txt"), "empty.txt", md5), None);
        assert_eq!(parse_line(&format!("{EMPTY_MD5} other.txt"), "empty.txt", md5), None);
        assert_eq!(parse_line("nothex empty.txt", "empty.txt", md5), None);
        assert_eq!(parse_line("", "empty.txt", md5), None);
    }

    #[test]
    fn test_checksum_file_lookup() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path(),
            "CHECKSUM.md5",
            &format!("; generated\n{EMPTY_MD5}  empty.txt\n"),
        );

        let hit = search(&LocalStorage::new(), temp_dir.path(), "empty.txt", HashAlgorithm::Md5, false)
            .unwrap()
            .unwrap();

        assert_eq!(hit.digest, EMPTY_MD5);
        assert!(hit.from_checksum);
    }

    #[test]
    fn test_dedicated_sidecar_wins() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "CHECKSUM.md5", &format!("{OTHER_MD5}  empty.txt\n"));
        write(temp_dir.path(), "empty.txt.md5", &format!("{EMPTY_MD5}  empty.txt\n"));

        let hit = search(&LocalStorage::new(), temp_dir.path(), "empty.txt", HashAlgorithm::Md5, true)
            .unwrap()
            .unwrap();

        assert_eq!(hit.digest, EMPTY_MD5);
        assert!(!hit.from_checksum);
    }

    #[test]
    fn test_full_scan_finds_other_sidecars() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "batch.md5", &format!("{EMPTY_MD5}  empty.txt\n"));
        let storage = LocalStorage::new();

        assert!(
            search(&storage, temp_dir.path(), "empty.txt", HashAlgorithm::Md5, false)
                .unwrap()
                .is_none()
        );
        let hit = search(&storage, temp_dir.path(), "empty.txt", HashAlgorithm::Md5, true)
            .unwrap()
            .unwrap();
        assert!(hit.source.ends_with("batch.md5"));
    }

    #[test]
    fn test_is_checksum_file() {
        assert!(is_checksum_file("CHECKSUM.sha256"));
        assert!(!is_checksum_file("photo.jpg.sha256"));
    }
}
