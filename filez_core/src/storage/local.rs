//! Local disk backend on top of `std::fs`

use super::{Lines, SaveMode, Storage, filename_matcher};
use crate::content::ContentStream;
use crate::error::IoError;
use crate::Result;
use log::debug;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Storage backed by the local filesystem
#[derive(Debug, Clone, Default)]
pub struct LocalStorage {
    temp_directory: Option<PathBuf>,
}

impl LocalStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `directory` instead of the OS temp directory for cache files
    pub fn with_temp_directory(directory: impl Into<PathBuf>) -> Self {
        Self {
            temp_directory: Some(directory.into()),
        }
    }
}

impl Storage for LocalStorage {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn open(&self, path: &Path) -> Result<Box<dyn ContentStream>> {
        let file = fs::File::open(path).map_err(|e| IoError::at(path, e))?;
        Ok(Box::new(file))
    }

    fn save(&self, path: &Path, data: &[u8], mode: SaveMode) -> Result<()> {
        create_parent(path)?;

        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            SaveMode::Truncate => options.write(true).truncate(true),
            SaveMode::Append => options.append(true),
        };

        let mut file = options.open(path).map_err(|e| IoError::at(path, e))?;
        file.write_all(data).map_err(|e| IoError::at(path, e))?;
        Ok(())
    }

    fn create_writer(&self, path: &Path) -> Result<Box<dyn Write + Send>> {
        create_parent(path)?;
        let file = fs::File::create(path).map_err(|e| IoError::at(path, e))?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn delete(&self, path: &Path) -> Result<()> {
        debug!("Deleting {}", path.display());
        fs::remove_file(path).map_err(|e| IoError::at(path, e).into())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        fs::copy(from, to).map_err(|e| IoError::at(from, e))?;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).map_err(|e| IoError::at(from, e).into())
    }

    fn list_files(&self, directory: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
        let matcher = filename_matcher(pattern)?;
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(IoError::at(directory, e).into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| IoError::at(directory, e))?;
            let path = entry.path();
            if path.is_file() && matcher.is_match(entry.file_name()) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_lines(&self, path: &Path) -> Result<Lines> {
        let file = fs::File::open(path).map_err(|e| IoError::at(path, e))?;
        let owned = path.to_path_buf();
        Ok(Box::new(
            BufReader::new(file)
                .lines()
                .map(move |line| line.map_err(|e| IoError::at(&owned, e).into())),
        ))
    }

    fn size(&self, path: &Path) -> Result<u64> {
        let metadata = fs::metadata(path).map_err(|e| IoError::at(path, e))?;
        Ok(metadata.len())
    }

    fn temp_directory(&self) -> PathBuf {
        self.temp_directory
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| IoError::at(parent, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_save_append_and_open() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();
        let path = temp_dir.path().join("nested/out.txt");

        storage.save(&path, b"ab", SaveMode::Truncate).unwrap();
        storage.save(&path, b"cd", SaveMode::Append).unwrap();

        let mut content = String::new();
        storage.open(&path).unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "abcd");
        assert_eq!(storage.size(&path).unwrap(), 4);
    }

    #[test]
    fn test_writer_truncates_and_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();
        let path = temp_dir.path().join("cache/blocks.cache");
        storage.save(&path, b"stale", SaveMode::Truncate).unwrap();

        let mut writer = storage.create_writer(&path).unwrap();
        writer.write_all(b"ab").unwrap();
        writer.write_all(b"cd").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"abcd");
    }

    #[test]
    fn test_list_files_filters_by_glob() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();
        for name in ["a.md5", "b.md5", "c.txt"] {
            fs::write(temp_dir.path().join(name), b"x").unwrap();
        }

        let files = storage.list_files(temp_dir.path(), "*.md5").unwrap();
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| storage.filename_of(p))
            .collect();
        assert_eq!(names, vec!["a.md5", "b.md5"]);
    }

    #[test]
    fn test_list_files_missing_directory_is_empty() {
        let storage = LocalStorage::new();
        let files = storage
            .list_files(Path::new("/definitely/not/here"), "*")
            .unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_read_lines() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();
        let path = temp_dir.path().join("CHECKSUM.md5");
        fs::write(&path, "; comment\nabc  a.txt\n").unwrap();

        let lines: Vec<String> = storage
            .read_lines(&path)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(lines, vec!["; comment", "abc  a.txt"]);
    }

    #[test]
    fn test_backup_copies_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();
        let path = temp_dir.path().join("data.bin");
        fs::write(&path, b"old").unwrap();

        let backup = storage.backup(&path).unwrap();
        assert_eq!(backup, temp_dir.path().join("data.bin.bak"));
        assert_eq!(fs::read(backup).unwrap(), b"old");
    }
}
