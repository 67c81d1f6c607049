//! ZIP archives

use crate::content::{ContainerCodec, MemberInfo};
use crate::error::InternalError;
use crate::Result;
use std::io::{Cursor, Read};
use zip::ZipArchive;
use zip::result::ZipError;

fn codec_error(error: ZipError) -> crate::Error {
    InternalError::codec("zip", error.to_string()).into()
}

/// Reads members of `.zip` files
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipCodec;

impl ContainerCodec for ZipCodec {
    fn name(&self) -> &str {
        "zip"
    }

    fn extensions(&self) -> &[&str] {
        &[".zip"]
    }

    fn list_members(&self, container: &[u8]) -> Result<Vec<MemberInfo>> {
        let mut archive = ZipArchive::new(Cursor::new(container)).map_err(codec_error)?;
        let mut members = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive.by_index(index).map_err(codec_error)?;
            if file.is_file() {
                members.push(MemberInfo {
                    name: file.name().to_string(),
                    size: file.size(),
                });
            }
        }
        Ok(members)
    }

    fn extract_member(&self, container: &[u8], member: &str) -> Result<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(container)).map_err(codec_error)?;
        let mut file = archive.by_name(member).map_err(codec_error)?;
        let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
        file.read_to_end(&mut data)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn archive(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.add_directory("docs/", options).unwrap();
        for (name, data) in members {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_lists_regular_files_only() {
        let data = archive(&[("docs/readme.txt", b"hello"), ("empty.bin", b"")]);

        let members = ZipCodec.list_members(&data).unwrap();

        assert_eq!(
            members,
            vec![
                MemberInfo {
                    name: "docs/readme.txt".into(),
                    size: 5
                },
                MemberInfo {
                    name: "empty.bin".into(),
                    size: 0
                },
            ]
        );
    }

    #[test]
    fn test_extract_member() {
        let data = archive(&[("a.txt", b"alpha"), ("b.txt", b"beta")]);

        assert_eq!(ZipCodec.extract_member(&data, "b.txt").unwrap(), b"beta");
        assert!(ZipCodec.extract_member(&data, "c.txt").is_err());
        assert!(ZipCodec.list_members(b"not a zip").is_err());
    }
}
