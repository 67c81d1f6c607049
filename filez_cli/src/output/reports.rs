//! Serializable results of the file commands

use super::{Report, TextFormatter, format_bytes};
use anyhow::Result;
use colored::*;
use filez_core::{File, HashAlgorithm};
use serde::Serialize;
use std::path::PathBuf;

/// Where a digest came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestSource {
    Computed,
    Sidecar,
}

#[derive(Debug, Clone, Serialize)]
pub struct DigestEntry {
    pub algorithm: HashAlgorithm,
    pub digest: String,
    pub source: DigestSource,
}

/// Digests of one file
#[derive(Debug, Clone, Serialize)]
pub struct HashReport {
    pub file: PathBuf,
    pub size: Option<u64>,
    pub hashes: Vec<DigestEntry>,
}

impl HashReport {
    /// Digests of `algorithms` held by `file`, in that order
    pub fn from_file(file: &File, algorithms: &[HashAlgorithm]) -> Self {
        let hashes = algorithms
            .iter()
            .filter_map(|algorithm| file.hashes().get(*algorithm))
            .map(|record| DigestEntry {
                algorithm: record.algorithm,
                digest: record.digest.clone(),
                source: if record.loaded {
                    DigestSource::Sidecar
                } else {
                    DigestSource::Computed
                },
            })
            .collect();

        Self {
            file: file.path().map(PathBuf::from).unwrap_or_default(),
            size: file.meta().size,
            hashes,
        }
    }
}

impl Report for HashReport {
    fn to_text(&self, formatter: &TextFormatter) -> String {
        let mut output = formatter.colorize(&self.file.display().to_string(), |s| s.bold());
        if let Some(size) = self.size {
            output.push_str(&format!(" ({})", format_bytes(size)));
        }
        output.push('\n');

        for entry in &self.hashes {
            let algorithm = formatter.colorize(&format!("{:<6}", entry.algorithm.id()), |s| s.yellow());
            let digest = formatter.colorize(&entry.digest, |s| s.cyan());
            output.push_str(&format!("  {algorithm} {digest}"));
            if entry.source == DigestSource::Sidecar {
                output.push_str(" (sidecar)");
            }
            output.push('\n');
        }
        output
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Outcome of checking one file
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyStatus {
    Ok { algorithms: Vec<HashAlgorithm> },
    Failed { message: String },
    NoHash,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub file: PathBuf,
    #[serde(flatten)]
    pub status: VerifyStatus,
}

impl VerifyReport {
    pub fn passed(&self) -> bool {
        matches!(self.status, VerifyStatus::Ok { .. })
    }
}

impl Report for VerifyReport {
    fn to_text(&self, formatter: &TextFormatter) -> String {
        let status = match &self.status {
            VerifyStatus::Ok { algorithms } => {
                let names: Vec<&str> = algorithms.iter().map(|algorithm| algorithm.id()).collect();
                format!("{} ({})", formatter.colorize("OK", |s| s.green()), names.join(", "))
            }
            VerifyStatus::Failed { message } => {
                format!("{} {message}", formatter.colorize("FAILED", |s| s.red()))
            }
            VerifyStatus::NoHash => formatter.colorize("NO HASH", |s| s.yellow()),
        };
        format!("{}: {status}", self.file.display())
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// One member of a container file
#[derive(Debug, Clone, Serialize)]
pub struct MemberReport {
    pub path: String,
    pub size: Option<u64>,
}

impl Report for MemberReport {
    fn to_text(&self, _formatter: &TextFormatter) -> String {
        match self.size {
            Some(size) => format!("{:>12}  {}", format_bytes(size), self.path),
            None => format!("{:>12}  {}", "-", self.path),
        }
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
