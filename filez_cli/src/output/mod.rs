//! Rendering command results as text or JSON

mod formatters;
mod reports;

pub use formatters::{JsonFormatter, TextFormatter, format_bytes};
pub use reports::{DigestEntry, DigestSource, HashReport, MemberReport, VerifyReport, VerifyStatus};

use anyhow::Result;

/// Output format enumeration
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parse output format from string
    pub fn from_string(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Unknown output format: {}", s),
        }
    }
}

/// A command result that can be shown either way
pub trait Report {
    /// Lines for humans
    fn to_text(&self, formatter: &TextFormatter) -> String;

    /// Machine-readable form
    fn to_json(&self) -> Result<serde_json::Value>;
}

/// Trait for output formatters
pub trait OutputFormatter {
    fn format_batch(&self, reports: &[&dyn Report]) -> Result<String>;
}

/// Create a formatter based on output format
pub fn create_formatter(format: OutputFormat, use_color: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(use_color)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}

/// Render `reports` with a fresh formatter
pub fn render<R: Report>(reports: &[R], format: OutputFormat, use_color: bool) -> Result<String> {
    let reports: Vec<&dyn Report> = reports.iter().map(|report| report as &dyn Report).collect();
    create_formatter(format, use_color).format_batch(&reports)
}
