use super::CommandContext;
use crate::error::ExitCode;
use crate::output::{Report, TextFormatter, render};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::*;
use filez_core::content::LazyStream;
use filez_core::ContentSource;
use serde::Serialize;
use std::path::PathBuf;

/// Naming strategy used when the destination name is taken
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `name (1).ext`
    Windows,
    /// `name - 1.ext`
    Linux,
    /// random UUID name
    Unique,
}

impl Strategy {
    fn processor(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Unique => "unique",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PlaceArgs {
    /// Destination directory
    pub destination: PathBuf,

    /// Files to copy into the destination
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Renaming strategy for taken names; defaults to the configured rename pipeline
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Replace existing files instead of renaming
    #[arg(long)]
    pub overwrite: bool,

    /// Do not write sidecar files next to the placed files
    #[arg(long)]
    pub no_hashes: bool,
}

#[derive(Debug, Serialize)]
struct Placed {
    source: PathBuf,
    target: PathBuf,
}

impl Report for Placed {
    fn to_text(&self, formatter: &TextFormatter) -> String {
        format!(
            "{} -> {}",
            self.source.display(),
            formatter.colorize(&self.target.display().to_string(), |s| s.green())
        )
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

pub fn run(ctx: &CommandContext, args: PlaceArgs) -> Result<ExitCode> {
    let mut engine = ctx.config.engine.clone();
    if let Some(strategy) = args.strategy {
        engine.pipelines.rename = vec![strategy.processor().to_string()];
    }
    engine.options.allow_overwrite |= args.overwrite;
    if args.no_hashes {
        engine.options.save_hashes = false;
    }
    let workspace = super::build_workspace(engine)?;

    let mut placed = Vec::with_capacity(args.files.len());
    for source in args.files {
        let name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|_| source.is_file())
            .ok_or_else(|| anyhow::anyhow!("Not a file: {}", source.display()))?;

        let content = ContentSource::Stream {
            stream: Box::new(LazyStream::new(workspace.storage().clone(), &source)),
            binary: true,
        };
        let mut file = workspace
            .create(&args.destination, &name, content)
            .with_context(|| format!("Failed to read {}", source.display()))?;
        let target = file
            .save()
            .with_context(|| format!("Failed to place {}", source.display()))?;
        placed.push(Placed { source, target });
    }

    println!("{}", render(&placed, ctx.format, ctx.use_color)?);
    Ok(ExitCode::Success)
}
