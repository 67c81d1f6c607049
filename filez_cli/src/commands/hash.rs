use super::{CommandContext, build_workspace, parse_algorithm};
use crate::error::ExitCode;
use crate::file_discovery::{FileDiscoveryOptions, collect_paths};
use crate::output::{HashReport, render};
use anyhow::{Context, Result};
use clap::Args;
use filez_core::HashAlgorithm;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct HashArgs {
    /// Files or directories to hash
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Hash algorithm (repeatable); defaults to the configured hasher pipeline
    #[arg(short, long = "algorithm", value_parser = parse_algorithm)]
    pub algorithms: Vec<HashAlgorithm>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Include patterns (glob patterns, can be specified multiple times)
    #[arg(short = 'i', long = "include", value_name = "PATTERN")]
    pub include_patterns: Vec<String>,

    /// Exclude patterns (glob patterns, can be specified multiple times, overrides includes)
    #[arg(short = 'e', long = "exclude", value_name = "PATTERN")]
    pub exclude_patterns: Vec<String>,

    /// Scan every sidecar in the directory, not only the usual names
    #[arg(long)]
    pub full_check: bool,

    /// Ignore digests found in sidecar files and compute everything
    #[arg(long)]
    pub no_sidecar: bool,

    /// Write a sidecar for every computed digest
    #[arg(long)]
    pub save: bool,
}

pub fn run(ctx: &CommandContext, args: HashArgs) -> Result<ExitCode> {
    let mut engine = ctx.config.engine.clone();
    if !args.algorithms.is_empty() {
        engine.pipelines.hasher = args.algorithms.iter().map(|algorithm| algorithm.id().to_string()).collect();
    }
    engine.options.allow_search_hashes = !args.no_sidecar;
    engine.options.full_check |= args.full_check;
    engine.options.save_hashes = args.save;

    let algorithms = engine
        .pipelines
        .hasher
        .iter()
        .map(|name| name.parse::<HashAlgorithm>())
        .collect::<filez_core::Result<Vec<_>>>()
        .context("Invalid hasher pipeline")?;
    let workspace = build_workspace(engine)?;

    let options = FileDiscoveryOptions::new()
        .with_include_patterns(args.include_patterns)
        .with_exclude_patterns(args.exclude_patterns)
        .with_recursive(args.recursive);
    let paths = collect_paths(&args.paths, &options)?;
    if paths.is_empty() {
        eprintln!("No matching files found.");
        return Ok(ExitCode::Success);
    }
    log::debug!("Hashing {} file(s) with {:?}", paths.len(), algorithms);

    let mut reports = Vec::with_capacity(paths.len());
    for path in &paths {
        let mut file = workspace
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        file.generate_hashes(args.no_sidecar)
            .with_context(|| format!("Failed to hash {}", path.display()))?;
        if args.save {
            file.save()
                .with_context(|| format!("Failed to save sidecars of {}", path.display()))?;
        }
        reports.push(HashReport::from_file(&file, &algorithms));
    }

    println!("{}", render(&reports, ctx.format, ctx.use_color)?.trim_end());
    Ok(ExitCode::Success)
}
