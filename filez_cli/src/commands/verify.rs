use super::CommandContext;
use crate::error::ExitCode;
use crate::file_discovery::{FileDiscoveryOptions, collect_paths};
use crate::output::{VerifyReport, VerifyStatus, render};
use anyhow::{Context, Result};
use clap::Args;
use filez_core::Error;
use filez_core::error::IntegrityError;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Files or directories to verify
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Check every known digest instead of stopping after the first
    #[arg(long)]
    pub force: bool,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Scan every sidecar in the directory, not only the usual names
    #[arg(long)]
    pub full_check: bool,
}

pub fn run(ctx: &CommandContext, args: VerifyArgs) -> Result<ExitCode> {
    let mut engine = ctx.config.engine.clone();
    engine.options.allow_search_hashes = true;
    engine.options.full_check |= args.full_check;
    let workspace = super::build_workspace(engine)?;

    let options = FileDiscoveryOptions::new().with_recursive(args.recursive);
    let paths = collect_paths(&args.paths, &options)?;

    let mut reports = Vec::with_capacity(paths.len());
    for path in paths {
        let mut file = workspace
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let status = match file.verify(args.force) {
            Ok(algorithms) => VerifyStatus::Ok { algorithms },
            Err(Error::Integrity(IntegrityError::NoHashAvailable { .. })) => VerifyStatus::NoHash,
            Err(e) if e.is_integrity_failure() => VerifyStatus::Failed {
                message: e.to_string(),
            },
            Err(e) => return Err(e).with_context(|| format!("Failed to verify {}", path.display())),
        };
        reports.push(VerifyReport { file: path, status });
    }

    if !reports.is_empty() {
        println!("{}", render(&reports, ctx.format, ctx.use_color)?);
    }

    let failed = reports.iter().filter(|report| !report.passed()).count();
    if failed > 0 {
        eprintln!("{failed} of {} file(s) could not be verified", reports.len());
        return Ok(ExitCode::IntegrityError);
    }
    Ok(ExitCode::Success)
}
