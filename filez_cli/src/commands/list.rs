use super::CommandContext;
use crate::error::ExitCode;
use crate::output::{MemberReport, render};
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Container file to list
    pub archive: PathBuf,
}

pub fn run(ctx: &CommandContext, args: ListArgs) -> Result<ExitCode> {
    let workspace = super::build_workspace(ctx.config.engine.clone())?;
    let mut file = workspace
        .open(&args.archive)
        .with_context(|| format!("Failed to open {}", args.archive.display()))?;

    let members = file
        .unpack()
        .with_context(|| format!("Failed to list {}", args.archive.display()))?;
    if !file.meta().packed {
        anyhow::bail!("Unsupported container: {}", args.archive.display());
    }

    let reports: Vec<MemberReport> = members
        .iter()
        .map(|member| MemberReport {
            path: member
                .meta()
                .member_path
                .clone()
                .unwrap_or_else(|| member.complete_filename()),
            size: member.meta().size,
        })
        .collect();

    if !reports.is_empty() {
        println!("{}", render(&reports, ctx.format, ctx.use_color)?);
    }
    Ok(ExitCode::Success)
}
