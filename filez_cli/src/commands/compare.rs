use super::CommandContext;
use crate::error::ExitCode;
use crate::output::{OutputFormat, TextFormatter};
use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    /// Reference file
    pub first: PathBuf,

    /// Files compared against the reference
    #[arg(required = true)]
    pub others: Vec<PathBuf>,
}

/// Exit code 0 when all files hold the same data, 1 when they differ
pub fn run(ctx: &CommandContext, args: CompareArgs) -> Result<ExitCode> {
    let workspace = super::build_workspace(ctx.config.engine.clone())?;

    let open = |path: &PathBuf| {
        workspace
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))
    };
    let mut first = open(&args.first)?;
    let mut others = args.others.iter().map(open).collect::<Result<Vec<_>>>()?;

    let identical = first
        .compare_to(&mut others)
        .context("Failed to compare files")?;

    match ctx.format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "identical": identical }));
        }
        OutputFormat::Text => {
            let formatter = TextFormatter::new(ctx.use_color);
            let verdict = if identical {
                formatter.colorize("identical", |s| s.green())
            } else {
                formatter.colorize("different", |s| s.red())
            };
            println!("{verdict}");
        }
    }

    Ok(if identical {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    })
}
