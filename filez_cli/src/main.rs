use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use filez_cli::commands::{self, CommandContext};
use filez_cli::config::ConfigManager;
use filez_cli::error::{CliError, ExitCode};
use filez_cli::output::OutputFormat;
use filez_cli::terminal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "filez")]
#[command(author, version, about = "filez - Hash, verify and place files without name collisions", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format; defaults to output.default_format from the configuration
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate hash(es) for file(s), reusing sidecar digests when present
    Hash(commands::hash::HashArgs),

    /// Check file(s) against their sidecar digests
    Verify(commands::verify::VerifyArgs),

    /// Copy files into a directory, renaming on collisions
    Place(commands::place::PlaceArgs),

    /// Check whether files hold the same data
    Compare(commands::compare::CompareArgs),

    /// List the members of a container file
    List(commands::list::ListArgs),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Get a configuration value
    Get {
        /// Configuration key (e.g., engine.block_size)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., engine.pipelines.hasher)
        key: String,

        /// Value to set; lists are comma separated
        value: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let debug = cli.debug;

    // Initialize logging based on debug flag
    if debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Debug)
            .filter_module("filez_core", log::LevelFilter::Debug)
            .filter_module("filez_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            let error = CliError::new(e);
            eprintln!("{}", error.format_for_user(debug));
            error.exit_code()
        }
    };
    std::process::exit(code.code());
}

fn run(cli: Cli) -> Result<ExitCode> {
    let manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    let (format, no_color) = (cli.format, cli.no_color);

    match cli.command {
        Commands::Hash(args) => commands::hash::run(&command_context(&manager, format, no_color)?, args),
        Commands::Verify(args) => commands::verify::run(&command_context(&manager, format, no_color)?, args),
        Commands::Place(args) => commands::place::run(&command_context(&manager, format, no_color)?, args),
        Commands::Compare(args) => commands::compare::run(&command_context(&manager, format, no_color)?, args),
        Commands::List(args) => commands::list::run(&command_context(&manager, format, no_color)?, args),
        Commands::Config { command } => config_command(manager, command),
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(ExitCode::Success)
        }
    }
}

/// Load the configuration and settle output options for a file command
fn command_context(manager: &ConfigManager, format: Option<OutputFormat>, no_color: bool) -> Result<CommandContext> {
    let config = manager.load().context("Failed to load configuration")?;
    let format = match format {
        Some(format) => format,
        None => OutputFormat::from_string(&config.output.default_format)?,
    };
    let use_color = !no_color && terminal::use_color(config.output.color_enabled);
    log::debug!("Output format {format:?}, color {use_color}");

    Ok(CommandContext {
        config,
        format,
        use_color,
    })
}

fn config_command(mut manager: ConfigManager, command: ConfigCommand) -> Result<ExitCode> {
    match command {
        ConfigCommand::Show => {
            print!("{}", manager.show()?);
        }
        ConfigCommand::Path => {
            println!("{}", manager.get_config_path().display());
        }
        ConfigCommand::Get { key } => {
            println!("{}", manager.get(&key)?);
        }
        ConfigCommand::Set { key, value } => {
            manager.set(&key, &value)?;
            eprintln!("{}", format!("Set {key} = {value}").green());
            eprintln!(
                "Configuration saved to: {}",
                manager.get_config_path().display()
            );
        }
    }
    Ok(ExitCode::Success)
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
