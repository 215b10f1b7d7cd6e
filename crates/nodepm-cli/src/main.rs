#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use nodepm_core::config::DEFAULT_COMMAND_TIMEOUT_MS;
use nodepm_core::{Config, PackageManagerName, StaticFeatureFlags};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nodepm")]
#[command(author, version, about = "Detects the package manager a Node project uses", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Timeout for host commands, when `shared_command_timeout` is enabled
    #[arg(long, global = true, value_name = "MS", default_value_t = DEFAULT_COMMAND_TIMEOUT_MS)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Detect the project's package manager and version
    Detect {
        /// Also probe the installed version and report a mismatch
        #[arg(long)]
        installed: bool,
    },

    /// Print the `engines` requirement for a package manager
    Engines {
        /// npm, yarn or pnpm
        name: PackageManagerName,
    },

    /// Probe the installed version of a package manager through corepack
    Installed {
        /// npm, yarn or pnpm
        name: PackageManagerName,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::new(cwd)
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json)
        .with_command_timeout_ms(cli.timeout_ms);

    logging::init(config.verbosity, config.json_logs);

    let flags = StaticFeatureFlags::from_env();
    tracing::debug!(cwd = %config.cwd.display(), ?flags, "starting");

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Detect { installed }) => {
            commands::detect::run(&config, &flags, installed, cli.json)
        }
        Some(Commands::Engines { name }) => commands::engines::run(&config, &flags, name, cli.json),
        Some(Commands::Installed { name }) => {
            commands::installed::run(&config, &flags, name, cli.json)
        }
    }
}
