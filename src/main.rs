// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Autoforge CLI - meta-build orchestration for autotools packages

use anyhow::Result;
use autoforge::commands::{self, Options, Session};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "autoforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Workspace root directory
    #[arg(short, long, env = "AUTOFORGE_WORKSPACE", default_value = ".", global = true)]
    workspace_dir: PathBuf,

    /// Package search path (colon-separated)
    #[arg(long, value_delimiter = ':', global = true)]
    pkgpath: Vec<PathBuf>,

    /// Name of the generated Makefile
    #[arg(long, global = true)]
    makefile: Option<String>,

    /// Target run by a bare 'make'
    #[arg(long, global = true)]
    default_target: Option<String>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select packages, generate their build trees and the workspace Makefile
    Select {
        /// Package ranges: NAME, NAME:, :NAME, FROM:TO; '-' and '+' switch
        /// between deselecting and selecting
        ranges: Vec<String>,
    },

    /// Print the packages a selection resolves to
    Query {
        /// Package ranges, as for 'select'
        ranges: Vec<String>,
    },

    /// Configure one selected package in its build directory
    Configure {
        /// Package name
        package: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence
    let log_level = match cli.verbose {
        0 if cli.quiet => LevelFilter::ERROR,
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let options = Options {
        workspace_dir: cli.workspace_dir,
        pkgpath: cli.pkgpath,
        makefile: cli.makefile,
        default_target: cli.default_target,
        no_color: cli.no_color,
    };

    // Execute command
    match cli.command {
        Commands::Select { ranges } => commands::select::run(&Session::open(&options)?, &ranges),
        Commands::Query { ranges } => commands::query::run(&Session::open(&options)?, &ranges),
        Commands::Configure { package } => {
            commands::configure::run(&Session::open(&options)?, &package)
        }
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    }
}
