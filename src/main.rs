// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Issue registrar CLI - files a planned set of issues and cross-links them

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use issue_registrar::commands;
use issue_registrar::config::{self, Overrides};
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "issue-registrar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Issue manifest (TOML); the built-in plan is used when omitted
    #[arg(short, long, env = "REGISTRAR_MANIFEST", global = true)]
    manifest: Option<PathBuf>,

    /// Target repository (OWNER/NAME), overriding the manifest
    #[arg(long, env = "REGISTRAR_REPO", global = true)]
    repo: Option<String>,

    /// Directory holding the issue source files
    #[arg(long, env = "REGISTRAR_BASE_DIR", global = true)]
    base_dir: Option<PathBuf>,

    /// GitHub CLI executable
    #[arg(long, env = "REGISTRAR_GH", global = true)]
    gh: Option<PathBuf>,

    /// Disable colored output
    #[arg(
        long,
        env = "NO_COLOR",
        global = true,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create every planned issue, then patch in dependency numbers (default)
    Run {
        /// Print the bodies that would be submitted without calling gh
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the plan and its source files
    Check,

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => tracing::Level::ERROR,
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let overrides = Overrides {
        manifest: cli.manifest,
        repo: cli.repo,
        base_dir: cli.base_dir,
        tracker_program: cli.gh,
    };
    let color = !cli.no_color && std::io::stdout().is_terminal();

    // Execute command
    match cli.command.unwrap_or(Commands::Run { dry_run: false }) {
        Commands::Run { dry_run } => {
            let config = config::load(&overrides)?;
            commands::run::run(
                &config,
                &commands::run::RunArgs {
                    dry_run,
                    json: cli.json,
                    color,
                },
            )
        }
        Commands::Check => {
            let config = config::load(&overrides)?;
            commands::check::run(&config)
        }
        Commands::Completions { shell } => {
            commands::completions::run(shell, &mut Cli::command())
        }
    }
}
