//! confsync CLI
//!
//! Keeps named config directories synchronized with a single remote copy in
//! an object store, across machines, via a revision-tracked manifest.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{CfgAction, Cli, Commands, LibAction};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("{} confsync", "confsync".green().bold());
            println!();
            println!("Run {} for available commands.", "confsync --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init => commands::run_init(),
        Commands::Cfg { action } => match action {
            CfgAction::Pull { name } => commands::run_cfg_pull(&name),
            CfgAction::Push { name } => commands::run_cfg_push(&name),
            CfgAction::Init { name } => commands::run_cfg_init(&name),
        },
        Commands::Lib { action } => match action {
            LibAction::Pull { name } => commands::run_lib_pull(&name),
        },
    }
}
