//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};

/// confsync - keep named config directories synchronized through an
/// object-store remote
#[derive(Parser, Debug)]
#[command(name = "confsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create the state directory and seed a default settings file
    Init,

    /// Managed configuration directories (revision-tracked)
    Cfg {
        #[command(subcommand)]
        action: CfgAction,
    },

    /// Library directories (one-shot, unversioned)
    Lib {
        #[command(subcommand)]
        action: LibAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CfgAction {
    /// Synchronize the local copy from the remote
    ///
    /// Examples:
    ///   confsync cfg pull nvim
    Pull {
        /// Name of the configured entry
        name: String,
    },

    /// Publish the local copy to the remote
    Push {
        /// Name of the configured entry
        name: String,
    },

    /// Migrate an existing plain directory into sync management
    Init {
        /// Name of the configured entry
        name: String,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LibAction {
    /// Download a library and materialize its links
    ///
    /// Examples:
    ///   confsync lib pull zulu-jdk-8
    Pull {
        /// Name of the configured entry
        name: String,
    },
}
