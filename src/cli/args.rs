//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Hierarchical node store for tree-backed data grids
#[derive(Parser, Debug)]
#[command(name = "treegrid")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Print author and version information
    #[arg(long)]
    pub info: bool,

    /// Nodes file (JSON array); defaults to `seed_file` from config
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Directory holding a local .treegrid.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the hierarchy as a tree
    Tree,

    /// Show the flattened grid rows with paths
    Grid,

    /// Show one node
    Get {
        /// Node id
        id: String,
    },

    /// List children of a node
    Children {
        /// Node id
        id: String,
        /// Include all descendants, not only direct children
        #[arg(short, long)]
        all: bool,
    },

    /// List a node and its ancestors, child to root
    Ancestors {
        /// Node id
        id: String,
    },

    /// Apply a batch of add/update/remove operations and show the result
    Apply {
        /// Operations file (JSON array)
        #[arg(value_hint = ValueHint::FilePath)]
        operations: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
