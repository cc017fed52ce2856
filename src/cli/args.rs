//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::application::Aggregation;

/// Segment tree range queries and lazy range updates over integer sequences
#[derive(Parser, Debug)]
#[command(name = "rangetree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Directory holding a local .rangetree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a script of build/query/update commands
    Run {
        /// Script file, or `-` for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        script: PathBuf,
        /// Aggregation (overrides config)
        #[arg(short, long, value_enum)]
        aggregation: Option<Aggregation>,
        /// Run updates eagerly unless a command says `lazy`
        #[arg(long)]
        eager: bool,
        /// Build the tree from these values before the script runs
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        values: Vec<i64>,
    },

    /// Walk through a sum tree scenario step by step
    Demo,

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
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
