use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::gather::ReflectMode;

/// Gather session, history and permission data for reflection
#[derive(Debug, Parser)]
#[command(name = "reflect", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print full structured JSON instead of a summary
    #[arg(long, global = true)]
    pub json: bool,

    /// Use this config file instead of the layered defaults
    #[arg(short, long, global = true, env = "REFLECT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory to gather from (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Recent git activity, issue tracker status and edited files
    Session {
        /// Number of commits to include
        #[arg(long)]
        commits: Option<usize>,
    },
    /// Parse prior reflection summaries and rank recurring themes
    History {
        /// Directory of reflection markdown files
        reflections_dir: Option<PathBuf>,
    },
    /// Current permission allow/deny lists
    Permissions {
        /// Project settings file
        settings_path: Option<PathBuf>,

        /// Skip the home-level settings file
        #[arg(long)]
        no_home: bool,
    },
    /// Run the gatherers for one reflection mode
    Gather {
        #[arg(value_enum, default_value_t = ReflectMode::Plain)]
        mode: ReflectMode,

        /// Number of commits to include
        #[arg(long)]
        commits: Option<usize>,
    },
    /// Validate the marketplace, plugin manifests and skills
    Check {
        /// Package root containing .claude-plugin/
        root: Option<PathBuf>,
    },
    /// Write a new dated reflection summary from the template
    Note {
        /// Short topic, used in the file name
        topic: String,

        /// One-line session summary
        #[arg(long)]
        summary: Option<String>,

        /// Output directory (defaults to the reflections directory)
        #[arg(long = "out")]
        out_dir: Option<PathBuf>,
    },
}
