//! Command-line argument definitions.

use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// mdd - a markdown document graph kept in plain files.
#[derive(Debug, Parser)]
#[command(name = "mdd", version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Log level: trace, debug, info, warn or error
    #[arg(
        long,
        global = true,
        env = "MDD_LOG",
        default_value = mdd_core::default_log_level(),
        value_parser = PossibleValuesParser::new(LOG_LEVELS)
    )]
    pub log_level: String,

    /// Absolute directory for rotating log files (stderr when unset)
    #[arg(long, global = true, env = "MDD_LOG_DIR", value_hint = ValueHint::DirPath)]
    pub log_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new project with the builtin starter templates
    Init {
        /// Directory that will contain `.mdd` (defaults to the current directory)
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        output: Option<PathBuf>,

        /// Project name (defaults to the directory name)
        #[arg(short, long)]
        project: Option<String>,
    },

    /// List available templates
    Templates,

    /// Create a document from a template
    New {
        /// Template shortcut, e.g. `adr`
        shortcut: String,

        /// Document title; words are joined with spaces
        title: Vec<String>,
    },

    /// Add a tag to a document
    Tag { document: String, tag: String },

    /// Remove a tag from a document
    Untag { document: String, tag: String },

    /// Add a child link from one document to another
    Link { parent: String, child: String },

    /// Remove a child link
    Unlink { parent: String, child: String },

    /// List every tag used in the project
    Tags,

    /// List documents
    Ls {
        /// Only documents carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Report child links that point at missing documents
    Verify,
}
