//! CLI module for the research pipeline
//!
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::{ResearchScope, SynthesisMode};

/// ARES Research - multi-phase research synthesis pipeline
#[derive(Parser, Debug)]
#[command(
    name = "ares-research",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "Collect, process, debate and synthesize research on a topic",
    after_help = "EXAMPLES:\n    \
                  ares-research run \"climate policy\"            # Configured defaults\n    \
                  ares-research run \"carbon tax\" --scope broad  # Follow more references\n    \
                  ares-research run \"solar\" --no-conversations  # Skip agent collaboration\n    \
                  ares-research config --validate               # Check research.toml"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "research.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the research pipeline on a topic
    Run {
        /// Research topic
        topic: String,

        /// Research scope (narrow, broad, comprehensive)
        #[arg(long, value_parser = parse_scope)]
        scope: Option<ResearchScope>,

        /// Maximum number of secondary sources
        #[arg(long)]
        max_sources: Option<usize>,

        /// Synthesis mode (comprehensive, summary, insights_only)
        #[arg(long, value_parser = parse_mode)]
        mode: Option<SynthesisMode>,

        /// Skip the agent collaboration phase
        #[arg(long)]
        no_conversations: bool,

        /// Write the JSON result to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print a human-readable summary instead of JSON
        #[arg(long)]
        summary: bool,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file
        #[arg(long)]
        validate: bool,

        /// List pipeline steps with their input and output schemas
        #[arg(long)]
        steps: bool,
    },

    /// List results saved by JSON-file persistence
    Results,
}

fn parse_scope(s: &str) -> Result<ResearchScope, String> {
    s.parse().map_err(|e: crate::types::PipelineError| e.to_string())
}

fn parse_mode(s: &str) -> Result<SynthesisMode, String> {
    s.parse().map_err(|e: crate::types::PipelineError| e.to_string())
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
