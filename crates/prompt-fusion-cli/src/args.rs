//! Command-line argument definitions for the Prompt Fusion CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the prompt file, override the configured
//! step budget and host flags, and choose how the schedule is printed.

use clap::{Parser, ValueEnum};

/// Output format of the schedule report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `start..end: prompt` line per entry
    #[default]
    Text,
    /// A TOML document
    Toml,
}

/// Command-line arguments for the Prompt Fusion scheduler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input prompt file
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Number of diffusion steps (overrides the configuration)
    #[arg(short, long)]
    pub steps: Option<usize>,

    /// Schedule for the hires pass
    #[arg(long)]
    pub hires: bool,

    /// Use the host's old step semantics
    #[arg(long)]
    pub old_scheduling: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also print the elaborated expression tree
    #[arg(long)]
    pub explain: bool,

    /// Path to the output file (standard output if omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Arguments for `input` with every option at its default.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            steps: None,
            hires: false,
            old_scheduling: false,
            format: OutputFormat::default(),
            explain: false,
            output: None,
            config: None,
            log_level: "info".to_string(),
        }
    }
}
