//! CLI argument parsing via clap.

use clap::{Parser, ValueEnum};

/// Demo frontend for the handoff input coordination core.
///
/// Runs a scripted background worker that pauses for operator input on the
/// terminal: clarification questions, permission prompts, or both.
#[derive(Debug, Parser)]
#[command(name = "handoff", version)]
pub struct Args {
    /// Path to config file (default: ./handoff.toml or ~/.config/handoff/handoff.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Disable colored prompt output.
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Which scripted worker to run.
    #[arg(long = "demo", value_enum, default_value_t = Demo::Full)]
    pub demo: Demo,
}

/// Scripted worker variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    /// Ask two clarification questions.
    Clarification,
    /// Ask for file permissions through the session gate.
    Permission,
    /// Clarification first, then permissions.
    Full,
}
