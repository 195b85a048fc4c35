//! Command-line interface, built on clap.
//!
//! The three entry points of the pipeline map to subcommands: `filter`
//! extracts eligible candidates, `submit` drains an existing queue, and
//! `run` composes the two.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// alphasub — batch submitter for simulated alphas.
#[derive(Debug, Parser)]
#[command(name = "alphasub", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to an alternate config file (default: alphasub.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the simulation-results input artifact.
    #[arg(long, global = true)]
    pub input: Option<PathBuf>,

    /// Override the pending-queue artifact.
    #[arg(long, global = true)]
    pub queue: Option<PathBuf>,

    /// Show server-directed wait intervals and the full run summary.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract eligible candidate ids into the pending queue.
    Filter,

    /// Submit pending candidates until COUNT succeed or the queue runs dry.
    Submit {
        /// Number of successful submissions to aim for.
        count: usize,
    },

    /// Filter, then submit until COUNT succeed.
    Run {
        /// Number of successful submissions to aim for.
        count: usize,
    },
}
