//! CLI command definitions and dispatch for the `sequor` binary.
//!
//! Uses clap derive macros for argument parsing. Commands either act on a
//! single sequence (`run`, `validate`), browse the sequence catalog
//! (`sequences`), or start the REST API server (`serve`).

pub mod job;
pub mod sequence;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chain remote adversary-emulation operations into campaign sequences.
#[derive(Parser)]
#[command(name = "sequor", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a sequence and follow it to completion.
    Run {
        /// Sequence name (resolved from the sequences directory) or path to
        /// a sequence YAML file.
        sequence: String,

        /// Override the sequences directory for name resolution.
        #[arg(long)]
        sequences_dir: Option<PathBuf>,
    },

    /// Validate a sequence YAML file without running it.
    Validate {
        /// Path to the sequence file.
        file: PathBuf,
    },

    /// List sequence definitions in the sequences directory.
    #[command(alias = "ls")]
    Sequences {
        /// Directory to scan instead of the configured one.
        dir: Option<PathBuf>,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Export spans through the OpenTelemetry stdout exporter.
        #[arg(long)]
        otel: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
