// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Grammar
//!
//! First stage of the CLI pipeline: the raw `clap` grammar. Nothing here
//! validates paths or opens files; it only describes shape. Validation
//! lives in [`super::validator`].

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reproducible stage-graph pipeline runner.
#[derive(Debug, Parser)]
#[command(name = "pipeline", version, about = "Reproducible stage-graph pipeline runner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit debug-level tracing instead of info-level.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Optional configuration file overlay, merged beneath CLI flags.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve the requested stages and execute everything that is stale.
    Run {
        /// Path to the run specification (defaults to `run_spec.yml` in the
        /// working directory).
        spec: Option<PathBuf>,

        /// Working directory external stages should materialize output
        /// into.
        #[arg(long)]
        working_directory: Option<PathBuf>,

        /// Resolve the graph and report staleness without executing
        /// anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Configure the requested stages and emit the resulting graph as
    /// Mermaid-compatible JSON, without executing anything.
    Flowchart {
        /// Path to the run specification (defaults to `run_spec.yml` in the
        /// working directory).
        spec: Option<PathBuf>,

        /// Output file for the flowchart JSON.
        #[arg(long, default_value = "flowchart.json")]
        out: PathBuf,
    },
}

/// Parses `std::env::args()` into a [`Cli`].
///
/// Clap handles `--help`/`--version` and process exit internally; this
/// never returns on those paths.
pub fn parse_cli() -> Cli {
    Cli::parse()
}
