// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # `pipeline` Binary
//!
//! This binary is intentionally stage-free: it registers nothing into
//! its [`StageRegistry`] and exists so `cargo run` and `pipeline
//! flowchart`/`pipeline run --help` work out of the box against an empty
//! graph. A real deployment links [`pipeline_runtime`] as a library,
//! builds a `StageRegistry` populated with its own [`Stage`]
//! implementations, and calls [`pipeline_runtime::run_cli`] from its own
//! thin `main.rs` the same way this one does.

use pipeline_bootstrap::{bootstrap_cli, result_to_exit_code};
use pipeline_domain::descriptor::StageRegistry;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("error: {err}");
            return std::process::ExitCode::from(64); // EX_USAGE
        }
    };

    let registry = StageRegistry::new();
    result_to_exit_code(pipeline_runtime::run_cli(registry, cli).await)
}
