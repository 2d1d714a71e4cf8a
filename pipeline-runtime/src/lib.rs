// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Runtime
//!
//! Wires [`pipeline_domain`]'s pure resolution and invalidation logic to
//! a concrete environment: a filesystem-backed cache store, a `rayon`
//! worker pool, a terminal progress reporter, run-specification loading,
//! and flowchart export. [`orchestrator::Orchestrator`] is the entry
//! point a caller (the `pipeline` binary, or a test) drives to actually
//! run a pipeline end to end.

pub mod cli;
pub mod flowchart;
pub mod infrastructure;
pub mod orchestrator;
pub mod run_spec;

pub use cli::run as run_cli;
pub use orchestrator::{Orchestrator, OrchestratorOutcome, RunOptions};
pub use run_spec::{load_run_spec_from_file, RunSpec, StageSpec};
