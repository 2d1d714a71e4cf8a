// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::artifact::Artifact;
use crate::error::PipelineError;

/// A job submitted to a [`WorkerPool`]: a stage's `execute` call, already
/// bound to its context, reduced to a plain closure so the domain need
/// not know how the pool actually schedules it.
pub type StageJob = Box<dyn FnOnce() -> Result<Artifact, PipelineError> + Send>;

/// The substrate the orchestrator uses to run a batch of ready,
/// mutually independent nodes concurrently.
///
/// The original pipeline ran each stage in its own OS process, chosen
/// so Python's global interpreter lock would not serialize CPU-bound
/// work. A compiled Rust stage has no such constraint, so this is a
/// thread-pool contract rather than a process-pool one; the "no nested
/// `stage()`/`parallel()` calls from inside a running stage" rule is
/// enforced by what the execute context exposes, not by process
/// isolation.
pub trait WorkerPool: Send + Sync {
    /// Runs every job, returning results in the same order the jobs were
    /// submitted. A pool is free to run them concurrently up to its
    /// configured width; callers must not assume anything about
    /// completion order beyond "all complete before this returns."
    fn run_all(&self, jobs: Vec<StageJob>) -> Vec<Result<Artifact, PipelineError>>;

    /// The pool's configured width, surfaced for logging and for stages
    /// that want to size their own internal batching.
    fn worker_count(&self) -> usize;
}
