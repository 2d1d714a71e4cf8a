// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

/// A handle a single stage execution uses to report its own progress,
/// independent of however many other stages are reporting concurrently.
///
/// The original implementation split this into a socket-based
/// client/server pair so worker processes could report back to the
/// parent. Threads sharing one address space make that unnecessary here;
/// a handle is just a cheaply cloned reference into shared counters.
pub trait ProgressHandle: Send {
    /// Advances this stage's progress by `delta` units out of whatever
    /// total it previously reported via [`ProgressReporter::set_total`].
    fn advance(&self, delta: u64);

    /// Reports this stage's definite amount of work, if known in
    /// advance. Stages that cannot estimate their own work may skip this.
    fn set_total(&self, total: u64);
}

/// The orchestrator-facing collaborator that aggregates per-node
/// progress into a single run-level view (nodes completed out of total,
/// current in-flight node names).
pub trait ProgressReporter: Send + Sync {
    /// Registers the total number of nodes this run will execute.
    fn set_node_count(&self, total: usize);

    /// Marks one node as started, returning a handle that node's
    /// execution should use to report its own incremental progress.
    fn start_node(&self, node_name: &str) -> Box<dyn ProgressHandle>;

    /// Marks one node as finished (successfully or not); decrements the
    /// in-flight set regardless of outcome.
    fn finish_node(&self, node_name: &str);
}
