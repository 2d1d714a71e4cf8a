// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::artifact::Artifact;
use crate::descriptor::StageDescriptor;
use crate::error::PipelineError;
use crate::repositories::{ProgressHandle, WorkerPool};
use crate::value_objects::NodeHash;
use serde_json::Value;
use std::path::Path;

/// The interface a stage uses, from [`Stage::configure`], to declare its
/// configuration requirements and upstream dependencies.
///
/// Every call to `config` or `stage` is recorded against the node
/// currently being configured, so the driver can compute that node's
/// canonical hash once `configure` returns and detect which downstream
/// nodes need reconfiguring when an ancestor's declarations change.
///
/// [`Stage::configure`]: crate::descriptor::Stage::configure
pub trait ConfigureContext {
    /// Reads a configuration value by dotted key, recording that this
    /// node requires it. `default` is used if the key is absent from the
    /// effective configuration; a stage that provides a default is
    /// expected to provide the *same* default every time it is
    /// configured, or [`PipelineError::ConflictingDefault`] is raised.
    fn config(&mut self, key: &str, default: Option<Value>) -> Result<Value, PipelineError>;

    /// Declares a dependency on another stage, returning the dependency's
    /// node hash once it has been configured. `local_config` is merged
    /// on top of the inherited effective configuration for that edge
    /// only. `alias` gives the dependency a name this node can use to
    /// look its artifact up again in `execute`; an alias cannot be
    /// combined with `local_config` ([`PipelineError::AliasWithLocalConfig`]).
    /// `ephemeral` marks the dependency's artifact for reclamation once
    /// every consumer that required it has executed.
    fn stage(
        &mut self,
        descriptor: StageDescriptor,
        local_config: Option<Value>,
        alias: Option<String>,
        ephemeral: bool,
    ) -> Result<NodeHash, PipelineError>;

    /// Whether this node has already requested `key` during this
    /// configure call, for stages that branch on their own prior
    /// requests instead of issuing conflicting defaults.
    fn is_config_requested(&self, key: &str) -> bool;
}

/// Read-only configuration access for [`Stage::validate`].
///
/// [`Stage::validate`]: crate::descriptor::Stage::validate
pub trait ValidateContext {
    fn config(&self, key: &str) -> Option<Value>;
}

/// The interface a stage uses, from [`Stage::execute`], to read its
/// resolved configuration and fetch upstream artifacts.
///
/// [`Stage::execute`]: crate::descriptor::Stage::execute
pub trait ExecuteContext {
    fn config(&self, key: &str) -> Option<Value>;

    /// Fetches the artifact produced by a dependency requested during
    /// `configure`, addressed by the alias given at request time (or by
    /// stage name, if no alias was given).
    fn upstream(&self, alias_or_name: &str) -> Result<&Artifact, PipelineError>;

    /// The scratch directory for `alias_or_name`'s node, or this node's
    /// own scratch directory if `alias_or_name` is `None`. Resolved the
    /// same way [`ExecuteContext::upstream`] resolves an alias or stage
    /// name (the alias already captures any per-edge `local_config`
    /// distinguishing one configured instance of a stage from another,
    /// so there is no separate `local_config` parameter here). Absent
    /// for runs with no working directory, or for a dependency whose
    /// scratch directory was not created during this run, in which case
    /// stages relying on disk persistence should fail with
    /// [`PipelineError::NoWorkingDirectory`].
    fn path(&self, alias_or_name: Option<&str>) -> Option<&Path>;

    /// True once a shutdown has been requested; long-running stages
    /// should poll this and exit early rather than racing to finish.
    fn is_cancelled(&self) -> bool;

    /// The worker pool backing this node's own internal data parallelism
    /// (e.g. mapping a function over a large input split). A stage
    /// reached through this handle cannot itself request further stages
    /// or recurse into another worker pool acquisition; both attempts
    /// are a [`PipelineError::ParallelContextViolation`].
    fn worker_pool(&self) -> &dyn WorkerPool;

    /// This node's progress handle, for stages that want to report
    /// finer-grained internal progress (rows processed, bytes written)
    /// than the orchestrator's own "node started/finished" reporting.
    fn progress(&self) -> &dyn ProgressHandle;

    /// Records a value under `key` in this node's side-channel info map,
    /// collected by the orchestrator into its run-level info map once
    /// this node's `execute` returns. Overwrites any prior value for the
    /// same key.
    fn set_info(&self, key: &str, value: Value);

    /// Reads back a value this node previously recorded with
    /// [`ExecuteContext::set_info`].
    fn get_info(&self, key: &str) -> Option<Value>;
}
