// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::artifact::Artifact;
use crate::configure::{ConfigureContext, ExecuteContext, ValidateContext};
use crate::error::PipelineError;
use crate::value_objects::SourceDigest;
use std::fmt;

/// A single unit of work in the pipeline.
///
/// Implementors declare their upstream dependencies and configuration
/// requirements from [`configure`](Stage::configure), may optionally check
/// preconditions in [`validate`](Stage::validate), and perform their work
/// in [`execute`](Stage::execute). A stage is identified by [`name`](Stage::name)
/// and fingerprinted by [`source_fingerprint`](Stage::source_fingerprint) for
/// change detection; by convention the fingerprint is the stage's own
/// source text, obtained with `include_str!`.
pub trait Stage: Send + Sync {
    /// The stage's registry name. Two instances that report the same name
    /// are treated as the same stage for hashing purposes even if they
    /// were constructed differently.
    fn name(&self) -> &str;

    /// Bytes that change whenever this stage's behavior changes. Used to
    /// invalidate cached artifacts when the implementation, not just the
    /// configuration, has moved on.
    fn source_fingerprint(&self) -> &[u8];

    /// Declares this stage's upstream dependencies and configuration
    /// requirements. Called once per distinct `(stage, configuration)`
    /// pair during the configure pass.
    fn configure(&self, ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError>;

    /// Optional precondition check, run after the graph has stabilized
    /// but before any stage executes. The default implementation accepts
    /// every configuration.
    fn validate(&self, _ctx: &dyn ValidateContext) -> Result<(), PipelineError> {
        Ok(())
    }

    /// Performs the stage's work and returns its output artifact. Called
    /// from a worker pool thread; implementations must not themselves
    /// request new stages or configuration (see
    /// [`PipelineError::ParallelContextViolation`]).
    fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError>;

    /// An externally supplied token that invalidates this node's cache
    /// independent of its configuration or source digest — e.g. a data
    /// source's last-modified revision. Returning `None` (the default)
    /// means this stage has no external invalidation source.
    fn validation_token(&self, _effective_config: &crate::config::ConfigTree) -> Option<String> {
        None
    }
}

/// A resolved stage together with the source digest computed from its
/// fingerprint, as handed back by [`super::StageRegistry::resolve`].
#[derive(Clone)]
pub struct StageHandle {
    name: String,
    source_digest: SourceDigest,
    stage: std::sync::Arc<dyn Stage>,
}

impl StageHandle {
    pub fn new(stage: std::sync::Arc<dyn Stage>) -> Self {
        let source_digest = SourceDigest::of_fingerprint(stage.source_fingerprint());
        StageHandle {
            name: stage.name().to_string(),
            source_digest,
            stage,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_digest(&self) -> SourceDigest {
        self.source_digest
    }

    pub fn stage(&self) -> &std::sync::Arc<dyn Stage> {
        &self.stage
    }
}

impl fmt::Debug for StageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageHandle")
            .field("name", &self.name)
            .field("source_digest", &self.source_digest)
            .finish()
    }
}
