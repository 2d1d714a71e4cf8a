// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared stage fixtures and test helpers for the end-to-end scenarios
//! under `tests/e2e/`.

use pipeline_domain::artifact::Artifact;
use pipeline_domain::configure::{ConfigureContext, ExecuteContext};
use pipeline_domain::descriptor::{Stage, StageDescriptor, StageRegistry};
use pipeline_domain::error::PipelineError;
use pipeline_domain::repositories::{ProgressHandle, ProgressReporter};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn artifact_of_i64(value: i64) -> Artifact {
    Artifact::new("i64", bincode::serialize(&value).expect("i64 serializes"))
}

pub fn i64_of_artifact(artifact: &Artifact) -> i64 {
    bincode::deserialize(artifact.bytes()).expect("artifact holds a bincode-encoded i64")
}

pub fn artifact_of_string(value: &str) -> Artifact {
    Artifact::new("string", bincode::serialize(value).expect("str serializes"))
}

pub fn string_of_artifact(artifact: &Artifact) -> String {
    bincode::deserialize(artifact.bytes()).expect("artifact holds a bincode-encoded String")
}

fn config_i64(value: &Value) -> i64 {
    value.as_i64().expect("config value is an integer")
}

/// A [`ProgressReporter`] that discards everything, for tests that only
/// care about the orchestrator's staleness and result bookkeeping.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn set_node_count(&self, _total: usize) {}
    fn start_node(&self, _node_name: &str) -> Box<dyn ProgressHandle> {
        Box::new(NoopHandle)
    }
    fn finish_node(&self, _node_name: &str) {}
}

struct NoopHandle;
impl ProgressHandle for NoopHandle {
    fn advance(&self, _delta: u64) {}
    fn set_total(&self, _total: u64) {}
}

pub fn registry_with(stages: Vec<Arc<dyn Stage>>) -> StageRegistry {
    let mut registry = StageRegistry::new();
    for stage in stages {
        registry.register(stage);
    }
    registry
}

// --- Sum-of-configs ---

/// `sum_config(a, b) = a + b`, reading both operands from its effective
/// configuration.
pub struct SumConfigStage;

impl Stage for SumConfigStage {
    fn name(&self) -> &str {
        "sum_config"
    }
    fn source_fingerprint(&self) -> &[u8] {
        b"sum_config-v1"
    }
    fn configure(&self, ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
        ctx.config("a", None)?;
        ctx.config("b", None)?;
        Ok(())
    }
    fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
        let a = config_i64(&ctx.config("a").expect("declared during configure"));
        let b = config_i64(&ctx.config("b").expect("declared during configure"));
        Ok(artifact_of_i64(a + b))
    }
}

// --- Recursive ---

/// For `a > 0`, depends on itself with `a := a - 1` and returns
/// `recursive(a - 1) + a`; returns `0` once `a` reaches zero.
pub struct RecursiveStage;

impl Stage for RecursiveStage {
    fn name(&self) -> &str {
        "recursive"
    }
    fn source_fingerprint(&self) -> &[u8] {
        b"recursive-v1"
    }
    fn configure(&self, ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
        let a = config_i64(&ctx.config("a", None)?);
        if a > 0 {
            ctx.stage(
                StageDescriptor::Named("recursive".into()),
                Some(json!({ "a": a - 1 })),
                Some("ralias".into()),
                false,
            )?;
        }
        Ok(())
    }
    fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
        let a = config_i64(&ctx.config("a").expect("declared during configure"));
        if a > 0 {
            let upstream = i64_of_artifact(ctx.upstream("ralias")?);
            Ok(artifact_of_i64(upstream + a))
        } else {
            Ok(artifact_of_i64(0))
        }
    }
}

// --- Downstream config devalidation: A -> B -> C -> D ---

/// Leaf of the chain: returns `a * multiplier`.
pub struct ChainAStage;

impl Stage for ChainAStage {
    fn name(&self) -> &str {
        "chain_a"
    }
    fn source_fingerprint(&self) -> &[u8] {
        b"chain_a-v1"
    }
    fn configure(&self, ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
        ctx.config("a", None)?;
        ctx.config("multiplier", Some(json!(1)))?;
        Ok(())
    }
    fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
        let a = config_i64(&ctx.config("a").expect("declared during configure"));
        let multiplier = config_i64(&ctx.config("multiplier").expect("declared during configure"));
        Ok(artifact_of_i64(a * multiplier))
    }
}

/// Pass-through wrapping [`ChainAStage`].
pub struct ChainBStage;

impl Stage for ChainBStage {
    fn name(&self) -> &str {
        "chain_b"
    }
    fn source_fingerprint(&self) -> &[u8] {
        b"chain_b-v1"
    }
    fn configure(&self, ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
        ctx.stage(StageDescriptor::Named("chain_a".into()), None, None, false)?;
        Ok(())
    }
    fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
        Ok(artifact_of_i64(i64_of_artifact(ctx.upstream("chain_a")?)))
    }
}

/// Pass-through wrapping [`ChainBStage`].
pub struct ChainCStage;

impl Stage for ChainCStage {
    fn name(&self) -> &str {
        "chain_c"
    }
    fn source_fingerprint(&self) -> &[u8] {
        b"chain_c-v1"
    }
    fn configure(&self, ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
        ctx.stage(StageDescriptor::Named("chain_b".into()), None, None, false)?;
        Ok(())
    }
    fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
        Ok(artifact_of_i64(i64_of_artifact(ctx.upstream("chain_b")?)))
    }
}

/// Aliases [`ChainCStage`] twice, at `a=5` and `a=10`, and sums the two.
pub struct ChainDStage;

impl Stage for ChainDStage {
    fn name(&self) -> &str {
        "chain_d"
    }
    fn source_fingerprint(&self) -> &[u8] {
        b"chain_d-v1"
    }
    fn configure(&self, ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
        ctx.stage(StageDescriptor::Named("chain_c".into()), Some(json!({ "a": 5 })), Some("s1".into()), false)?;
        ctx.stage(StageDescriptor::Named("chain_c".into()), Some(json!({ "a": 10 })), Some("s2".into()), false)?;
        Ok(())
    }
    fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
        let s1 = i64_of_artifact(ctx.upstream("s1")?);
        let s2 = i64_of_artifact(ctx.upstream("s2")?);
        Ok(artifact_of_i64(s1 + s2))
    }
}

pub fn downstream_chain_registry() -> StageRegistry {
    registry_with(vec![Arc::new(ChainAStage), Arc::new(ChainBStage), Arc::new(ChainCStage), Arc::new(ChainDStage)])
}

// --- Ephemeral reclamation: A <- C <- D, with B <- A as a second root ---

/// Leaf returning a fixed value.
pub struct LeafAStage;

impl Stage for LeafAStage {
    fn name(&self) -> &str {
        "ephemeral_a"
    }
    fn source_fingerprint(&self) -> &[u8] {
        b"ephemeral_a-v1"
    }
    fn configure(&self, _ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
        Ok(())
    }
    fn execute(&self, _ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
        Ok(artifact_of_i64(1))
    }
}

/// A non-ephemeral consumer of `A`, standing in for the spec's `B`.
pub struct SiblingBStage;

impl Stage for SiblingBStage {
    fn name(&self) -> &str {
        "ephemeral_b"
    }
    fn source_fingerprint(&self) -> &[u8] {
        b"ephemeral_b-v1"
    }
    fn configure(&self, ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
        ctx.stage(StageDescriptor::Named("ephemeral_a".into()), None, Some("a".into()), false)?;
        Ok(())
    }
    fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
        Ok(artifact_of_i64(i64_of_artifact(ctx.upstream("a")?)))
    }
}

/// Consumes `A` non-ephemerally; is itself requested ephemerally by `D`.
pub struct EphemeralCStage;

impl Stage for EphemeralCStage {
    fn name(&self) -> &str {
        "ephemeral_c"
    }
    fn source_fingerprint(&self) -> &[u8] {
        b"ephemeral_c-v1"
    }
    fn configure(&self, ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
        ctx.stage(StageDescriptor::Named("ephemeral_a".into()), None, Some("a".into()), false)?;
        Ok(())
    }
    fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
        Ok(artifact_of_i64(i64_of_artifact(ctx.upstream("a")?) + 1))
    }
}

/// The run's target: requests `C` ephemerally.
pub struct TargetDStage;

impl Stage for TargetDStage {
    fn name(&self) -> &str {
        "ephemeral_d"
    }
    fn source_fingerprint(&self) -> &[u8] {
        b"ephemeral_d-v1"
    }
    fn configure(&self, ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
        ctx.stage(StageDescriptor::Named("ephemeral_c".into()), None, Some("c".into()), true)?;
        Ok(())
    }
    fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
        Ok(artifact_of_i64(i64_of_artifact(ctx.upstream("c")?) + 1))
    }
}

pub fn ephemeral_registry() -> StageRegistry {
    registry_with(vec![
        Arc::new(LeafAStage),
        Arc::new(SiblingBStage),
        Arc::new(EphemeralCStage),
        Arc::new(TargetDStage),
    ])
}

// --- Token-based external invalidation ---

/// Reads a file's contents at execute time, and again as its validation
/// token so a change to the file invalidates it independent of its
/// configuration (the path itself never changes).
pub struct ExternalFileStage;

impl Stage for ExternalFileStage {
    fn name(&self) -> &str {
        "external_file"
    }
    fn source_fingerprint(&self) -> &[u8] {
        b"external_file-v1"
    }
    fn configure(&self, ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
        ctx.config("path", None)?;
        Ok(())
    }
    fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
        let path = ctx.config("path").expect("declared during configure");
        let path = path.as_str().expect("path is a string");
        let contents = std::fs::read_to_string(path)?;
        Ok(artifact_of_string(&contents))
    }
    fn validation_token(&self, effective_config: &pipeline_domain::config::ConfigTree) -> Option<String> {
        let path = effective_config.get("path")?;
        let path = path.as_str()?;
        std::fs::read_to_string(path).ok()
    }
}

/// Pass-through consumer of [`ExternalFileStage`].
pub struct ExternalConsumerStage;

impl Stage for ExternalConsumerStage {
    fn name(&self) -> &str {
        "external_consumer"
    }
    fn source_fingerprint(&self) -> &[u8] {
        b"external_consumer-v1"
    }
    fn configure(&self, ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
        ctx.stage(StageDescriptor::Named("external_file".into()), None, Some("source".into()), false)?;
        Ok(())
    }
    fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
        Ok(artifact_of_string(&string_of_artifact(ctx.upstream("source")?)))
    }
}

pub fn external_file_registry() -> StageRegistry {
    registry_with(vec![Arc::new(ExternalFileStage), Arc::new(ExternalConsumerStage)])
}

// --- Complex nested configuration ---

/// Requires both `option` and `option.sub`, so a change to either
/// invalidates it.
pub struct NestedConfigReaderStage;

impl Stage for NestedConfigReaderStage {
    fn name(&self) -> &str {
        "nested_reader"
    }
    fn source_fingerprint(&self) -> &[u8] {
        b"nested_reader-v1"
    }
    fn configure(&self, ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
        ctx.config("option", None)?;
        ctx.config("option.sub", None)?;
        Ok(())
    }
    fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
        let sub = ctx.config("option.sub").expect("declared during configure");
        let xyz = sub.get("xyz").and_then(Value::as_i64).expect("xyz present");
        Ok(artifact_of_i64(xyz))
    }
}

/// Pass-through consumer, standing in for the node's descendant.
pub struct NestedConfigConsumerStage;

impl Stage for NestedConfigConsumerStage {
    fn name(&self) -> &str {
        "nested_consumer"
    }
    fn source_fingerprint(&self) -> &[u8] {
        b"nested_consumer-v1"
    }
    fn configure(&self, ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
        ctx.stage(StageDescriptor::Named("nested_reader".into()), None, Some("reader".into()), false)?;
        Ok(())
    }
    fn execute(&self, ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
        Ok(artifact_of_i64(i64_of_artifact(ctx.upstream("reader")?)))
    }
}

pub fn nested_config_registry() -> StageRegistry {
    registry_with(vec![Arc::new(NestedConfigReaderStage), Arc::new(NestedConfigConsumerStage)])
}
