// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::artifact::Artifact;
use crate::error::PipelineError;
use crate::value_objects::{CacheId, NodeHash};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::SystemTime;

/// Metadata about whatever is currently cached for a node, independent
/// of whether its `CacheId` matches the one the invalidator just
/// computed — this is what lets the invalidator tell "stale because the
/// node changed" apart from "stale because nothing is cached yet".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntryInfo {
    pub cache_id: CacheId,
    pub modified_at: SystemTime,
}

/// The persistence boundary for stage artifacts.
///
/// Implemented by infrastructure (a filesystem-backed store, by
/// convention) and consumed by the invalidator and orchestrator. Every
/// method is keyed by [`CacheId`], which already encodes the node's
/// identity, source closure, and validation token, so a cache hit on
/// the wrong `CacheId` is architecturally impossible — the caller
/// either asks for exactly the entry it computed or it asks
/// [`CacheStore::latest_for_node`] what (if anything) is on disk for a
/// node under any `CacheId`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Loads the artifact stored under `cache_id`, if present.
    async fn load(&self, cache_id: &CacheId) -> Result<Option<Artifact>, PipelineError>;

    /// Persists `artifact` under `cache_id`, replacing any prior entry.
    async fn store(&self, cache_id: &CacheId, artifact: &Artifact) -> Result<(), PipelineError>;

    /// Whether `cache_id` currently has a cached artifact, without
    /// paying for a full load.
    async fn contains(&self, cache_id: &CacheId) -> Result<bool, PipelineError>;

    /// Looks up whatever is cached for this node under any prior
    /// `CacheId`, used to detect staleness caused by a changed source
    /// digest or validation token rather than a cache miss.
    async fn latest_for_node(&self, node_hash: &NodeHash) -> Result<Option<CachedEntryInfo>, PipelineError>;

    /// Removes the cached artifact for `cache_id`, if any. Infrastructure
    /// implementations should retry transient removal failures (e.g. a
    /// concurrent reader holding the file open on some platforms) rather
    /// than surfacing them immediately.
    async fn remove(&self, cache_id: &CacheId) -> Result<(), PipelineError>;

    /// Returns the scratch directory reserved for a node, creating it if
    /// necessary. A pre-existing directory from a previous run is
    /// cleared first, so scratch files never leak between runs.
    async fn scratch_dir_for(&self, node_hash: &NodeHash) -> Result<PathBuf, PipelineError>;
}
