// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::error::PipelineError;
use crate::graph::{ancestor_closure, ExecutionOrder};
use crate::registry::Registry;
use crate::repositories::CacheStore;
use crate::value_objects::{CacheId, NodeHash, SourceDigest};
use std::collections::{HashMap, HashSet};

/// Why a node was marked stale, surfaced for logging and flowchart
/// annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// `rerun_required_targets` is set and this node is one of the run's
    /// explicitly requested targets.
    RequestedTarget,
    /// The run has no working directory, so nothing persists between
    /// invocations and every node must execute.
    NoWorkingDirectory,
    /// Nothing is cached for this node under any prior `CacheId`.
    NeverCached,
    /// Something is cached, but under a different node identity or
    /// source closure — the stage or its configuration changed.
    NodeOrSourceChanged,
    /// The node and its sources are unchanged, but its validation token
    /// moved.
    ValidationTokenChanged,
    /// A cached artifact exists and matches exactly, but an ancestor's
    /// cached artifact is newer, so this node's cached output may have
    /// been produced from stale inputs.
    AncestorArtifactNewer,
    /// An ancestor of this node is itself stale, so this node must be
    /// re-executed regardless of its own cache state.
    AncestorStale,
    /// This node is ephemeral, uncached, and a descendant that consumes
    /// it is stale — it must be produced fresh to satisfy that
    /// descendant even though nothing about this node itself changed.
    EphemeralRematerialization,
}

/// The result of running the invalidator over a configured registry:
/// which nodes must execute, and the `CacheId` each live node resolves
/// to (whether stale or not — fresh nodes still need their `CacheId` to
/// load the cached artifact).
pub struct StalenessReport {
    pub cache_ids: HashMap<NodeHash, CacheId>,
    pub stale: HashMap<NodeHash, StaleReason>,
}

impl StalenessReport {
    pub fn is_stale(&self, node_hash: &NodeHash) -> bool {
        self.stale.contains_key(node_hash)
    }
}

/// Computes which nodes in a configured graph must be (re)executed.
///
/// Runs in topological order so that ancestor staleness is already known
/// by the time a descendant is evaluated (step 6, descendant
/// propagation, short-circuits everything else once an ancestor is
/// stale).
pub struct Invalidator<'a> {
    cache_store: &'a dyn CacheStore,
}

impl<'a> Invalidator<'a> {
    pub fn new(cache_store: &'a dyn CacheStore) -> Self {
        Invalidator { cache_store }
    }

    pub async fn compute(
        &self,
        registry: &Registry,
        roots: &[NodeHash],
        rerun_required_targets: bool,
        has_working_directory: bool,
    ) -> Result<StalenessReport, PipelineError> {
        let order = ExecutionOrder::compute(registry)?;
        let requested: HashSet<NodeHash> = roots.iter().copied().collect();

        let mut cache_ids = HashMap::new();
        let mut stale: HashMap<NodeHash, StaleReason> = HashMap::new();

        for node_hash in order.iter() {
            let node = registry
                .get(node_hash)
                .expect("execution order only contains registered nodes");

            // `ancestor_closure` includes `node_hash` itself, so its own
            // source digest is already covered without an extra push.
            let ancestors = ancestor_closure(registry, std::slice::from_ref(node_hash));
            let ancestor_digests: Vec<SourceDigest> = ancestors
                .iter()
                .filter_map(|hash| registry.get(hash))
                .map(|n| n.handle().source_digest())
                .collect();

            let validation_token = node.handle().stage().validation_token(node.effective_config());
            let cache_id = CacheId::new(*node_hash, ancestor_digests.iter(), validation_token.as_deref());
            cache_ids.insert(*node_hash, cache_id);

            if node.dependencies().iter().any(|edge| stale.contains_key(&edge.node_hash)) {
                stale.insert(*node_hash, StaleReason::AncestorStale);
                continue;
            }

            if !has_working_directory {
                stale.insert(*node_hash, StaleReason::NoWorkingDirectory);
                continue;
            }

            if rerun_required_targets && requested.contains(node_hash) {
                stale.insert(*node_hash, StaleReason::RequestedTarget);
                continue;
            }

            if self.cache_store.contains(&cache_id).await? {
                if let Some(reason) = self.check_ancestor_freshness(registry, node_hash, &cache_id).await? {
                    stale.insert(*node_hash, reason);
                }
                continue;
            }

            let reason = match self.cache_store.latest_for_node(node_hash).await? {
                None => StaleReason::NeverCached,
                Some(info) if info.cache_id.same_node_and_sources(&cache_id) => StaleReason::ValidationTokenChanged,
                Some(_) => StaleReason::NodeOrSourceChanged,
            };
            stale.insert(*node_hash, reason);
        }

        self.rematerialize_ephemeral_upstreams(registry, &order, &cache_ids, &mut stale)
            .await?;

        Ok(StalenessReport { cache_ids, stale })
    }

    /// Step 7: if a stale node has an ephemeral upstream that is not
    /// itself cached, that upstream must be re-executed too, regardless
    /// of what steps 1–6 concluded about it in isolation. Runs in
    /// reverse topological order so a chain of ephemeral upstreams
    /// closes in one pass: by the time an ancestor is visited, every
    /// descendant that could force it stale has already been decided.
    async fn rematerialize_ephemeral_upstreams(
        &self,
        registry: &Registry,
        order: &ExecutionOrder,
        cache_ids: &HashMap<NodeHash, CacheId>,
        stale: &mut HashMap<NodeHash, StaleReason>,
    ) -> Result<(), PipelineError> {
        for node_hash in order.iter().rev() {
            let node = registry.get(node_hash).expect("node present");
            if !stale.contains_key(node_hash) {
                continue;
            }

            for edge in node.dependencies() {
                if !edge.ephemeral || stale.contains_key(&edge.node_hash) {
                    continue;
                }
                let Some(upstream) = registry.get(&edge.node_hash) else { continue };
                if !upstream.is_ephemeral() {
                    continue;
                }
                let cache_id = &cache_ids[&edge.node_hash];
                if !self.cache_store.contains(cache_id).await? {
                    stale.insert(edge.node_hash, StaleReason::EphemeralRematerialization);
                }
            }
        }

        Ok(())
    }

    async fn check_ancestor_freshness(
        &self,
        registry: &Registry,
        node_hash: &NodeHash,
        cache_id: &CacheId,
    ) -> Result<Option<StaleReason>, PipelineError> {
        let node = registry.get(node_hash).expect("node present");
        let own_info = match self.cache_store.latest_for_node(node_hash).await? {
            Some(info) if info.cache_id == *cache_id => info,
            _ => return Ok(None),
        };

        for edge in node.dependencies() {
            if let Some(dep_info) = self.cache_store.latest_for_node(&edge.node_hash).await? {
                if dep_info.modified_at > own_info.modified_at {
                    return Ok(Some(StaleReason::AncestorArtifactNewer));
                }
            }
        }

        Ok(None)
    }
}
