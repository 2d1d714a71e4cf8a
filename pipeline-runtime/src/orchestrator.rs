// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Drives a configured graph to completion: computes staleness, executes
//! every stale node in topological order, persists fresh artifacts,
//! reclaims ephemeral storage, and assembles the results requested
//! targets asked for.

use pipeline_domain::artifact::Artifact;
use pipeline_domain::configure::{ConfiguredGraph, ExecuteContext};
use pipeline_domain::error::PipelineError;
use pipeline_domain::graph::ExecutionOrder;
use pipeline_domain::invalidate::{Invalidator, StalenessReport};
use pipeline_domain::node::ParameterizedNode;
use pipeline_domain::registry::Registry;
use pipeline_domain::repositories::{CacheStore, ProgressHandle, ProgressReporter, WorkerPool};
use pipeline_domain::value_objects::NodeHash;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Per-run settings that are not part of the stage graph itself.
pub struct RunOptions {
    /// The run's working directory, used for the cache store and every
    /// node's scratch directory. `None` disables persistence entirely:
    /// every node runs fresh and nothing is written to disk.
    pub working_directory: Option<PathBuf>,
    /// Forces every requested target to execute even if its cache is
    /// fresh, per spec.md's requested-target invalidation policy.
    pub rerun_required_targets: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            working_directory: None,
            rerun_required_targets: false,
        }
    }
}

/// The verbose result of a run: results in requested-target order, the
/// set of nodes that executed (as opposed to being served from cache),
/// and a small info map of run-level diagnostics.
pub struct OrchestratorOutcome {
    pub results: Vec<Artifact>,
    pub stale: HashSet<NodeHash>,
    pub info: HashMap<String, Value>,
}

/// Executes a [`ConfiguredGraph`] against a set of collaborators.
///
/// Single-threaded: exactly one node executes at a time, in topological
/// order. A node's own `execute` may still use the worker pool handed to
/// it for internal data parallelism (e.g. mapping a function over a
/// large input split) — that parallelism is bounded to the node's own
/// execution and never overlaps with another node's.
pub struct Orchestrator<'a> {
    cache_store: &'a dyn CacheStore,
    worker_pool: &'a dyn WorkerPool,
    progress: &'a dyn ProgressReporter,
    cancellation: CancellationToken,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        cache_store: &'a dyn CacheStore,
        worker_pool: &'a dyn WorkerPool,
        progress: &'a dyn ProgressReporter,
        cancellation: CancellationToken,
    ) -> Self {
        Orchestrator {
            cache_store,
            worker_pool,
            progress,
            cancellation,
        }
    }

    /// Runs the graph and returns only the requested targets' artifacts,
    /// in requested order. The terse entry point the CLI's default `run`
    /// subcommand uses.
    pub async fn run(&self, graph: &ConfiguredGraph, options: &RunOptions) -> Result<Vec<Artifact>, PipelineError> {
        Ok(self.run_verbose(graph, options).await?.results)
    }

    #[instrument(skip(self, graph, options), fields(nodes = graph.registry.len()))]
    pub async fn run_verbose(
        &self,
        graph: &ConfiguredGraph,
        options: &RunOptions,
    ) -> Result<OrchestratorOutcome, PipelineError> {
        let registry = &graph.registry;
        let has_working_directory = options.working_directory.is_some();

        let invalidator = Invalidator::new(self.cache_store);
        let report = invalidator
            .compute(registry, &graph.roots, options.rerun_required_targets, has_working_directory)
            .await?;

        let order = ExecutionOrder::compute(registry)?;
        self.progress.set_node_count(order.len());

        let mut ephemeral_refcounts = initialize_ephemeral_refcounts(registry, &order, &report);
        let mut artifacts: HashMap<NodeHash, Artifact> = HashMap::new();
        let mut scratch_dirs: HashMap<NodeHash, PathBuf> = HashMap::new();
        let mut info: HashMap<String, Value> = HashMap::new();

        for node_hash in order.iter() {
            if self.cancellation.is_cancelled() {
                return Err(PipelineError::InternalError("run cancelled".to_string()));
            }

            let node = registry.get(node_hash).expect("execution order only lists registered nodes");

            if !report.is_stale(node_hash) {
                continue;
            }

            self.ensure_dependencies_loaded(registry, node, &report, &mut artifacts).await?;

            if has_working_directory {
                let dir = self.cache_store.scratch_dir_for(node_hash).await?;
                scratch_dirs.insert(*node_hash, dir);
            }

            let progress_handle = self.progress.start_node(node.name());
            let node_info: Mutex<HashMap<String, Value>> = Mutex::new(HashMap::new());
            let execute_ctx = NodeExecuteContext {
                node,
                registry,
                artifacts: &artifacts,
                scratch_dirs: &scratch_dirs,
                cancellation: &self.cancellation,
                worker_pool: self.worker_pool,
                progress_handle: progress_handle.as_ref(),
                info: &node_info,
            };

            let outcome = node.handle().stage().execute(&execute_ctx);
            self.progress.finish_node(node.name());

            let artifact = match outcome {
                Ok(artifact) => artifact,
                Err(err) => {
                    return Err(PipelineError::ExecutionFailed {
                        node_hash: node_hash.to_hex(),
                        message: err.to_string(),
                    });
                }
            };

            if has_working_directory {
                let cache_id = &report.cache_ids[node_hash];
                self.cache_store.store(cache_id, &artifact).await?;
            }

            let node_info = node_info.into_inner().unwrap_or_else(|e| e.into_inner());
            for (key, value) in node_info {
                info.insert(format!("{}.{key}", node.name()), value);
            }
            artifacts.insert(*node_hash, artifact);

            self.release_ephemeral_upstreams(registry, node, &report, has_working_directory, &mut ephemeral_refcounts)
                .await?;
        }

        let mut results = Vec::with_capacity(graph.roots.len());
        for root in &graph.roots {
            let artifact = match artifacts.get(root) {
                Some(artifact) => artifact.clone(),
                None => {
                    let cache_id = &report.cache_ids[root];
                    self.cache_store
                        .load(cache_id)
                        .await?
                        .ok_or_else(|| PipelineError::InternalError(format!("no cached artifact for target {root}")))?
                }
            };
            results.push(artifact);
        }

        Ok(OrchestratorOutcome {
            results,
            stale: report.stale.keys().copied().collect(),
            info,
        })
    }

    /// Makes sure every dependency of `node` has its artifact available
    /// in `artifacts`, loading fresh (non-stale, cache-satisfied)
    /// dependencies from disk on demand. Stale dependencies are already
    /// present because topological order guarantees they executed
    /// earlier.
    async fn ensure_dependencies_loaded(
        &self,
        registry: &Registry,
        node: &ParameterizedNode,
        report: &StalenessReport,
        artifacts: &mut HashMap<NodeHash, Artifact>,
    ) -> Result<(), PipelineError> {
        for edge in node.dependencies() {
            if artifacts.contains_key(&edge.node_hash) {
                continue;
            }
            let Some(dep_cache_id) = report.cache_ids.get(&edge.node_hash) else {
                continue;
            };
            let Some(artifact) = self.cache_store.load(dep_cache_id).await? else {
                let dep_name = registry.get(&edge.node_hash).map(|n| n.name()).unwrap_or("<unknown>");
                return Err(PipelineError::InternalError(format!(
                    "dependency '{dep_name}' has no cached artifact and was not re-executed"
                )));
            };
            artifacts.insert(edge.node_hash, artifact);
        }
        Ok(())
    }

    /// Decrements the ephemeral reference count of every ephemeral
    /// upstream `node` consumed, reclaiming storage for any upstream
    /// whose count reaches zero.
    async fn release_ephemeral_upstreams(
        &self,
        registry: &Registry,
        node: &ParameterizedNode,
        report: &StalenessReport,
        has_working_directory: bool,
        ephemeral_refcounts: &mut HashMap<NodeHash, u64>,
    ) -> Result<(), PipelineError> {
        for edge in node.dependencies() {
            if !edge.ephemeral {
                continue;
            }
            let Some(count) = ephemeral_refcounts.get_mut(&edge.node_hash) else {
                continue;
            };
            *count -= 1;
            if *count == 0 {
                ephemeral_refcounts.remove(&edge.node_hash);
                if has_working_directory {
                    let name = registry.get(&edge.node_hash).map(|n| n.name()).unwrap_or("<unknown>");
                    info!(node = name, "reclaiming ephemeral artifact");
                    if let Some(cache_id) = report.cache_ids.get(&edge.node_hash) {
                        self.cache_store.remove(cache_id).await?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Initializes the per-upstream reference counts used by ephemeral
/// reclamation: one count per ephemeral node that is itself stale (being
/// produced fresh this run), equal to the number of distinct stale
/// downstream nodes that consume it through an ephemeral edge. An
/// upstream satisfied from cache at run start is never tracked, so it is
/// never reclaimed (it was not produced by this run to begin with).
fn initialize_ephemeral_refcounts(
    registry: &Registry,
    order: &ExecutionOrder,
    report: &StalenessReport,
) -> HashMap<NodeHash, u64> {
    let mut counts: HashMap<NodeHash, u64> = HashMap::new();
    for node_hash in order.iter() {
        if !report.is_stale(node_hash) {
            continue;
        }
        let Some(node) = registry.get(node_hash) else { continue };
        for edge in node.dependencies() {
            if !edge.ephemeral || !report.is_stale(&edge.node_hash) {
                continue;
            }
            let Some(upstream) = registry.get(&edge.node_hash) else { continue };
            if !upstream.is_ephemeral() {
                continue;
            }
            *counts.entry(edge.node_hash).or_insert(0) += 1;
        }
    }
    counts
}

struct NodeExecuteContext<'a> {
    node: &'a ParameterizedNode,
    registry: &'a Registry,
    artifacts: &'a HashMap<NodeHash, Artifact>,
    scratch_dirs: &'a HashMap<NodeHash, PathBuf>,
    cancellation: &'a CancellationToken,
    worker_pool: &'a dyn WorkerPool,
    progress_handle: &'a dyn ProgressHandle,
    info: &'a Mutex<HashMap<String, Value>>,
}

impl NodeExecuteContext<'_> {
    /// Resolves an alias, dependency stage name, or (when `None`) this
    /// node's own hash to a concrete [`NodeHash`], the same lookup
    /// `upstream` and `path` both need.
    fn resolve_hash(&self, alias_or_name: Option<&str>) -> Result<NodeHash, PipelineError> {
        let Some(alias_or_name) = alias_or_name else {
            return Ok(self.node.node_hash());
        };
        self.node
            .aliases()
            .get(alias_or_name)
            .copied()
            .or_else(|| {
                self.node.dependencies().iter().find_map(|edge| {
                    self.registry
                        .get(&edge.node_hash)
                        .filter(|dep| dep.name() == alias_or_name)
                        .map(|_| edge.node_hash)
                })
            })
            .ok_or_else(|| PipelineError::UndeclaredDependency(alias_or_name.to_string()))
    }
}

impl ExecuteContext for NodeExecuteContext<'_> {
    fn config(&self, key: &str) -> Option<Value> {
        self.node.effective_config().get(key)
    }

    fn upstream(&self, alias_or_name: &str) -> Result<&Artifact, PipelineError> {
        let hash = self.resolve_hash(Some(alias_or_name))?;
        self.artifacts
            .get(&hash)
            .ok_or_else(|| PipelineError::InternalError(format!("artifact for '{alias_or_name}' not loaded")))
    }

    fn path(&self, alias_or_name: Option<&str>) -> Option<&Path> {
        let hash = self.resolve_hash(alias_or_name).ok()?;
        self.scratch_dirs.get(&hash).map(PathBuf::as_path)
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    fn worker_pool(&self) -> &dyn WorkerPool {
        self.worker_pool
    }

    fn progress(&self) -> &dyn ProgressHandle {
        self.progress_handle
    }

    fn set_info(&self, key: &str, value: Value) {
        let mut info = self.info.lock().unwrap_or_else(|e| e.into_inner());
        info.insert(key.to_string(), value);
    }

    fn get_info(&self, key: &str) -> Option<Value> {
        let info = self.info.lock().unwrap_or_else(|e| e.into_inner());
        info.get(key).cloned()
    }
}
