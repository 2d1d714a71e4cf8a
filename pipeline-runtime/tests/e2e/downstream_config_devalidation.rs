// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::fixtures::{downstream_chain_registry, i64_of_artifact, NoopProgress};
use pipeline_domain::config::ConfigTree;
use pipeline_domain::configure::{ConfigurePass, RequestedStage};
use pipeline_runtime::infrastructure::{FilesystemCacheStore, MockWorkerPool};
use pipeline_runtime::orchestrator::{Orchestrator, RunOptions};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn downstream_target_revalidates_without_disturbing_unchanged_ancestors() {
    let dir = tempfile::tempdir().unwrap();
    let stage_registry = downstream_chain_registry();
    let pass = ConfigurePass::new(&stage_registry);
    let graph = pass.run(&ConfigTree::empty(), vec![RequestedStage::new("chain_d")]).unwrap();

    // chain_a/b/c, each requested twice (a=5 and a=10 branches), plus
    // chain_d itself: seven distinct nodes.
    assert_eq!(graph.registry.len(), 7);

    let cache_store = FilesystemCacheStore::new(dir.path());
    let worker_pool = MockWorkerPool;
    let progress = NoopProgress;
    let orchestrator = Orchestrator::new(&cache_store, &worker_pool, &progress, CancellationToken::new());

    let first_options = RunOptions {
        working_directory: Some(dir.path().to_path_buf()),
        rerun_required_targets: false,
    };
    let first = orchestrator.run_verbose(&graph, &first_options).await.unwrap();
    assert_eq!(first.stale.len(), 7);
    assert_eq!(i64_of_artifact(&first.results[0]), 5 + 10);

    // An identical second run with no `rerun_required_targets` finds
    // everything fresh.
    let second = orchestrator.run_verbose(&graph, &first_options).await.unwrap();
    assert!(second.stale.is_empty());
    assert_eq!(i64_of_artifact(&second.results[0]), 15);

    // Forcing the requested target to rerun invalidates only chain_d
    // itself; its unchanged ancestors are still served from cache.
    let forced_options = RunOptions {
        working_directory: Some(dir.path().to_path_buf()),
        rerun_required_targets: true,
    };
    let third = orchestrator.run_verbose(&graph, &forced_options).await.unwrap();
    assert_eq!(third.stale.len(), 1);
    assert!(third.stale.contains(&graph.roots[0]));
    assert_eq!(i64_of_artifact(&third.results[0]), 15);
}
