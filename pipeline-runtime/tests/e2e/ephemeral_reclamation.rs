// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::fixtures::{ephemeral_registry, i64_of_artifact, NoopProgress};
use pipeline_domain::config::ConfigTree;
use pipeline_domain::configure::{ConfigurePass, RequestedStage};
use pipeline_runtime::infrastructure::{FilesystemCacheStore, MockWorkerPool};
use pipeline_runtime::orchestrator::{Orchestrator, RunOptions};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn ephemeral_upstream_is_reclaimed_each_run_but_shared_nodes_survive() {
    let dir = tempfile::tempdir().unwrap();
    let stage_registry = ephemeral_registry();
    let cache_store = FilesystemCacheStore::new(dir.path());
    let worker_pool = MockWorkerPool;
    let progress = NoopProgress;
    let orchestrator = Orchestrator::new(&cache_store, &worker_pool, &progress, CancellationToken::new());
    let options = RunOptions {
        working_directory: Some(dir.path().to_path_buf()),
        rerun_required_targets: false,
    };

    // Run 1: request D alone. D -> C (ephemeral) -> A.
    let pass = ConfigurePass::new(&stage_registry);
    let graph1 = pass.run(&ConfigTree::empty(), vec![RequestedStage::new("ephemeral_d")]).unwrap();
    let d_node = graph1.registry.get(&graph1.roots[0]).unwrap();
    let c_hash = d_node.aliases()["c"];
    let a_hash = graph1.registry.get(&c_hash).unwrap().aliases()["a"];

    let first = orchestrator.run_verbose(&graph1, &options).await.unwrap();
    assert_eq!(first.stale.len(), 3);
    assert_eq!(i64_of_artifact(&first.results[0]), 3);
    // C was ephemeral and had exactly one consumer this run; its cache
    // is reclaimed once D has executed.
    assert!(cache_store.latest_for_node(&c_hash).await.unwrap().is_none());
    assert!(cache_store.latest_for_node(&a_hash).await.unwrap().is_some());

    // Run 2: request D again. A is still fresh; C must be rematerialized
    // since its cache was reclaimed, which in turn makes D stale too.
    let pass = ConfigurePass::new(&stage_registry);
    let graph2 = pass.run(&ConfigTree::empty(), vec![RequestedStage::new("ephemeral_d")]).unwrap();
    let second = orchestrator.run_verbose(&graph2, &options).await.unwrap();
    assert_eq!(second.stale.len(), 2);
    assert!(!second.stale.contains(&a_hash));
    assert!(second.stale.contains(&c_hash));
    assert!(cache_store.latest_for_node(&c_hash).await.unwrap().is_none());
    assert!(cache_store.latest_for_node(&a_hash).await.unwrap().is_some());

    // Run 3: request B and D together. B consumes A non-ephemerally; A
    // is shared between the two roots and is never reclaimed.
    let pass = ConfigurePass::new(&stage_registry);
    let graph3 = pass
        .run(
            &ConfigTree::empty(),
            vec![RequestedStage::new("ephemeral_b"), RequestedStage::new("ephemeral_d")],
        )
        .unwrap();
    assert_eq!(graph3.registry.len(), 4);
    let third = orchestrator.run_verbose(&graph3, &options).await.unwrap();
    assert_eq!(third.stale.len(), 3);
    assert!(!third.stale.contains(&a_hash));
    assert!(cache_store.latest_for_node(&a_hash).await.unwrap().is_some());
    assert!(cache_store.latest_for_node(&c_hash).await.unwrap().is_none());
}
