// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::fixtures::{i64_of_artifact, nested_config_registry, NoopProgress};
use pipeline_domain::config::ConfigTree;
use pipeline_domain::configure::{ConfigurePass, RequestedStage};
use pipeline_runtime::infrastructure::{FilesystemCacheStore, MockWorkerPool};
use pipeline_runtime::orchestrator::{Orchestrator, RunOptions};
use serde_json::json;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn nested_configuration_changes_invalidate_the_reading_chain() {
    let dir = tempfile::tempdir().unwrap();
    let stage_registry = nested_config_registry();
    let cache_store = FilesystemCacheStore::new(dir.path());
    let worker_pool = MockWorkerPool;
    let progress = NoopProgress;
    let orchestrator = Orchestrator::new(&cache_store, &worker_pool, &progress, CancellationToken::new());
    let options = RunOptions {
        working_directory: Some(dir.path().to_path_buf()),
        rerun_required_targets: false,
    };

    let base_config = ConfigTree::from_value(json!({ "option": { "sub": { "xyz": 123 } } }));
    let pass = ConfigurePass::new(&stage_registry);
    let graph = pass.run(&base_config, vec![RequestedStage::new("nested_consumer")]).unwrap();

    let first = orchestrator.run_verbose(&graph, &options).await.unwrap();
    assert_eq!(first.stale.len(), 2);
    assert_eq!(i64_of_artifact(&first.results[0]), 123);

    // An identical rerun against the same graph finds both nodes fresh.
    let unchanged = orchestrator.run_verbose(&graph, &options).await.unwrap();
    assert!(unchanged.stale.is_empty());

    // Adding a key under the nested subtree the reader depends on
    // changes its effective configuration, and so its node identity —
    // this is a fresh node, never cached, not a mutation of the old one.
    let mutated_config = ConfigTree::from_value(json!({ "option": { "sub": { "xyz": 123, "new": 5 } } }));
    let pass = ConfigurePass::new(&stage_registry);
    let mutated_graph = pass.run(&mutated_config, vec![RequestedStage::new("nested_consumer")]).unwrap();
    assert_ne!(mutated_graph.roots[0], graph.roots[0]);

    let after_mutation = orchestrator.run_verbose(&mutated_graph, &options).await.unwrap();
    assert_eq!(after_mutation.stale.len(), 2);
    assert_eq!(i64_of_artifact(&after_mutation.results[0]), 123);
}
