// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::fixtures::{external_file_registry, string_of_artifact, NoopProgress};
use pipeline_domain::config::ConfigTree;
use pipeline_domain::configure::{ConfigurePass, RequestedStage};
use pipeline_runtime::infrastructure::{FilesystemCacheStore, MockWorkerPool};
use pipeline_runtime::orchestrator::{Orchestrator, RunOptions};
use serde_json::json;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn external_file_change_invalidates_stage_and_its_descendant() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("source.txt");
    std::fs::write(&source_path, "revision-one").unwrap();

    let stage_registry = external_file_registry();
    let cache_store = FilesystemCacheStore::new(dir.path());
    let worker_pool = MockWorkerPool;
    let progress = NoopProgress;
    let orchestrator = Orchestrator::new(&cache_store, &worker_pool, &progress, CancellationToken::new());
    let options = RunOptions {
        working_directory: Some(dir.path().to_path_buf()),
        rerun_required_targets: false,
    };

    let base_config = ConfigTree::from_value(json!({ "path": source_path.to_string_lossy() }));
    let pass = ConfigurePass::new(&stage_registry);
    let graph = pass.run(&base_config, vec![RequestedStage::new("external_consumer")]).unwrap();

    let first = orchestrator.run_verbose(&graph, &options).await.unwrap();
    assert_eq!(first.stale.len(), 2);
    assert_eq!(string_of_artifact(&first.results[0]), "revision-one");

    // Rerunning with the file unchanged finds both nodes fresh, even
    // though the stage's configuration (the path) never changed either.
    let unchanged = orchestrator.run_verbose(&graph, &options).await.unwrap();
    assert!(unchanged.stale.is_empty());
    assert_eq!(string_of_artifact(&unchanged.results[0]), "revision-one");

    // The path stays the same, but its contents change: the validation
    // token changes, invalidating the reader and its downstream consumer.
    std::fs::write(&source_path, "revision-two").unwrap();
    let after_edit = orchestrator.run_verbose(&graph, &options).await.unwrap();
    assert_eq!(after_edit.stale.len(), 2);
    assert_eq!(string_of_artifact(&after_edit.results[0]), "revision-two");
}
