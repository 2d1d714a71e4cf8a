// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::fixtures::{i64_of_artifact, registry_with, NoopProgress, SumConfigStage};
use pipeline_domain::config::ConfigTree;
use pipeline_domain::configure::{ConfigurePass, RequestedStage};
use pipeline_runtime::infrastructure::{FilesystemCacheStore, MockWorkerPool};
use pipeline_runtime::orchestrator::{Orchestrator, RunOptions};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn sum_of_two_configured_operands() {
    let dir = tempfile::tempdir().unwrap();
    let stage_registry = registry_with(vec![Arc::new(SumConfigStage)]);
    let pass = ConfigurePass::new(&stage_registry);
    let base_config = ConfigTree::from_value(json!({ "a": 5, "b": 11 }));
    let graph = pass.run(&base_config, vec![RequestedStage::new("sum_config")]).unwrap();

    let cache_store = FilesystemCacheStore::new(dir.path());
    let worker_pool = MockWorkerPool;
    let progress = NoopProgress;
    let orchestrator = Orchestrator::new(&cache_store, &worker_pool, &progress, CancellationToken::new());
    let options = RunOptions {
        working_directory: Some(dir.path().to_path_buf()),
        rerun_required_targets: false,
    };

    let results = orchestrator.run(&graph, &options).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(i64_of_artifact(&results[0]), 16);

    // A second run with an unchanged config serves the result from cache
    // without re-executing the stage.
    let outcome = orchestrator.run_verbose(&graph, &options).await.unwrap();
    assert!(outcome.stale.is_empty());
    assert_eq!(i64_of_artifact(&outcome.results[0]), 16);
}
