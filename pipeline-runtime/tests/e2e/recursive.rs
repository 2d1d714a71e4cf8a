// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::fixtures::{i64_of_artifact, registry_with, NoopProgress, RecursiveStage};
use pipeline_domain::config::ConfigTree;
use pipeline_domain::configure::{ConfigurePass, RequestedStage};
use pipeline_runtime::infrastructure::{FilesystemCacheStore, MockWorkerPool};
use pipeline_runtime::orchestrator::{Orchestrator, RunOptions};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn self_recursive_stage_sums_down_to_zero() {
    let dir = tempfile::tempdir().unwrap();
    let stage_registry = registry_with(vec![Arc::new(RecursiveStage)]);
    let pass = ConfigurePass::new(&stage_registry);
    let base_config = ConfigTree::from_value(json!({ "a": 5 }));
    let graph = pass.run(&base_config, vec![RequestedStage::new("recursive")]).unwrap();

    // a=5,4,3,2,1,0: six distinct configurations of the same stage, each
    // hashing to its own node.
    assert_eq!(graph.registry.len(), 6);

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
    // 5 + 4 + 3 + 2 + 1 + 0 = 15
    assert_eq!(i64_of_artifact(&results[0]), 15);
}
