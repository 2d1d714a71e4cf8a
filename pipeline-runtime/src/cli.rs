// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Presentation
//!
//! This crate has no built-in mechanism for discovering stage
//! implementations — unlike the dynamically-imported Python stages this
//! system is modeled on, a compiled `Stage` must be registered into a
//! [`StageRegistry`] before anything can run. The `pipeline` binary is
//! therefore a thin shell: embedding crates build their own registry and
//! call [`run`].
//!
//! Argument parsing and security validation themselves live one layer
//! down, in [`pipeline_bootstrap::cli`]; this module only translates a
//! already-[`ValidatedCli`] into orchestrator calls.

use crate::infrastructure::{FilesystemCacheStore, RayonWorkerPool, TerminalProgressReporter};
use crate::orchestrator::{Orchestrator, RunOptions};
use crate::run_spec::{default_run_spec_path, load_run_spec_from_file};
use anyhow::{Context, Result};
use pipeline_bootstrap::cli::{ValidatedCli, ValidatedCommand};
use pipeline_bootstrap::config::LogLevel;
use pipeline_bootstrap::shutdown::ShutdownCoordinator;
use pipeline_domain::config::ConfigTree;
use pipeline_domain::configure::ConfigurePass;
use pipeline_domain::descriptor::StageRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn resolve_spec_path(spec: Option<PathBuf>) -> Result<PathBuf> {
    match spec {
        Some(path) => Ok(path),
        None => default_run_spec_path(std::env::current_dir()?),
    }
}

/// Runs the CLI against a caller-supplied [`StageRegistry`].
pub async fn run(registry: StageRegistry, cli: ValidatedCli) -> Result<()> {
    crate::infrastructure::logging::init_tracing(LogLevel::from_verbose(cli.verbose));

    match cli.command {
        ValidatedCommand::Run {
            spec,
            working_directory,
            dry_run,
        } => {
            let spec_path = resolve_spec_path(spec)?;
            let mut run_spec = load_run_spec_from_file(&spec_path)?;
            if let Some(dir) = working_directory {
                run_spec.working_directory = Some(dir);
            }
            if dry_run {
                run_spec.rerun_required_targets = true;
            }

            let base_config = ConfigTree::from_value(run_spec.config.clone());
            let pass = ConfigurePass::new(&registry);
            let graph = pass
                .run(&base_config, run_spec.requested_stages())
                .context("configuring requested stages")?;

            let options = RunOptions {
                working_directory: run_spec.working_directory.clone(),
                rerun_required_targets: run_spec.rerun_required_targets,
            };

            let cache_store = match &options.working_directory {
                Some(dir) => FilesystemCacheStore::new(dir.clone()),
                None => FilesystemCacheStore::new(std::env::temp_dir().join("pipeline-ephemeral-cache")),
            };
            let worker_pool = RayonWorkerPool::new(None).context("building worker pool")?;
            let progress = TerminalProgressReporter::new();
            let cancellation = install_shutdown_listener();

            let orchestrator = Orchestrator::new(&cache_store, &worker_pool, &progress, cancellation);
            let results = orchestrator.run(&graph, &options).await?;

            tracing::info!(targets = results.len(), "run complete");
            Ok(())
        }
        ValidatedCommand::Flowchart { spec, out } => {
            let spec_path = resolve_spec_path(spec)?;
            let run_spec = load_run_spec_from_file(&spec_path)?;
            let base_config = ConfigTree::from_value(run_spec.config.clone());
            let pass = ConfigurePass::new(&registry);
            let graph = pass
                .run(&base_config, run_spec.requested_stages())
                .context("configuring requested stages")?;

            let flowchart = crate::flowchart::Flowchart::from_registry(&graph.registry, &Default::default());
            let json = flowchart.to_json().context("serializing flowchart")?;
            std::fs::write(&out, json).with_context(|| format!("writing flowchart to {}", out.display()))?;
            Ok(())
        }
    }
}

/// Bridges the bootstrap layer's OS-signal-driven [`ShutdownCoordinator`]
/// into the [`tokio_util::sync::CancellationToken`] the orchestrator
/// polls once per node.
///
/// The two cancellation primitives stay separate by design: the
/// coordinator owns the grace period and signal handlers and is shared
/// across whatever else a real embedding binary bootstraps, while the
/// token is scoped to a single `Orchestrator::run` call.
fn install_shutdown_listener() -> CancellationToken {
    let coordinator = Arc::new(ShutdownCoordinator::new(Duration::from_secs(5)));
    let token = CancellationToken::new();

    let bootstrap_token = coordinator.token();
    let child = token.clone();
    tokio::spawn(async move {
        bootstrap_token.cancelled().await;
        child.cancel();
    });

    let signal_coordinator = coordinator.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_coordinator.initiate_shutdown();
        }
    });

    token
}
