// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Adapters
//!
//! Concrete implementations of the collaborator traits `pipeline_domain`
//! defines: a filesystem-backed cache store, a `rayon` worker pool, a
//! terminal progress reporter, and `tracing` initialization.

pub mod cache_store;
pub mod logging;
pub mod progress;
pub mod worker_pool;

pub use cache_store::FilesystemCacheStore;
pub use progress::TerminalProgressReporter;
pub use worker_pool::{MockWorkerPool, RayonWorkerPool};
