// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Initializes the `tracing` subscriber used for the lifetime of a run.
//!
//! The default level comes from [`pipeline_bootstrap::config::LogLevel::to_tracing_level`],
//! with an `EnvFilter` on top so `RUST_LOG` can still override it per
//! module.

use pipeline_bootstrap::config::LogLevel;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber. `level` selects the default
/// filter used when `RUST_LOG` is not set; `RUST_LOG` always takes
/// precedence when present.
pub fn init_tracing(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    // A second call within the same process (e.g. repeated test setup)
    // is expected and harmless; only the first one wins.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
