// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error Module
//!
//! Structured error types for the pipeline domain. Errors are organized
//! into the categories used throughout resolution, configuration,
//! invalidation, and execution: resolution failures, configuration
//! failures, graph-structural failures, cache failures, and user-code
//! failures surfaced from a stage's `execute`.

mod pipeline_error;

pub use pipeline_error::PipelineError;
