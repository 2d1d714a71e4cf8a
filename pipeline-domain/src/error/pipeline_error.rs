// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use thiserror::Error;

/// Domain-specific errors for the pipeline resolution and execution system.
///
/// Each variant corresponds to one of the error kinds from the error
/// taxonomy: resolution, configuration, structural, cache, and
/// user-code errors. Errors are cloneable so they can be attached to a
/// node hash and logged without consuming the original.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    // --- Resolution errors ---
    #[error("unknown stage descriptor: {0}")]
    UnknownDescriptor(String),

    #[error("stage '{0}' has no execute capability")]
    NoExecuteCapability(String),

    #[error("no external override file for '{0}'")]
    MissingExternalOverride(String),

    // --- Configuration errors ---
    #[error("config option '{key}' missing for stage '{stage}'")]
    ConfigMissing { stage: String, key: String },

    #[error("conflicting default values for config option '{0}'")]
    ConflictingDefault(String),

    #[error("config option '{0}' was not requested by this stage")]
    ConfigNotRequested(String),

    // --- Structural errors ---
    #[error("cycle detected in stage graph: {0}")]
    Cycle(String),

    #[error("alias '{0}' cannot be combined with additional local configuration")]
    AliasWithLocalConfig(String),

    #[error("stage '{0}' was requested at execution time but not declared during configure")]
    UndeclaredDependency(String),

    // --- Cache errors ---
    #[error("working directory does not exist: {0}")]
    WorkingDirectoryMissing(String),

    #[error("flowchart target directory missing: {0}")]
    FlowchartDirectoryMissing(String),

    #[error("cache paths are unavailable without a working directory")]
    NoWorkingDirectory,

    // --- User-code / infrastructure errors ---
    #[error("stage '{node_hash}' failed during execute: {message}")]
    ExecutionFailed { node_hash: String, message: String },

    #[error("parallel context violation: {0}")]
    ParallelContextViolation(String),

    #[error("io error: {0}")]
    IoError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl PipelineError {
    /// Gets the broad error category, for structured logging.
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::UnknownDescriptor(_)
            | PipelineError::NoExecuteCapability(_)
            | PipelineError::MissingExternalOverride(_) => "resolution",

            PipelineError::ConfigMissing { .. }
            | PipelineError::ConflictingDefault(_)
            | PipelineError::ConfigNotRequested(_) => "configuration",

            PipelineError::Cycle(_)
            | PipelineError::AliasWithLocalConfig(_)
            | PipelineError::UndeclaredDependency(_) => "structural",

            PipelineError::WorkingDirectoryMissing(_)
            | PipelineError::FlowchartDirectoryMissing(_)
            | PipelineError::NoWorkingDirectory => "cache",

            PipelineError::ExecutionFailed { .. } => "user-code",
            PipelineError::ParallelContextViolation(_) => "parallel",
            PipelineError::IoError(_) => "io",
            PipelineError::SerializationError(_) => "serialization",
            PipelineError::InternalError(_) => "internal",
        }
    }

    /// Whether the run should abort immediately (all non-user errors do;
    /// user-code failures also abort, but are reported with the
    /// offending node hash attached per the propagation policy).
    pub fn is_fatal(&self) -> bool {
        true
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}
