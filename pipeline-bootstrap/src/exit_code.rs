// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Management
//!
//! Standardized Unix exit codes following BSD `sysexits.h` conventions.
//!
//! ## Exit Code Conventions
//!
//! - **0**: Success
//! - **1**: General error
//! - **64-78**: Specific error conditions (BSD sysexits.h)
//! - **128+N**: Fatal signal N (e.g., 130 = SIGINT)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pipeline_bootstrap::exit_code::{result_to_exit_code, ExitCode};
//!
//! fn run_application() -> anyhow::Result<()> {
//!     Ok(())
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     result_to_exit_code(run_application())
//! }
//! ```

use std::fmt;

/// Exit codes following Unix conventions (BSD sysexits.h).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful termination (0).
    #[default]
    Success = 0,

    /// General error (1).
    Error = 1,

    /// Command line usage error (64): invalid arguments, missing required
    /// arguments, unknown flags.
    UsageError = 64,

    /// Data format error (65): malformed run spec, parse errors.
    DataError = 65,

    /// Cannot open input (66): run spec not found, permission denied on
    /// input.
    NoInput = 66,

    /// Required external dependency unavailable (69).
    Unavailable = 69,

    /// Internal software error (70): invariant violation, assertion
    /// failure.
    Software = 70,

    /// System error (71): OS call failed.
    OsError = 71,

    /// Cannot create output (73): cache directory not writable, disk full.
    CantCreate = 73,

    /// I/O error (74).
    IoError = 74,

    /// Permission denied (77).
    NoPerm = 77,

    /// Configuration error (78): invalid or missing configuration.
    Config = 78,

    /// Interrupted by signal (SIGINT - Ctrl+C) (130).
    Interrupted = 130,

    /// Terminated by signal (SIGTERM) (143).
    Terminated = 143,
}

impl ExitCode {
    /// Converts to an `i32` for use with `std::process::exit`.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps a [`pipeline_domain::error::PipelineError`] category to an
    /// exit code via its error message, since the domain error's
    /// `category()` is a free-form string rather than a closed enum.
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        let error_string = error.to_string().to_lowercase();

        if error_string.contains("permission") || error_string.contains("access denied") {
            ExitCode::NoPerm
        } else if error_string.contains("not found") || error_string.contains("no such") {
            ExitCode::NoInput
        } else if error_string.contains("invalid") || error_string.contains("argument") {
            ExitCode::UsageError
        } else if error_string.contains("parse") || error_string.contains("format") || error_string.contains("serialization") {
            ExitCode::DataError
        } else if error_string.contains("io error") || error_string.contains("read") || error_string.contains("write") {
            ExitCode::IoError
        } else if error_string.contains("config") {
            ExitCode::Config
        } else if error_string.contains("unavailable") || error_string.contains("not available") {
            ExitCode::Unavailable
        } else {
            ExitCode::Error
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Error => "General error",
            ExitCode::UsageError => "Command line usage error",
            ExitCode::DataError => "Data format error",
            ExitCode::NoInput => "Cannot open input",
            ExitCode::Unavailable => "Service unavailable",
            ExitCode::Software => "Internal software error",
            ExitCode::OsError => "System error",
            ExitCode::CantCreate => "Cannot create output",
            ExitCode::IoError => "I/O error",
            ExitCode::NoPerm => "Permission denied",
            ExitCode::Config => "Configuration error",
            ExitCode::Interrupted => "Interrupted by signal (SIGINT)",
            ExitCode::Terminated => "Terminated by signal (SIGTERM)",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn is_error(self) -> bool {
        !self.is_success()
    }

    pub fn is_signal(self) -> bool {
        matches!(self, ExitCode::Interrupted | ExitCode::Terminated)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

/// Maps an `anyhow::Error` to an [`ExitCode`] by inspecting its root cause.
pub fn map_error_to_exit_code(error: &anyhow::Error) -> ExitCode {
    ExitCode::from_error(error.root_cause())
}

/// Converts the top-level application `Result` into a process exit code.
///
/// Errors are printed to stderr with their full cause chain before
/// mapping, so the caller's `main` only needs to return the result of
/// this function.
pub fn result_to_exit_code(result: anyhow::Result<()>) -> std::process::ExitCode {
    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(err) => {
            eprintln!("error: {err:#}");
            map_error_to_exit_code(&err).into()
        }
    }
}
