// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling with security-first design.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  1. parser::parse()                 │  Parse CLI with clap
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  2. validator::validate()           │  Security validation
//! └─────────────────┬───────────────────┘
//!                   ↓
//! ┌─────────────────────────────────────┐
//! │  3. ValidatedCli                    │  Safe, validated config
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `parser` - CLI structure and clap parsing
//! - `validator` - Security validation layer

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{ParseError, SecureArgParser};

use std::path::PathBuf;

/// Validated CLI configuration.
///
/// Holds all CLI arguments after security validation. Any path that must
/// already exist has been canonicalized; any free-form string has been
/// checked for shell metacharacters.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<PathBuf>,
}

/// Validated command variants, one per [`Commands`] subcommand.
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Run {
        spec: Option<PathBuf>,
        working_directory: Option<PathBuf>,
        dry_run: bool,
    },
    Flowchart {
        spec: Option<PathBuf>,
        out: PathBuf,
    },
}

/// Parses and validates CLI arguments in one step.
///
/// # Errors
///
/// Returns [`ParseError`] if any argument fails security validation.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parse_cli();
    validate_cli(cli)
}

/// Applies [`SecureArgParser`] checks to every argument in a parsed [`Cli`].
///
/// The run spec path, when given, must already exist and is canonicalized.
/// The working directory and flowchart output path are allowed not to
/// exist yet (the runner creates them), so only their string form is
/// checked for injection patterns.
fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let config = if let Some(ref path) = cli.config {
        SecureArgParser::validate_argument(&path.to_string_lossy())?;
        Some(path.clone())
    } else {
        None
    };

    let command = match cli.command {
        Commands::Run {
            spec,
            working_directory,
            dry_run,
        } => {
            let validated_spec = match spec {
                Some(path) => Some(SecureArgParser::validate_path(&path.to_string_lossy())?),
                None => None,
            };

            let validated_working_directory = match working_directory {
                Some(path) => {
                    SecureArgParser::validate_argument(&path.to_string_lossy())?;
                    Some(path)
                }
                None => None,
            };

            ValidatedCommand::Run {
                spec: validated_spec,
                working_directory: validated_working_directory,
                dry_run,
            }
        }
        Commands::Flowchart { spec, out } => {
            let validated_spec = match spec {
                Some(path) => Some(SecureArgParser::validate_path(&path.to_string_lossy())?),
                None => None,
            };

            SecureArgParser::validate_argument(&out.to_string_lossy())?;

            ValidatedCommand::Flowchart {
                spec: validated_spec,
                out,
            }
        }
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn validates_run_with_no_arguments() {
        let cli = Cli::parse_from(["pipeline", "run"]);
        let validated = validate_cli(cli).unwrap();
        assert!(!validated.verbose);
        match validated.command {
            ValidatedCommand::Run { spec, working_directory, dry_run } => {
                assert!(spec.is_none());
                assert!(working_directory.is_none());
                assert!(!dry_run);
            }
            _ => panic!("expected Run"),
        }
    }

    #[test]
    fn rejects_spec_path_that_does_not_exist() {
        let cli = Cli::parse_from(["pipeline", "run", "/no/such/run.yml"]);
        assert!(validate_cli(cli).is_err());
    }

    #[test]
    fn validates_existing_spec_path() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = dir.path().join("run.yml");
        std::fs::write(&spec_path, "stages: []").unwrap();

        let cli = Cli::parse_from(["pipeline", "run", spec_path.to_str().unwrap()]);
        let validated = validate_cli(cli).unwrap();
        match validated.command {
            ValidatedCommand::Run { spec, .. } => {
                assert_eq!(spec.unwrap(), spec_path.canonicalize().unwrap());
            }
            _ => panic!("expected Run"),
        }
    }

    #[test]
    fn validates_flowchart_output_path() {
        let cli = Cli::parse_from(["pipeline", "flowchart", "--out", "graph.json"]);
        let validated = validate_cli(cli).unwrap();
        match validated.command {
            ValidatedCommand::Flowchart { out, .. } => assert_eq!(out, PathBuf::from("graph.json")),
            _ => panic!("expected Flowchart"),
        }
    }
}
