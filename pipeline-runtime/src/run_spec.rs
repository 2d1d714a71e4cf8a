// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use anyhow::{bail, Context, Result};
use pipeline_domain::configure::RequestedStage;
use pipeline_domain::descriptor::StageDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// One entry in a run specification's `stages` list: a stage requested
/// by name, with an optional per-edge configuration override, alias, and
/// ephemeral flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSpec {
    pub name: String,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub ephemeral: bool,
}

impl From<&StageSpec> for RequestedStage {
    fn from(spec: &StageSpec) -> Self {
        let mut requested = RequestedStage::new(StageDescriptor::Named(spec.name.clone()));
        if let Some(config) = &spec.config {
            requested = requested.with_config(config.clone());
        }
        if let Some(alias) = &spec.alias {
            requested = requested.with_alias(alias.clone());
        }
        if spec.ephemeral {
            requested = requested.ephemeral();
        }
        requested
    }
}

/// A declarative description of a pipeline run: which stages to target,
/// the base configuration they inherit, and the working directory to
/// cache artifacts under.
///
/// Deserialized from YAML or TOML; field names and defaults mirror the
/// original implementation's run configuration dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSpec {
    pub stages: Vec<StageSpec>,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub working_directory: Option<PathBuf>,
    #[serde(default)]
    pub rerun_required_targets: bool,
}

impl RunSpec {
    pub fn requested_stages(&self) -> Vec<RequestedStage> {
        self.stages.iter().map(RequestedStage::from).collect()
    }
}

/// Loads a [`RunSpec`] from `path`, dispatching on file extension
/// (`.yaml`/`.yml` for YAML, `.toml` for TOML). If `path` has no
/// extension recognized here, YAML is assumed first, falling back to
/// TOML on parse failure — this mirrors the CLI's own default-file
/// fallback from `pipeline.yaml` to `pipeline.toml`.
pub fn load_run_spec_from_file(path: impl AsRef<Path>) -> Result<RunSpec> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading run specification at {}", path.display()))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => {
            toml::from_str(&contents).with_context(|| format!("parsing TOML run specification at {}", path.display()))
        }
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing YAML run specification at {}", path.display())),
        _ => serde_yaml::from_str(&contents)
            .or_else(|_| toml::from_str(&contents))
            .with_context(|| format!("parsing run specification at {} as YAML or TOML", path.display())),
    }
}

/// Resolves the default run specification file in `dir`, preferring
/// `pipeline.yaml` and falling back to `pipeline.toml`.
pub fn default_run_spec_path(dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let yaml = dir.join("pipeline.yaml");
    if yaml.is_file() {
        return Ok(yaml);
    }
    let toml_path = dir.join("pipeline.toml");
    if toml_path.is_file() {
        return Ok(toml_path);
    }
    bail!(
        "no pipeline.yaml or pipeline.toml found in {}",
        dir.display()
    )
}
