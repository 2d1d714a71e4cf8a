// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use super::ConfigureContext;
use crate::config::ConfigTree;
use crate::descriptor::{StageDescriptor, StageRegistry};
use crate::error::PipelineError;
use crate::node::{DependencyEdge, ParameterizedNode};
use crate::registry::Registry;
use crate::value_objects::NodeHash;
use serde_json::Value;
use std::collections::HashMap;

/// A stage requested at the top level of a run, before any configuration
/// pass has started resolving its dependencies.
#[derive(Clone)]
pub struct RequestedStage {
    pub descriptor: StageDescriptor,
    pub local_config: Option<Value>,
    pub alias: Option<String>,
    pub ephemeral: bool,
}

impl RequestedStage {
    pub fn new(descriptor: impl Into<StageDescriptor>) -> Self {
        RequestedStage {
            descriptor: descriptor.into(),
            local_config: None,
            alias: None,
            ephemeral: false,
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.local_config = Some(config);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

/// The fully resolved output of a configure pass: every distinct node
/// reached, and the node hashes of the top-level requested stages (the
/// run's targets).
pub struct ConfiguredGraph {
    pub registry: Registry,
    pub roots: Vec<NodeHash>,
}

/// Drives stage resolution depth-first: resolving a requested stage's
/// descriptor, computing its node hash from the stage name and its fully
/// merged effective configuration, and — unless a node with that exact
/// hash has already been configured — invoking [`Stage::configure`] to
/// discover its dependencies and configuration requirements.
///
/// Because the node hash is computed from name and configuration alone
/// (not from anything `configure` produces), a previously seen hash can
/// be reused immediately without re-running `configure`, which both
/// deduplicates identical requests and detects cycles: a hash that
/// reappears while still on the current call stack is a cycle rather
/// than a legitimate repeat.
///
/// [`Stage::configure`]: crate::descriptor::Stage::configure
pub struct ConfigurePass<'r> {
    stage_registry: &'r StageRegistry,
}

struct DriverState {
    registry: Registry,
    stack: Vec<NodeHash>,
}

impl<'r> ConfigurePass<'r> {
    pub fn new(stage_registry: &'r StageRegistry) -> Self {
        ConfigurePass { stage_registry }
    }

    /// Runs the configure pass over the given top-level requests, using
    /// `base_config` as the inherited configuration for each of them.
    pub fn run(
        &self,
        base_config: &ConfigTree,
        requested: Vec<RequestedStage>,
    ) -> Result<ConfiguredGraph, PipelineError> {
        let mut state = DriverState {
            registry: Registry::new(),
            stack: Vec::new(),
        };

        let mut roots = Vec::with_capacity(requested.len());
        for request in requested {
            let effective_config = match &request.local_config {
                Some(value) => base_config.overlay(&ConfigTree::from_value(value.clone())),
                None => base_config.clone(),
            };
            let hash = self.configure_one(&mut state, &request.descriptor, effective_config, request.ephemeral)?;
            roots.push(hash);
        }

        Ok(ConfiguredGraph {
            registry: state.registry,
            roots,
        })
    }

    fn configure_one(
        &self,
        state: &mut DriverState,
        descriptor: &StageDescriptor,
        effective_config: ConfigTree,
        ephemeral: bool,
    ) -> Result<NodeHash, PipelineError> {
        let handle = self.stage_registry.resolve(descriptor)?;
        let node_hash = NodeHash::compute(handle.name(), &effective_config);

        if state.stack.contains(&node_hash) {
            return Err(PipelineError::Cycle(format!("{} ({node_hash})", handle.name())));
        }

        if state.registry.contains(&node_hash) {
            if !ephemeral {
                if let Some(existing) = state.registry.get_mut(&node_hash) {
                    existing.retain_non_ephemeral();
                }
            }
            return Ok(node_hash);
        }

        state.stack.push(node_hash);

        let (required_config_keys, dependencies, aliases) = {
            let mut ctx = ConfigureCtxImpl {
                pass: self,
                state,
                stage_name: handle.name().to_string(),
                effective_config: &effective_config,
                required_config_keys: Vec::new(),
                requested_defaults: HashMap::new(),
                dependencies: Vec::new(),
                aliases: HashMap::new(),
            };
            handle.stage().configure(&mut ctx)?;
            (ctx.required_config_keys, ctx.dependencies, ctx.aliases)
        };

        state.stack.pop();

        let node = ParameterizedNode::new(
            node_hash,
            handle,
            effective_config,
            required_config_keys,
            dependencies,
            aliases,
            ephemeral,
        );
        state.registry.insert(node);

        Ok(node_hash)
    }
}

struct ConfigureCtxImpl<'a, 'r> {
    pass: &'a ConfigurePass<'r>,
    state: &'a mut DriverState,
    stage_name: String,
    effective_config: &'a ConfigTree,
    required_config_keys: Vec<String>,
    requested_defaults: HashMap<String, Option<Value>>,
    dependencies: Vec<DependencyEdge>,
    aliases: HashMap<String, NodeHash>,
}

impl<'a, 'r> ConfigureContext for ConfigureCtxImpl<'a, 'r> {
    fn config(&mut self, key: &str, default: Option<Value>) -> Result<Value, PipelineError> {
        if let Some(previous_default) = self.requested_defaults.get(key) {
            if previous_default != &default {
                return Err(PipelineError::ConflictingDefault(key.to_string()));
            }
        } else {
            self.requested_defaults.insert(key.to_string(), default.clone());
            self.required_config_keys.push(key.to_string());
        }

        match self.effective_config.get(key) {
            Some(value) => Ok(value),
            None => default.ok_or_else(|| PipelineError::ConfigMissing {
                stage: self.stage_name.clone(),
                key: key.to_string(),
            }),
        }
    }

    fn stage(
        &mut self,
        descriptor: StageDescriptor,
        local_config: Option<Value>,
        alias: Option<String>,
        ephemeral: bool,
    ) -> Result<NodeHash, PipelineError> {
        if alias.is_some() && local_config.is_some() {
            return Err(PipelineError::AliasWithLocalConfig(format!("{descriptor:?}")));
        }

        let child_config = match &local_config {
            Some(value) => self.effective_config.overlay(&ConfigTree::from_value(value.clone())),
            None => self.effective_config.clone(),
        };

        let child_hash = self
            .pass
            .configure_one(&mut *self.state, &descriptor, child_config, ephemeral)?;

        if let Some(alias) = alias {
            self.aliases.insert(alias.clone(), child_hash);
            self.dependencies.push(DependencyEdge {
                node_hash: child_hash,
                alias: Some(alias),
                ephemeral,
            });
        } else {
            self.dependencies.push(DependencyEdge {
                node_hash: child_hash,
                alias: None,
                ephemeral,
            });
        }

        Ok(child_hash)
    }

    fn is_config_requested(&self, key: &str) -> bool {
        self.requested_defaults.contains_key(key)
    }
}
