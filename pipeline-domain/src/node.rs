// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::config::ConfigTree;
use crate::descriptor::StageHandle;
use crate::value_objects::NodeHash;
use std::collections::HashMap;

/// One dependency declared by a node during `configure`, in the order it
/// was requested.
#[derive(Debug, Clone)]
pub struct DependencyEdge {
    pub node_hash: NodeHash,
    pub alias: Option<String>,
    pub ephemeral: bool,
}

/// A stage resolved against a specific, fully merged effective
/// configuration — the unit the graph builder and invalidator operate
/// on.
///
/// Two `ParameterizedNode`s with the same [`NodeHash`] are always the
/// same node: the configure pass deduplicates by hash rather than by
/// object identity, so a stage requested twice with identical
/// configuration is configured and later executed exactly once.
#[derive(Debug, Clone)]
pub struct ParameterizedNode {
    node_hash: NodeHash,
    handle: StageHandle,
    effective_config: ConfigTree,
    required_config_keys: Vec<String>,
    dependencies: Vec<DependencyEdge>,
    aliases: HashMap<String, NodeHash>,
    ephemeral: bool,
}

impl ParameterizedNode {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        node_hash: NodeHash,
        handle: StageHandle,
        effective_config: ConfigTree,
        required_config_keys: Vec<String>,
        dependencies: Vec<DependencyEdge>,
        aliases: HashMap<String, NodeHash>,
        ephemeral: bool,
    ) -> Self {
        ParameterizedNode {
            node_hash,
            handle,
            effective_config,
            required_config_keys,
            dependencies,
            aliases,
            ephemeral,
        }
    }

    pub fn node_hash(&self) -> NodeHash {
        self.node_hash
    }

    pub fn handle(&self) -> &StageHandle {
        &self.handle
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn effective_config(&self) -> &ConfigTree {
        &self.effective_config
    }

    pub fn required_config_keys(&self) -> &[String] {
        &self.required_config_keys
    }

    pub fn dependencies(&self) -> &[DependencyEdge] {
        &self.dependencies
    }

    pub fn aliases(&self) -> &HashMap<String, NodeHash> {
        &self.aliases
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// Applies the ephemeral-flag retention rule: a node requested
    /// non-ephemeral by even one consumer is retained for the whole run,
    /// regardless of how many other consumers marked it ephemeral.
    pub fn retain_non_ephemeral(&mut self) {
        self.ephemeral = false;
    }
}
