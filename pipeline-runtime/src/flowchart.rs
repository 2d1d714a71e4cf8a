// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use pipeline_domain::registry::Registry;
use pipeline_domain::value_objects::NodeHash;
use serde::Serialize;
use std::collections::HashMap;

/// One node in a flowchart export: its name, hash, and whether it was
/// found stale the last time an invalidator ran over it.
#[derive(Debug, Serialize)]
pub struct FlowchartNode {
    pub id: String,
    pub name: String,
    pub ephemeral: bool,
    pub stale: Option<bool>,
}

/// One dependency edge in a flowchart export.
#[derive(Debug, Serialize)]
pub struct FlowchartLink {
    pub source: String,
    pub target: String,
    pub alias: Option<String>,
}

/// A node-link document describing a configured graph, suitable for
/// rendering with any off-the-shelf graph visualization tool.
#[derive(Debug, Serialize)]
pub struct Flowchart {
    pub nodes: Vec<FlowchartNode>,
    pub links: Vec<FlowchartLink>,
}

impl Flowchart {
    /// Builds a flowchart from a configured registry. `stale` is an
    /// optional staleness map (as produced by
    /// [`pipeline_domain::invalidate::Invalidator`]) used to annotate
    /// each node; pass an empty map to omit staleness annotations.
    pub fn from_registry(registry: &Registry, stale: &HashMap<NodeHash, bool>) -> Self {
        let mut nodes = Vec::with_capacity(registry.len());
        let mut links = Vec::new();

        for (hash, node) in registry.iter() {
            nodes.push(FlowchartNode {
                id: hash.to_hex(),
                name: node.name().to_string(),
                ephemeral: node.is_ephemeral(),
                stale: stale.get(hash).copied(),
            });

            for edge in node.dependencies() {
                links.push(FlowchartLink {
                    source: edge.node_hash.to_hex(),
                    target: hash.to_hex(),
                    alias: edge.alias.clone(),
                });
            }
        }

        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        links.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));

        Flowchart { nodes, links }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
