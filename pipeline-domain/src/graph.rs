// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use crate::error::PipelineError;
use crate::registry::Registry;
use crate::value_objects::NodeHash;
use std::collections::{HashMap, HashSet};

/// A deterministic execution order over a configured [`Registry`].
///
/// Built with Kahn's algorithm over the dependency edges recorded by the
/// configure pass, breaking ties between equally-ready nodes by
/// lexicographic `NodeHash` order so that two runs over the same
/// registry always produce the same order, independent of `HashMap`
/// iteration order.
pub struct ExecutionOrder {
    order: Vec<NodeHash>,
}

impl ExecutionOrder {
    /// Computes the topological order of every node in `registry`.
    /// Returns [`PipelineError::Cycle`] if the dependency edges recorded
    /// during configure somehow describe a cycle (this should already
    /// have been rejected by the configure pass; this is a consistency
    /// check, not the primary cycle detector).
    pub fn compute(registry: &Registry) -> Result<Self, PipelineError> {
        let mut in_degree: HashMap<NodeHash, usize> = HashMap::new();
        let mut dependents: HashMap<NodeHash, Vec<NodeHash>> = HashMap::new();

        for (hash, node) in registry.iter() {
            in_degree.entry(*hash).or_insert(0);
            for edge in node.dependencies() {
                *in_degree.entry(*hash).or_insert(0) += 1;
                dependents.entry(edge.node_hash).or_default().push(*hash);
            }
        }

        // Sorted descending so `pop()` always removes the lexicographically
        // smallest ready node, giving a deterministic ascending tie-break.
        let mut ready: Vec<NodeHash> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(hash, _)| *hash)
            .collect();
        ready.sort_by(|a, b| b.cmp(a));

        let mut order = Vec::with_capacity(registry.len());
        let mut remaining = in_degree;

        while let Some(next) = ready.pop() {
            order.push(next);
            if let Some(children) = dependents.get(&next) {
                let mut newly_ready = Vec::new();
                for child in children {
                    let degree = remaining.get_mut(child).expect("dependent tracked in in_degree");
                    *degree -= 1;
                    if *degree == 0 {
                        newly_ready.push(*child);
                    }
                }
                ready.extend(newly_ready);
                ready.sort_by(|a, b| b.cmp(a));
            }
        }

        if order.len() != registry.len() {
            let unresolved: Vec<String> = registry
                .iter()
                .filter(|(hash, _)| !order.contains(hash))
                .map(|(hash, node)| format!("{} ({hash})", node.name()))
                .collect();
            return Err(PipelineError::Cycle(unresolved.join(", ")));
        }

        Ok(ExecutionOrder { order })
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &NodeHash> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Computes the transitive closure of ancestors (dependencies, direct and
/// indirect) for `targets` within `registry`: every node a target needs,
/// directly or not, in order to execute.
pub fn ancestor_closure(registry: &Registry, targets: &[NodeHash]) -> HashSet<NodeHash> {
    let mut seen = HashSet::new();
    let mut stack: Vec<NodeHash> = targets.to_vec();

    while let Some(hash) = stack.pop() {
        if !seen.insert(hash) {
            continue;
        }
        if let Some(node) = registry.get(&hash) {
            for edge in node.dependencies() {
                if !seen.contains(&edge.node_hash) {
                    stack.push(edge.node_hash);
                }
            }
        }
    }

    seen
}

/// Computes, for every node in `registry`, the set of nodes that
/// transitively depend on it (its descendants). Used by the invalidator
/// to propagate staleness downstream.
pub fn descendant_map(registry: &Registry) -> HashMap<NodeHash, HashSet<NodeHash>> {
    let mut direct_dependents: HashMap<NodeHash, Vec<NodeHash>> = HashMap::new();
    for (hash, node) in registry.iter() {
        for edge in node.dependencies() {
            direct_dependents.entry(edge.node_hash).or_default().push(*hash);
        }
    }

    let mut memo: HashMap<NodeHash, HashSet<NodeHash>> = HashMap::new();
    for hash in registry.iter().map(|(h, _)| *h).collect::<Vec<_>>() {
        collect_descendants(hash, &direct_dependents, &mut memo);
    }
    memo
}

fn collect_descendants(
    hash: NodeHash,
    direct_dependents: &HashMap<NodeHash, Vec<NodeHash>>,
    memo: &mut HashMap<NodeHash, HashSet<NodeHash>>,
) -> HashSet<NodeHash> {
    if let Some(cached) = memo.get(&hash) {
        return cached.clone();
    }
    // Insert an empty placeholder to guard against cycles (already
    // rejected upstream, but this keeps the recursion total regardless).
    memo.insert(hash, HashSet::new());

    let mut result = HashSet::new();
    if let Some(children) = direct_dependents.get(&hash) {
        for child in children {
            result.insert(*child);
            for grandchild in collect_descendants(*child, direct_dependents, memo) {
                result.insert(grandchild);
            }
        }
    }

    memo.insert(hash, result.clone());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigTree;
    use crate::descriptor::StageHandle;
    use crate::node::{DependencyEdge, ParameterizedNode};
    use crate::value_objects::NodeHash;
    use serde_json::json;
    use std::sync::Arc;

    struct NamedStage(&'static str);
    impl crate::descriptor::Stage for NamedStage {
        fn name(&self) -> &str {
            self.0
        }
        fn source_fingerprint(&self) -> &[u8] {
            self.0.as_bytes()
        }
        fn configure(&self, _ctx: &mut dyn crate::configure::ConfigureContext) -> Result<(), PipelineError> {
            Ok(())
        }
        fn execute(&self, _ctx: &dyn crate::configure::ExecuteContext) -> Result<crate::artifact::Artifact, PipelineError> {
            Ok(crate::artifact::Artifact::empty())
        }
    }

    fn node_with_deps(name: &'static str, deps: Vec<NodeHash>) -> (NodeHash, ParameterizedNode) {
        let handle = StageHandle::new(Arc::new(NamedStage(name)));
        let config = ConfigTree::from_value(json!({ "tag": name }));
        let hash = NodeHash::compute(name, &config);
        let edges = deps
            .into_iter()
            .map(|d| DependencyEdge { node_hash: d, alias: None, ephemeral: false })
            .collect();
        (hash, ParameterizedNode::new(hash, handle, config, Vec::new(), edges, Default::default(), false))
    }

    #[test]
    fn topological_order_respects_dependencies() {
        let (leaf_hash, leaf) = node_with_deps("leaf", vec![]);
        let (root_hash, root) = node_with_deps("root", vec![leaf_hash]);

        let mut registry = Registry::new();
        registry.insert(leaf);
        registry.insert(root);

        let order: Vec<NodeHash> = ExecutionOrder::compute(&registry).unwrap().iter().copied().collect();
        let leaf_pos = order.iter().position(|h| *h == leaf_hash).unwrap();
        let root_pos = order.iter().position(|h| *h == root_hash).unwrap();
        assert!(leaf_pos < root_pos);
    }

    #[test]
    fn ancestor_closure_includes_transitive_dependencies() {
        let (a_hash, a) = node_with_deps("a", vec![]);
        let (b_hash, b) = node_with_deps("b", vec![a_hash]);
        let (c_hash, c) = node_with_deps("c", vec![b_hash]);

        let mut registry = Registry::new();
        registry.insert(a);
        registry.insert(b);
        registry.insert(c);

        let closure = ancestor_closure(&registry, &[c_hash]);
        assert!(closure.contains(&a_hash));
        assert!(closure.contains(&b_hash));
        assert!(closure.contains(&c_hash));
    }

    #[test]
    fn descendant_map_tracks_downstream_consumers() {
        let (a_hash, a) = node_with_deps("a", vec![]);
        let (b_hash, b) = node_with_deps("b", vec![a_hash]);

        let mut registry = Registry::new();
        registry.insert(a);
        registry.insert(b);

        let map = descendant_map(&registry);
        assert!(map[&a_hash].contains(&b_hash));
    }
}
