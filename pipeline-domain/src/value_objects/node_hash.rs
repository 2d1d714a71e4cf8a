// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use super::Digest128;
use crate::config::ConfigTree;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a parameterized node: a stage name paired with its
/// effective, fully resolved configuration.
///
/// Two requests for the same stage with the same effective configuration
/// always produce the same `NodeHash`, regardless of the order in which
/// configuration keys were set or requested — the hash is computed over
/// the flattened, lexicographically sorted dotted-key encoding of the
/// configuration tree, not its literal nesting.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeHash(Digest128);

impl NodeHash {
    /// Computes the canonical hash for a stage name and its effective
    /// configuration.
    pub fn compute(stage_name: &str, effective_config: &ConfigTree) -> Self {
        let canonical = canonical_encoding(effective_config);
        NodeHash(Digest128::of_parts(&[stage_name.as_bytes(), canonical.as_bytes()]))
    }

    pub fn as_digest(&self) -> &Digest128 {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    /// Reconstructs a `NodeHash` from an already-computed digest, e.g.
    /// when parsing one back out of an on-disk filename.
    pub fn from_digest(digest: Digest128) -> Self {
        NodeHash(digest)
    }
}

/// Encodes a configuration tree as a sorted, dotted-key `key=value\n`
/// block so that two trees with identical effective contents but
/// different literal nesting or insertion order hash identically.
fn canonical_encoding(config: &ConfigTree) -> String {
    let flat = config.flatten();
    let mut out = String::new();
    for (key, value) in flat {
        out.push_str(&key);
        out.push('=');
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out
}

impl fmt::Debug for NodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeHash({})", self.0.to_hex())
    }
}

impl fmt::Display for NodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn same_stage_and_config_hash_equal() {
        let config = ConfigTree::from_value(json!({"a": 1, "b": 2}));
        let a = NodeHash::compute("stage_a", &config);
        let b = NodeHash::compute("stage_a", &config);
        assert_eq!(a, b);
    }

    #[test]
    fn config_key_insertion_order_does_not_matter() {
        let first = ConfigTree::from_value(json!({"a": 1, "b": 2}));
        let second = ConfigTree::from_value(json!({"b": 2, "a": 1}));
        assert_eq!(
            NodeHash::compute("stage_a", &first),
            NodeHash::compute("stage_a", &second)
        );
    }

    #[test]
    fn different_stage_names_hash_differently() {
        let config = ConfigTree::from_value(json!({"a": 1}));
        assert_ne!(
            NodeHash::compute("stage_a", &config),
            NodeHash::compute("stage_b", &config)
        );
    }

    #[test]
    fn different_config_values_hash_differently() {
        let a = ConfigTree::from_value(json!({"a": 1}));
        let b = ConfigTree::from_value(json!({"a": 2}));
        assert_ne!(NodeHash::compute("stage_a", &a), NodeHash::compute("stage_a", &b));
    }
}
