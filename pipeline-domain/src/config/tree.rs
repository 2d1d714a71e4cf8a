// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Dotted-path configuration tree with flatten/unflatten support.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A nested configuration tree addressed by dotted keys.
///
/// Internally backed by a `serde_json::Value`, since the domain already
/// depends on `serde_json` for canonical encoding and the teacher's
/// domain crate treats parameter serialization as a domain concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigTree(Value);

impl Default for ConfigTree {
    fn default() -> Self {
        Self::empty()
    }
}

impl ConfigTree {
    /// An empty configuration tree.
    pub fn empty() -> Self {
        ConfigTree(Value::Object(Map::new()))
    }

    /// Wraps an arbitrary JSON value as a configuration tree.
    pub fn from_value(value: Value) -> Self {
        ConfigTree(value)
    }

    /// Consumes the tree, returning the underlying JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Borrows the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// True if the tree contains the exact dotted path, or a path whose
    /// prefix equals the requested path (an internal subtree).
    pub fn has(&self, key: &str) -> bool {
        if navigate(&self.0, key).is_some() {
            return true;
        }
        let prefix = format!("{key}.");
        self.flatten().keys().any(|k| k.starts_with(&prefix))
    }

    /// Returns the leaf value if the exact path resolves; otherwise
    /// reconstructs a subtree from all descendant paths.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = navigate(&self.0, key) {
            return Some(value.clone());
        }

        let prefix = format!("{key}.");
        let descendants: BTreeMap<String, Value> = self
            .flatten()
            .into_iter()
            .filter_map(|(k, v)| k.strip_prefix(&prefix).map(|rest| (rest.to_string(), v)))
            .collect();

        if descendants.is_empty() {
            None
        } else {
            Some(Self::unflatten(&descendants).into_value())
        }
    }

    /// Flattens the tree into a single-level, deep-copied mapping from
    /// dotted path to leaf value. List elements are addressed by their
    /// decimal index.
    pub fn flatten(&self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        flatten_into(&self.0, &mut Vec::new(), &mut out);
        out
    }

    /// Reconstructs a tree from a flattened dotted-key mapping. Path
    /// segments composed entirely of decimal digits are reinterpreted
    /// as list indices.
    pub fn unflatten(flat: &BTreeMap<String, Value>) -> Self {
        let mut root = Value::Null;
        for (key, value) in flat {
            let segments: Vec<&str> = key.split('.').collect();
            set_path(&mut root, &segments, value.clone());
        }
        if root.is_null() {
            root = Value::Object(Map::new());
        }
        ConfigTree(root)
    }

    /// Overlays `other` on top of `self`, with `other`'s leaves taking
    /// precedence. Used to merge local per-edge overrides onto inherited
    /// configuration.
    pub fn overlay(&self, other: &ConfigTree) -> ConfigTree {
        let mut flat = self.flatten();
        for (key, value) in other.flatten() {
            flat.insert(key, value);
        }
        Self::unflatten(&flat)
    }
}

fn flatten_into(value: &Value, path: &mut Vec<String>, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                path.push(key.clone());
                flatten_into(child, path, out);
                path.pop();
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                path.push(index.to_string());
                flatten_into(child, path, out);
                path.pop();
            }
        }
        _ => {
            if !path.is_empty() {
                out.insert(path.join("."), value.clone());
            }
        }
    }
}

fn set_path(node: &mut Value, segments: &[&str], value: Value) {
    if segments.is_empty() {
        *node = value;
        return;
    }

    let (segment, rest) = (segments[0], &segments[1..]);

    if let Some(index) = parse_index(segment) {
        if !node.is_array() {
            *node = Value::Array(Vec::new());
        }
        let array = node.as_array_mut().expect("just coerced to array");
        while array.len() <= index {
            array.push(Value::Null);
        }
        set_path(&mut array[index], rest, value);
    } else {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let map = node.as_object_mut().expect("just coerced to object");
        let entry = map.entry(segment.to_string()).or_insert(Value::Null);
        set_path(entry, rest, value);
    }
}

fn parse_index(segment: &str) -> Option<usize> {
    if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
        segment.parse().ok()
    } else {
        None
    }
}

fn navigate<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in key.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
