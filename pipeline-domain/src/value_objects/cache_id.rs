// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use super::{Digest128, NodeHash, SourceDigest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The on-disk cache key for a node at a point in time.
///
/// A `CacheId` combines three independent reasons a cached artifact could
/// go stale: the node's own identity (stage + effective configuration),
/// the combined source fingerprint of the node and everything it
/// transitively depends on, and an externally supplied validation token
/// (e.g. a data-source revision) that lets a stage invalidate itself
/// without the pipeline author bumping its configuration.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheId {
    node_hash: NodeHash,
    source_closure: Digest128,
    validation_token: Digest128,
}

impl CacheId {
    /// Builds a cache id from a node hash, the source digests of the node
    /// and all of its ancestors (in any stable order), and an optional
    /// validation token.
    pub fn new<'a>(
        node_hash: NodeHash,
        ancestor_source_digests: impl IntoIterator<Item = &'a SourceDigest>,
        validation_token: Option<&str>,
    ) -> Self {
        let mut digests: Vec<Digest128> = ancestor_source_digests
            .into_iter()
            .map(|d| *d.as_digest())
            .collect();
        digests.sort();

        let mut parts: Vec<&[u8]> = Vec::with_capacity(digests.len());
        let encoded: Vec<[u8; 16]> = digests.iter().map(|d| *d.as_bytes()).collect();
        for bytes in &encoded {
            parts.push(bytes);
        }
        let source_closure = Digest128::of_parts(&parts);

        let validation_token = match validation_token {
            Some(token) => Digest128::of(token.as_bytes()),
            None => Digest128::of(b""),
        };

        CacheId {
            node_hash,
            source_closure,
            validation_token,
        }
    }

    /// Reconstructs a `CacheId` directly from its three components, e.g.
    /// when parsing one back out of an on-disk filename. Infrastructure
    /// should prefer [`CacheId::new`] when it has the original inputs;
    /// this is for the read path, where only the already-hashed
    /// components are available.
    pub fn from_parts(node_hash: NodeHash, source_closure: Digest128, validation_token: Digest128) -> Self {
        CacheId {
            node_hash,
            source_closure,
            validation_token,
        }
    }

    pub fn node_hash(&self) -> NodeHash {
        self.node_hash
    }

    pub fn source_closure(&self) -> Digest128 {
        self.source_closure
    }

    pub fn validation_token(&self) -> Digest128 {
        self.validation_token
    }

    /// Whether this id and `other` share the same node identity and
    /// source closure, ignoring the validation token. Used to detect
    /// "the node and its code are unchanged, only the external token
    /// moved" during invalidation.
    pub fn same_node_and_sources(&self, other: &CacheId) -> bool {
        self.node_hash == other.node_hash && self.source_closure == other.source_closure
    }

    /// The filename stem used for cache artifacts: `<node_hash>__<source_closure>__<validation_token>`.
    pub fn to_file_stem(&self) -> String {
        format!(
            "{}__{}__{}",
            self.node_hash.to_hex(),
            self.source_closure.to_hex(),
            self.validation_token.to_hex()
        )
    }
}

impl fmt::Debug for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheId({})", self.to_file_stem())
    }
}

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_file_stem())
    }
}
