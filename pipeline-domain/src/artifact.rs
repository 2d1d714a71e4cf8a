// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};

/// The opaque output of a stage's `execute`.
///
/// The domain does not interpret artifact contents; stages agree on
/// their own payload shape and serialize it into `bytes` (conventionally
/// with `bincode`, matching the rest of the pipeline's on-disk
/// serialization). `type_tag` is a short, stage-chosen label surfaced in
/// logs and flowchart exports so a human can tell artifacts apart
/// without deserializing them.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    type_tag: String,
    bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(type_tag: impl Into<String>, bytes: Vec<u8>) -> Self {
        Artifact {
            type_tag: type_tag.into(),
            bytes,
        }
    }

    /// An artifact carrying no payload, used by stages whose value lies
    /// entirely in side effects (e.g. writing to a working directory).
    pub fn empty() -> Self {
        Artifact {
            type_tag: "empty".to_string(),
            bytes: Vec::new(),
        }
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("type_tag", &self.type_tag)
            .field("len", &self.bytes.len())
            .finish()
    }
}
