// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use super::Digest128;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The content fingerprint of a stage's implementation.
///
/// The original pipeline runner hashed a stage's Python source text to
/// detect implementation changes between runs. A compiled Rust stage has
/// no source text available at runtime, so stages instead expose
/// [`crate::descriptor::Stage::source_fingerprint`], conventionally the
/// bytes of `include_str!` on the stage's own source file, and this type
/// hashes those bytes down to a stable 128-bit digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceDigest(Digest128);

impl SourceDigest {
    pub fn of_fingerprint(fingerprint: &[u8]) -> Self {
        SourceDigest(Digest128::of(fingerprint))
    }

    pub fn as_digest(&self) -> &Digest128 {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl fmt::Debug for SourceDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceDigest({})", self.0.to_hex())
    }
}

impl fmt::Display for SourceDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}
