// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 128-bit content digest, truncated from a SHA-256 hash.
///
/// Every content-addressed identifier in the domain (source digests, node
/// hashes) is built on this single construction, so the domain only needs
/// one hashing dependency.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest128([u8; 16]);

impl Digest128 {
    /// Hashes the concatenation of the given byte slices.
    pub fn of_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        let full = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&full[..16]);
        Digest128(bytes)
    }

    /// Hashes a single byte slice.
    pub fn of(bytes: &[u8]) -> Self {
        Self::of_parts(&[bytes])
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let decoded = hex::decode(s)?;
        let mut bytes = [0u8; 16];
        if decoded.len() == 16 {
            bytes.copy_from_slice(&decoded);
        } else {
            // Shorter/longer hex is still accepted for forward compatibility
            // with externally supplied validation tokens; pad or truncate.
            let len = decoded.len().min(16);
            bytes[..len].copy_from_slice(&decoded[..len]);
        }
        Ok(Digest128(bytes))
    }
}

impl fmt::Debug for Digest128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest128({})", self.to_hex())
    }
}

impl fmt::Display for Digest128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
