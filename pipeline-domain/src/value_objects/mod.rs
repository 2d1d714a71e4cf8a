// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Value Objects
//!
//! Immutable, content-addressed identifiers used throughout resolution,
//! configuration, and invalidation: [`Digest128`] (the common 128-bit
//! digest shape), [`SourceDigest`] (a stage's source fingerprint),
//! [`NodeHash`] (identity of a `(stage, effective configuration)` pair),
//! and [`CacheId`] (the on-disk cache key for a node at a point in time).

mod cache_id;
mod digest;
mod node_hash;
mod source_digest;

pub use cache_id::CacheId;
pub use digest::Digest128;
pub use node_hash::NodeHash;
pub use source_digest::SourceDigest;
