// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stage Resolution
//!
//! A stage is requested either by name, through a [`StageRegistry`], or
//! directly as a shared instance. This module defines that distinction
//! ([`StageDescriptor`]), the [`Stage`] trait implemented by every pipeline
//! stage, the [`StageHandle`] bundle of a resolved stage plus its source
//! digest, and the [`StageRegistry`] that performs name and alias lookup.

mod registry;
mod stage;

pub use registry::StageRegistry;
pub use stage::{Stage, StageHandle};

use std::sync::Arc;

/// How a stage was requested.
///
/// The original implementation resolved stages dynamically from dotted
/// Python module paths or class objects. Rust has no equivalent runtime
/// introspection, so a descriptor collapses to exactly two cases: a name
/// looked up through the registry, or a concrete instance handed over
/// directly (e.g. a stage constructed with captured state that has no
/// meaningful "name").
#[derive(Clone)]
pub enum StageDescriptor {
    /// Resolve by name through the active [`StageRegistry`], including its
    /// alias and external-override maps.
    Named(String),
    /// Use this exact stage instance; still participates in hashing and
    /// caching under the name it reports from [`Stage::name`].
    Instance(Arc<dyn Stage>),
}

impl std::fmt::Debug for StageDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageDescriptor::Named(name) => write!(f, "StageDescriptor::Named({name:?})"),
            StageDescriptor::Instance(stage) => {
                write!(f, "StageDescriptor::Instance({:?})", stage.name())
            }
        }
    }
}

impl From<&str> for StageDescriptor {
    fn from(name: &str) -> Self {
        StageDescriptor::Named(name.to_string())
    }
}

impl From<String> for StageDescriptor {
    fn from(name: String) -> Self {
        StageDescriptor::Named(name)
    }
}

impl From<Arc<dyn Stage>> for StageDescriptor {
    fn from(stage: Arc<dyn Stage>) -> Self {
        StageDescriptor::Instance(stage)
    }
}
