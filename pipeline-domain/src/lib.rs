// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Domain
//!
//! Pure business logic for a reproducible, content-addressed stage
//! graph: resolving requested stages into a deduplicated dependency
//! graph, computing which nodes are stale since the last run, and
//! exposing the collaborator traits ([`repositories::CacheStore`],
//! [`repositories::WorkerPool`], [`repositories::ProgressReporter`]) that
//! the infrastructure and runtime layers implement.
//!
//! Nothing in this crate touches the filesystem, spawns a thread, or
//! prints to a terminal — those are runtime concerns layered on top.
//! Following Domain-Driven Design, this crate holds entities and value
//! objects ([`node`], [`value_objects`]), pure domain services
//! ([`configure`], [`graph`], [`invalidate`]), and repository-style
//! trait contracts ([`repositories`]) without depending on any of their
//! implementations.
//!
//! ## Example
//!
//! ```
//! use pipeline_domain::config::ConfigTree;
//! use pipeline_domain::configure::{ConfigurePass, RequestedStage};
//! use pipeline_domain::descriptor::StageRegistry;
//!
//! let stage_registry = StageRegistry::new();
//! let pass = ConfigurePass::new(&stage_registry);
//! let result = pass.run(&ConfigTree::empty(), Vec::<RequestedStage>::new());
//! assert!(result.is_ok());
//! ```

pub mod artifact;
pub mod config;
pub mod configure;
pub mod descriptor;
pub mod error;
pub mod graph;
pub mod invalidate;
pub mod node;
pub mod registry;
pub mod repositories;
pub mod value_objects;

pub use artifact::Artifact;
pub use config::ConfigTree;
pub use configure::{ConfiguredGraph, ConfigurePass, RequestedStage};
pub use descriptor::{Stage, StageDescriptor, StageHandle, StageRegistry};
pub use error::PipelineError;
pub use graph::ExecutionOrder;
pub use invalidate::{Invalidator, StaleReason, StalenessReport};
pub use node::{DependencyEdge, ParameterizedNode};
pub use registry::Registry;
pub use value_objects::{CacheId, Digest128, NodeHash, SourceDigest};
