// /////////////////////////////////////////////////////////////////////////////
// Pipeline Runner RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use super::{Stage, StageDescriptor, StageHandle};
use crate::error::PipelineError;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves [`StageDescriptor`]s to concrete [`StageHandle`]s.
///
/// Three lookup tables participate, in precedence order: aliases (a name
/// substituted for another before anything else happens), external
/// overrides (a deployment- or run-specific replacement for a named
/// stage, e.g. a stub used in integration tests), and the base registry
/// of named stages.
#[derive(Default, Clone)]
pub struct StageRegistry {
    stages: HashMap<String, Arc<dyn Stage>>,
    aliases: HashMap<String, String>,
    external_overrides: HashMap<String, Arc<dyn Stage>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stage under its own [`Stage::name`].
    pub fn register(&mut self, stage: Arc<dyn Stage>) -> &mut Self {
        self.stages.insert(stage.name().to_string(), stage);
        self
    }

    /// Registers an alias: requests for `alias` resolve as if `target`
    /// had been requested instead.
    pub fn alias(&mut self, alias: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.aliases.insert(alias.into(), target.into());
        self
    }

    /// Overrides a named stage with a specific instance, taking
    /// precedence over the base registry for that name.
    pub fn override_external(&mut self, name: impl Into<String>, stage: Arc<dyn Stage>) -> &mut Self {
        self.external_overrides.insert(name.into(), stage);
        self
    }

    /// Resolves a descriptor to a concrete stage handle.
    pub fn resolve(&self, descriptor: &StageDescriptor) -> Result<StageHandle, PipelineError> {
        match descriptor {
            StageDescriptor::Instance(stage) => Ok(StageHandle::new(stage.clone())),
            StageDescriptor::Named(name) => {
                let resolved_name = self.aliases.get(name).unwrap_or(name);

                if let Some(stage) = self.external_overrides.get(resolved_name) {
                    return Ok(StageHandle::new(stage.clone()));
                }
                if let Some(stage) = self.stages.get(resolved_name) {
                    return Ok(StageHandle::new(stage.clone()));
                }
                if self.external_overrides.contains_key(name) {
                    return Err(PipelineError::MissingExternalOverride(name.clone()));
                }
                Err(PipelineError::UnknownDescriptor(name.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Artifact;
    use crate::configure::{ConfigureContext, ExecuteContext, ValidateContext};

    struct StubStage(&'static str);

    impl Stage for StubStage {
        fn name(&self) -> &str {
            self.0
        }

        fn source_fingerprint(&self) -> &[u8] {
            self.0.as_bytes()
        }

        fn configure(&self, _ctx: &mut dyn ConfigureContext) -> Result<(), PipelineError> {
            Ok(())
        }

        fn execute(&self, _ctx: &dyn ExecuteContext) -> Result<Artifact, PipelineError> {
            Ok(Artifact::empty())
        }
    }

    #[allow(dead_code)]
    fn unused_validate_context_type_check(_: &dyn ValidateContext) {}

    #[test]
    fn resolves_named_stage() {
        let mut registry = StageRegistry::new();
        registry.register(Arc::new(StubStage("a")));
        let handle = registry.resolve(&StageDescriptor::Named("a".into())).unwrap();
        assert_eq!(handle.name(), "a");
    }

    #[test]
    fn unknown_name_is_an_error() {
        let registry = StageRegistry::new();
        let err = registry.resolve(&StageDescriptor::Named("missing".into())).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownDescriptor(_)));
    }

    #[test]
    fn alias_substitutes_target() {
        let mut registry = StageRegistry::new();
        registry.register(Arc::new(StubStage("real")));
        registry.alias("alias_name", "real");
        let handle = registry.resolve(&StageDescriptor::Named("alias_name".into())).unwrap();
        assert_eq!(handle.name(), "real");
    }

    #[test]
    fn external_override_takes_precedence() {
        let mut registry = StageRegistry::new();
        registry.register(Arc::new(StubStage("a")));
        registry.override_external("a", Arc::new(StubStage("a-override")));
        let handle = registry.resolve(&StageDescriptor::Named("a".into())).unwrap();
        assert_eq!(handle.name(), "a-override");
    }

    #[test]
    fn instance_descriptor_bypasses_registry() {
        let registry = StageRegistry::new();
        let handle = registry
            .resolve(&StageDescriptor::Instance(Arc::new(StubStage("direct"))))
            .unwrap();
        assert_eq!(handle.name(), "direct");
    }
}
