//! Emitter registry.
//!
//! Central lookup for the available backends, keyed by format name. The
//! CLI registers its emitters here and resolves `--format` values through
//! it; format listings are sorted so output is stable.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::{EmitError, EmitResult, Emitter, OutputFile};
use crate::plan::Plan;

/// Registry for CI definition emitters.
#[derive(Default)]
pub struct EmitterRegistry {
    emitters: HashMap<&'static str, Arc<dyn Emitter>>,
}

impl EmitterRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            emitters: HashMap::new(),
        }
    }

    /// Register an emitter under its `format_name()`. An existing emitter
    /// with the same name is replaced.
    pub fn register(&mut self, emitter: impl Emitter + 'static) {
        let name = emitter.format_name();
        self.emitters.insert(name, Arc::new(emitter));
    }

    /// Register an Arc-wrapped emitter.
    pub fn register_arc(&mut self, emitter: Arc<dyn Emitter>) {
        let name = emitter.format_name();
        self.emitters.insert(name, emitter);
    }

    /// Get an emitter by format name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Emitter>> {
        self.emitters.get(name).cloned()
    }

    /// Check if an emitter is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.emitters.contains_key(name)
    }

    /// All registered format names, sorted.
    #[must_use]
    pub fn formats(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.emitters.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// All registered emitters, in format-name order.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<dyn Emitter>> {
        let mut emitters: Vec<_> = self.emitters.values().cloned().collect();
        emitters.sort_by_key(|e| e.format_name());
        emitters
    }

    /// Number of registered emitters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    /// Emit through the named format.
    ///
    /// # Errors
    /// Returns `EmitError::UnknownFormat` if the format is not registered,
    /// or the emitter's own error if emission fails.
    pub fn emit(&self, format: &str, plan: &Plan) -> EmitResult<Vec<OutputFile>> {
        let emitter = self.get(format).ok_or_else(|| EmitError::UnknownFormat {
            format: format.to_string(),
            available: self.formats().join(", "),
        })?;
        emitter.validate(plan)?;
        emitter.emit(plan)
    }

    /// Information about all registered emitters, sorted by format name.
    #[must_use]
    pub fn info(&self) -> Vec<EmitterInfo> {
        let mut infos: Vec<_> = self
            .emitters
            .values()
            .map(|e| EmitterInfo::from_emitter(e.as_ref()))
            .collect();
        infos.sort_by_key(|i| i.format);
        infos
    }
}

/// Information about a registered emitter.
#[derive(Debug, Clone, Serialize)]
pub struct EmitterInfo {
    /// Format name (CLI flag value).
    pub format: &'static str,
    /// Human-readable description.
    pub description: &'static str,
}

impl EmitterInfo {
    /// Create emitter info from an emitter.
    #[must_use]
    pub fn from_emitter(emitter: &dyn Emitter) -> Self {
        Self {
            format: emitter.format_name(),
            description: emitter.description(),
        }
    }
}

/// Builder for assembling a registry.
#[derive(Default)]
pub struct EmitterRegistryBuilder {
    registry: EmitterRegistry,
}

impl EmitterRegistryBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an emitter.
    #[must_use]
    pub fn with_emitter(mut self, emitter: impl Emitter + 'static) -> Self {
        self.registry.register(emitter);
        self
    }

    /// Build the registry.
    #[must_use]
    pub fn build(self) -> EmitterRegistry {
        self.registry
    }
}
