//! # Backend Registry
//!
//! Name-keyed set of solving engines, in registration order.
//! Registration order decides which available backend is picked when
//! neither the caller nor the configuration names one.

use super::{AnyBackend, BackendDescriptor, Erased, IntervalBackend, SmtLibBackend, SolverBackend};
use crate::SolverError;
use crate::config::SolverConfig;
use std::fmt;
use std::sync::Arc;

/// Registered solving engines plus the configured default.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn AnyBackend>>,
    default: Option<String>,
}

impl BackendRegistry {
    /// Create an empty registry. Every selection fails until a backend is registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in adapters: `smtlib` first, then `interval`.
    #[must_use]
    pub fn with_defaults(config: &SolverConfig) -> Self {
        let mut registry = Self::new();
        registry.register(SmtLibBackend::new(config.smtlib.clone()));
        registry.register(IntervalBackend::new());
        registry.default.clone_from(&config.default_backend);
        registry
    }

    /// Register a backend. A backend with the same name is replaced in place.
    pub fn register<B: SolverBackend>(&mut self, backend: B) {
        let erased: Arc<dyn AnyBackend> = Arc::new(Erased(backend));
        match self
            .backends
            .iter_mut()
            .find(|b| b.name() == erased.name())
        {
            Some(slot) => *slot = erased,
            None => self.backends.push(erased),
        }
    }

    /// Name the backend used when a call does not choose one.
    pub fn set_default(&mut self, name: Option<&str>) {
        self.default = name.map(str::to_string);
    }

    /// Look up a backend by name, available or not.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn AnyBackend>> {
        self.backends.iter().find(|b| b.name() == name).cloned()
    }

    /// Registered names, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    /// Descriptors of every registered backend.
    #[must_use]
    pub fn list(&self) -> Vec<BackendDescriptor> {
        self.backends.iter().map(|b| b.descriptor()).collect()
    }

    /// Names of the backends that are available right now.
    #[must_use]
    pub fn available(&self) -> Vec<String> {
        self.backends
            .iter()
            .filter(|b| b.is_available())
            .map(|b| b.name().to_string())
            .collect()
    }

    /// The backend a call without an explicit choice would use.
    #[must_use]
    pub fn default_name(&self) -> Option<String> {
        match &self.default {
            Some(name) => Some(name.clone()),
            None => self
                .backends
                .iter()
                .find(|b| b.is_available())
                .map(|b| b.name().to_string()),
        }
    }

    /// Resolve the backend for a solve call.
    ///
    /// `requested` wins over the configured default, which wins over the
    /// first available backend. The result is always available.
    pub fn select(&self, requested: Option<&str>) -> Result<Arc<dyn AnyBackend>, SolverError> {
        let name = match requested.or(self.default.as_deref()) {
            Some(name) => name.to_string(),
            None => {
                return self
                    .backends
                    .iter()
                    .find(|b| b.is_available())
                    .cloned()
                    .ok_or_else(|| {
                        SolverError::BackendNotAvailable(if self.backends.is_empty() {
                            "no solver backend is registered".to_string()
                        } else {
                            format!(
                                "none of the registered backends is available ({})",
                                self.names().join(", ")
                            )
                        })
                    });
            }
        };

        let backend = self.get(&name).ok_or_else(|| {
            SolverError::BackendNotAvailable(format!("backend '{name}' is not registered"))
        })?;
        if !backend.is_available() {
            return Err(SolverError::BackendNotAvailable(format!(
                "backend '{name}' is registered but not available"
            )));
        }
        Ok(backend)
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.names())
            .field("default", &self.default)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
