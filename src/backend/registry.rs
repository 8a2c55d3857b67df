//! Static registry of backend factories

use crate::backend::plugin::{ProviderBackend, ProviderMethod};
use crate::core::{LocationError, LocationResult};
use std::collections::HashMap;

/// Builds a fresh backend instance
pub type BackendFactory = Box<dyn Fn() -> LocationResult<Box<dyn ProviderBackend>>>;

/// Maps each positioning method to the factory that builds its backend.
/// Populated explicitly at startup.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<ProviderMethod, BackendFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for `method`, replacing any previous one.
    /// Hybrid is composed from the others and cannot be registered.
    pub fn register(&mut self, method: ProviderMethod, factory: BackendFactory) -> LocationResult<()> {
        if method == ProviderMethod::Hybrid {
            return Err(LocationError::Parameter);
        }
        if self.factories.insert(method, factory).is_some() {
            tracing::debug!(method = %method, "Backend factory replaced");
        }
        Ok(())
    }

    /// Whether `method` can be built. Hybrid needs GPS or WPS.
    pub fn supports(&self, method: ProviderMethod) -> bool {
        match method {
            ProviderMethod::Hybrid => {
                self.factories.contains_key(&ProviderMethod::Gps)
                    || self.factories.contains_key(&ProviderMethod::Wps)
            }
            _ => self.factories.contains_key(&method),
        }
    }

    pub fn create(&self, method: ProviderMethod) -> LocationResult<Box<dyn ProviderBackend>> {
        let factory = self.factories.get(&method).ok_or(LocationError::NotSupported)?;
        factory()
    }

    pub fn methods(&self) -> Vec<ProviderMethod> {
        let mut methods: Vec<ProviderMethod> = self.factories.keys().copied().collect();
        methods.sort_by_key(|m| m.name());
        methods
    }
}
