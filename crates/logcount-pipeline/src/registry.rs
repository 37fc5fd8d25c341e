//! Plugin registry: maps plugin type names to constructors.
//!
//! The host looks plugins up by the `type` key of each filter entry. Plugins
//! themselves never touch the registry; [`PluginRegistry::with_builtins`]
//! does the wiring at startup.

use std::sync::Arc;

use dashmap::DashMap;

use logcount_core::error::{LogCountError, Result};

use crate::filters::{counter, LogCounterFilter};
use crate::plugin::Filter;

/// Constructor for a fresh, unconfigured filter instance.
pub type FilterFactory = Arc<dyn Fn() -> Arc<dyn Filter> + Send + Sync>;

#[derive(Default)]
pub struct PluginRegistry {
    filters: DashMap<String, FilterFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            filters: DashMap::new(),
        }
    }

    /// Registry with every built-in plugin registered.
    pub fn with_builtins() -> Self {
        let reg = Self::new();
        reg.register_filter(counter::PLUGIN_NAME, || Arc::new(LogCounterFilter::new()));
        reg
    }

    /// Register (or replace) a filter constructor.
    pub fn register_filter<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn Filter> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.filters.insert(name.clone(), Arc::new(factory)).is_some() {
            tracing::warn!(plugin = %name, "filter plugin registration replaced");
        }
    }

    pub fn registered_filters(&self) -> Vec<String> {
        let mut names: Vec<String> = self.filters.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn create_filter(&self, name: &str) -> Result<Arc<dyn Filter>> {
        let factory = self
            .filters
            .get(name)
            .ok_or_else(|| LogCountError::UnknownPlugin(name.to_string()))?
            .value()
            .clone();
        Ok(factory())
    }
}
