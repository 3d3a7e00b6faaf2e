//! Algorithm trait and the registry that builds configured algorithms.

use std::collections::BTreeMap;

use tracing::debug;

use pfcontent_shared::{AlgorithmConfig, PfContentError, Result};

use crate::algorithms::{
    AccessListsAlgorithm, CreateClustersAlgorithm, CreateClustersDaughterAlgorithm,
};
use crate::content::EventContent;
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A reconstruction step run against one event's content.
///
/// Settings are read once, before the first run. `run` is invoked through
/// [`EventContent::run_algorithm`], which wraps it in an algorithm scope.
pub trait Algorithm: Send {
    /// Registered type name, used in config files and for tracing.
    fn type_name(&self) -> &'static str;

    /// Read this algorithm's settings.
    fn read_settings(&mut self, settings: &Settings<'_>) -> Result<()>;

    /// Process the current event.
    fn run(&mut self, content: &mut EventContent) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Constructor for a fresh, unconfigured algorithm.
pub type AlgorithmFactory = fn() -> Box<dyn Algorithm>;

/// Maps algorithm type names to factories.
pub struct AlgorithmRegistry {
    factories: BTreeMap<&'static str, AlgorithmFactory>,
}

impl AlgorithmRegistry {
    /// Create a registry with all built-in algorithms.
    pub fn new() -> Self {
        let mut factories: BTreeMap<&'static str, AlgorithmFactory> = BTreeMap::new();
        factories.insert(AccessListsAlgorithm::TYPE_NAME, || {
            Box::new(AccessListsAlgorithm::default())
        });
        factories.insert(CreateClustersAlgorithm::TYPE_NAME, || {
            Box::new(CreateClustersAlgorithm::default())
        });
        factories.insert(CreateClustersDaughterAlgorithm::TYPE_NAME, || {
            Box::new(CreateClustersDaughterAlgorithm::default())
        });
        Self { factories }
    }

    /// Register an additional algorithm type.
    pub fn register(&mut self, type_name: &'static str, factory: AlgorithmFactory) -> Result<()> {
        if self.factories.contains_key(type_name) {
            return Err(PfContentError::already_present(format!(
                "algorithm type '{type_name}'"
            )));
        }
        self.factories.insert(type_name, factory);
        Ok(())
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Build an algorithm from its config entry and read its settings.
    pub fn create(&self, config: &AlgorithmConfig) -> Result<Box<dyn Algorithm>> {
        let factory = self
            .factories
            .get(config.algorithm_type.as_str())
            .ok_or_else(|| {
                PfContentError::not_found(format!("algorithm type '{}'", config.algorithm_type))
            })?;

        let mut algorithm = factory();
        algorithm.read_settings(&Settings::new(config, self))?;
        debug!(algorithm = algorithm.type_name(), "algorithm configured");
        Ok(algorithm)
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}
