//! Per-algorithm settings, read once before an algorithm first runs.
//!
//! A [`Settings`] view wraps one `[[algorithms]]` entry of the pipeline
//! config. Keys are looked up in its `settings` table; daughter entries are
//! turned into algorithm instances through the [`AlgorithmRegistry`].

use serde::de::DeserializeOwned;

use pfcontent_shared::{AlgorithmConfig, PfContentError, Result};

use crate::algorithm::{Algorithm, AlgorithmRegistry};

/// Read-only view of one algorithm's configuration.
pub struct Settings<'a> {
    config: &'a AlgorithmConfig,
    registry: &'a AlgorithmRegistry,
}

impl<'a> Settings<'a> {
    pub fn new(config: &'a AlgorithmConfig, registry: &'a AlgorithmRegistry) -> Self {
        Self { config, registry }
    }

    /// Type name of the configured algorithm.
    pub fn algorithm_type(&self) -> &str {
        &self.config.algorithm_type
    }

    /// Read a mandatory value.
    ///
    /// Missing keys fail with `NotFound`, values of the wrong type with
    /// `InvalidParameter`.
    pub fn read_value<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self.config.settings.get(key).ok_or_else(|| {
            PfContentError::not_found(format!(
                "setting '{key}' of {}",
                self.config.algorithm_type
            ))
        })?;

        value.clone().try_into().map_err(|e| {
            PfContentError::invalid_parameter(format!(
                "setting '{key}' of {}: {e}",
                self.config.algorithm_type
            ))
        })
    }

    /// Read an optional value; a missing key is `Ok(None)`.
    pub fn read_optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_value(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Build the daughter algorithm playing `description`.
    ///
    /// A daughter whose entry has no description matches when it is the only
    /// daughter configured.
    pub fn create_daughter(&self, description: &str) -> Result<Box<dyn Algorithm>> {
        let daughters = &self.config.daughters;
        let entry = daughters
            .iter()
            .find(|d| d.description.as_deref() == Some(description))
            .or_else(|| match daughters.as_slice() {
                [only] if only.description.is_none() => Some(only),
                _ => None,
            })
            .ok_or_else(|| {
                PfContentError::not_found(format!(
                    "daughter algorithm '{description}' of {}",
                    self.config.algorithm_type
                ))
            })?;

        self.registry.create(entry)
    }
}
