//! OCR engine implementations
//!
//! This module contains implementations of the OcrEngine trait for different
//! OCR backends. Engines are conditionally compiled based on feature flags.

#[cfg(feature = "engine-ocrs")]
pub mod ocrs;

#[cfg(feature = "engine-leptess")]
pub mod leptess;

#[cfg(any(feature = "engine-ocrs", feature = "engine-leptess"))]
mod cache;

use crate::config::Config;
use crate::engine::OcrEngine;
use crate::error::ScanError;
use std::sync::Arc;

/// Registry of available OCR engines
pub struct EngineRegistry {
    engines: Vec<Arc<dyn OcrEngine>>,
}

impl EngineRegistry {
    /// Create a new engine registry with all available engines initialized
    #[cfg_attr(
        not(any(feature = "engine-ocrs", feature = "engine-leptess")),
        allow(unused_variables)
    )]
    pub fn new(config: &Config) -> Result<Self, ScanError> {
        #[allow(unused_mut)]
        let mut engines: Vec<Arc<dyn OcrEngine>> = Vec::new();

        #[cfg(feature = "engine-ocrs")]
        {
            tracing::info!("Initializing ocrs engine...");
            engines.push(Arc::new(ocrs::OcrsEngine::new(config)?));
        }

        #[cfg(feature = "engine-leptess")]
        {
            tracing::info!("Initializing leptess engine...");
            engines.push(Arc::new(leptess::LeptessEngine::new(config)?));
        }

        Self::from_engines(engines)
    }

    /// Registry over already constructed engines; the first one is the default
    pub fn from_engines(engines: Vec<Arc<dyn OcrEngine>>) -> Result<Self, ScanError> {
        if engines.is_empty() {
            return Err(ScanError::InitializationError(
                "No OCR engines available. Build with --features engine-ocrs or --features engine-leptess".to_string()
            ));
        }
        Ok(Self { engines })
    }

    /// Get an engine by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn OcrEngine>> {
        self.engines.iter().find(|e| e.name() == name).cloned()
    }

    /// List all available engine names
    pub fn list(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// Pick the engine for this deployment.
    ///
    /// An explicitly named engine must exist and is used as is. Otherwise the
    /// first engine that lists `language` wins; if none does, selection fails
    /// rather than reading the labels with the wrong script.
    pub fn select(
        &self,
        preferred: Option<&str>,
        language: &str,
    ) -> Result<Arc<dyn OcrEngine>, ScanError> {
        if let Some(name) = preferred {
            return self.get(name).ok_or_else(|| {
                ScanError::InitializationError(format!(
                    "Unknown OCR engine '{}' (available: {})",
                    name,
                    self.list().join(", ")
                ))
            });
        }

        if let Some(engine) = self
            .engines
            .iter()
            .find(|e| e.supported_languages().iter().any(|l| l == language))
        {
            return Ok(engine.clone());
        }

        Err(ScanError::InitializationError(format!(
            "No OCR engine supports language '{}' (available: {}). \
             Build with --features engine-leptess or pass --engine explicitly",
            language,
            self.list().join(", ")
        )))
    }
}
