//! Application state shared across handlers

use crate::error::Result;
use crate::inference::PredictionService;

use super::ServerConfig;

/// Built once at startup and never mutated, so handlers share it without
/// locking.
#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,
    pub service: PredictionService,
}

impl AppState {
    pub fn new(config: ServerConfig, service: PredictionService) -> Self {
        Self { config, service }
    }

    /// Load the model artifact and demographics named by `config`
    pub fn load(config: ServerConfig) -> Result<Self> {
        let service = PredictionService::load(&config.model_dir, &config.demographics_path)?;
        Ok(Self::new(config, service))
    }

    pub fn model_loaded(&self) -> bool {
        !self.service.model_features().is_empty()
    }
}
