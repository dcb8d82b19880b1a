//! Persisted model artifacts
//!
//! A training run writes three files into one directory:
//! `model.json` (the fitted [`ScaledRegressor`]), `model_features.json` (the
//! ordered [`FeatureSchema`]) and `model_evaluation.json`.

use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{EvaluationReport, Estimator, ScaledRegressor};
use crate::data::FeatureSchema;
use crate::error::{RealtyError, Result};

pub const MODEL_FILE: &str = "model.json";
pub const FEATURES_FILE: &str = "model_features.json";
pub const EVALUATION_FILE: &str = "model_evaluation.json";

/// File locations inside an artifact directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub features: PathBuf,
    pub evaluation: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join(MODEL_FILE),
            features: dir.join(FEATURES_FILE),
            evaluation: dir.join(EVALUATION_FILE),
        }
    }
}

/// A fitted estimator together with the schema it was trained against.
/// Read-only once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    model: ScaledRegressor,
    schema: FeatureSchema,
}

impl ModelArtifact {
    pub fn new(model: ScaledRegressor, schema: FeatureSchema) -> Self {
        Self { model, schema }
    }

    pub fn model(&self) -> &ScaledRegressor {
        &self.model
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Predict for rows already aligned to the schema
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.schema.len() {
            return Err(RealtyError::ShapeError {
                expected: format!("{} features", self.schema.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        self.model.predict(x)
    }

    /// Write `model.json` and `model_features.json`, creating `dir` if needed
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<ArtifactPaths> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let paths = ArtifactPaths::new(dir);

        let json = serde_json::to_string(&self.model)?;
        std::fs::write(&paths.model, json)?;
        self.schema.save(&paths.features)?;

        info!(dir = %dir.display(), features = self.schema.len(), "Saved model artifact");
        Ok(paths)
    }

    /// Save the artifact and its evaluation report side by side
    pub fn save_with_report(&self, dir: impl AsRef<Path>, report: &EvaluationReport) -> Result<ArtifactPaths> {
        let paths = self.save(dir)?;
        report.save(&paths.evaluation)?;
        Ok(paths)
    }

    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let paths = ArtifactPaths::new(dir);
        for path in [&paths.model, &paths.features] {
            if !path.exists() {
                return Err(RealtyError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} does not exist", path.display()),
                )));
            }
        }

        let json = std::fs::read_to_string(&paths.model)?;
        let model: ScaledRegressor = serde_json::from_str(&json)?;
        let schema = FeatureSchema::load(&paths.features)?;

        info!(
            dir = %dir.display(),
            model_type = ?model.model().model_type(),
            features = schema.len(),
            "Loaded model artifact"
        );
        Ok(Self { model, schema })
    }
}
