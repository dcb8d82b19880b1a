//! Model training module
//!
//! Provides the regression estimator capability and the training pipeline:
//! - [`Estimator`] trait with K-Nearest Neighbors and linear implementations
//! - [`ScaledRegressor`] pipeline that scales features before regression
//! - Seeded train/test splitting
//! - Held-out evaluation and fit classification
//! - Persisted model artifacts

mod config;
mod trainer;
pub mod artifact;
pub mod evaluation;
pub mod knn;
pub mod linear_models;
pub mod split;

pub use artifact::{ArtifactPaths, ModelArtifact};
pub use config::{ModelType, TrainingConfig};
pub use evaluation::{EvaluationReport, FitStatus, ModelEvaluator};
pub use knn::{DistanceMetric, KNNConfig, KNNRegressor, WeightScheme};
pub use linear_models::LinearRegression;
pub use split::{train_test_split, TrainTestSplit};
pub use trainer::{run_training, ModelTrainer, TrainingOutcome, TrainingRun};

use crate::error::Result;
use crate::preprocessing::{Scaler, ScalerType};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A regression estimator: fit on a feature matrix and target, then predict.
pub trait Estimator: Send + Sync {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// R² of the predictions for `x` against `y`
    fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let y_pred = self.predict(x)?;
        Ok(evaluation::r2_score(y, &y_pred))
    }
}

/// Enum to hold trained model variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    KNNRegressor(KNNRegressor),
    LinearRegression(LinearRegression),
}

impl TrainedModel {
    pub fn model_type(&self) -> ModelType {
        match self {
            TrainedModel::KNNRegressor(_) => ModelType::KNN,
            TrainedModel::LinearRegression(_) => ModelType::LinearRegression,
        }
    }
}

impl Estimator for TrainedModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            TrainedModel::KNNRegressor(m) => m.fit(x, y),
            TrainedModel::LinearRegression(m) => m.fit(x, y),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            TrainedModel::KNNRegressor(m) => m.predict(x),
            TrainedModel::LinearRegression(m) => m.predict(x),
        }
    }
}

/// Feature scaler followed by a regressor. Features arrive on heterogeneous
/// scales (square feet next to bedroom counts next to incomes) and are only
/// ever normalized here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaledRegressor {
    scaler: Scaler,
    model: TrainedModel,
}

impl ScaledRegressor {
    pub fn new(scaler_type: ScalerType, model: TrainedModel) -> Self {
        Self {
            scaler: Scaler::new(scaler_type),
            model,
        }
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    pub fn scaler_type(&self) -> ScalerType {
        self.scaler.scaler_type()
    }
}

impl Estimator for ScaledRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let scaled = self.scaler.fit_transform(x)?;
        self.model.fit(&scaled, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scaled = self.scaler.transform(x)?;
        self.model.predict(&scaled)
    }
}
