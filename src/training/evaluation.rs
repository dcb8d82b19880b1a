//! Held-out evaluation and fit-quality classification

use std::fmt;
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::Estimator;
use crate::error::{RealtyError, Result};

/// Largest tolerated gap between train and test R² before a fit is overfitted
pub const OVERFIT_GAP: f64 = 0.1;

/// Smallest acceptable test R²
pub const MIN_TEST_R2: f64 = 0.6;

/// Qualitative generalization of a trained model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitStatus {
    Overfitted,
    Underfitted,
    #[serde(rename = "Good Fit")]
    GoodFit,
}

impl FitStatus {
    /// Rules apply in order: a gap above [`OVERFIT_GAP`] wins over a low test score.
    pub fn classify(train_r2: f64, test_r2: f64) -> Self {
        if train_r2 - test_r2 > OVERFIT_GAP {
            FitStatus::Overfitted
        } else if test_r2 < MIN_TEST_R2 {
            FitStatus::Underfitted
        } else {
            FitStatus::GoodFit
        }
    }
}

impl fmt::Display for FitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitStatus::Overfitted => write!(f, "Overfitted"),
            FitStatus::Underfitted => write!(f, "Underfitted"),
            FitStatus::GoodFit => write!(f, "Good Fit"),
        }
    }
}

/// Accuracy metrics of one training run. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub train_r2_score: f64,
    pub test_r2_score: f64,
    pub mean_absolute_error: f64,
    pub root_mean_squared_error: f64,
    pub mean_actual_price: f64,
    pub mean_predicted_price: f64,
    pub fit_status: FitStatus,
}

impl EvaluationReport {
    /// Train R² minus test R²
    pub fn generalization_gap(&self) -> f64 {
        self.train_r2_score - self.test_r2_score
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Coefficient of determination. A constant target scores 1 when predicted
/// exactly and 0 otherwise.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let y_mean = y_true.sum() / n;
    let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    }
}

pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len().max(1) as f64;
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / n
}

pub fn root_mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len().max(1) as f64;
    let mse = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / n;
    mse.sqrt()
}

/// Scores a fitted estimator on its training and test partitions
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelEvaluator;

impl ModelEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate<E: Estimator + ?Sized>(
        &self,
        model: &E,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Result<EvaluationReport> {
        if y_test.is_empty() {
            return Err(RealtyError::TrainingError("empty test partition".to_string()));
        }

        let train_r2_score = model.score(x_train, y_train)?;
        let y_pred = model.predict(x_test)?;
        let test_r2_score = r2_score(y_test, &y_pred);

        Ok(EvaluationReport {
            train_r2_score,
            test_r2_score,
            mean_absolute_error: mean_absolute_error(y_test, &y_pred),
            root_mean_squared_error: root_mean_squared_error(y_test, &y_pred),
            mean_actual_price: y_test.mean().unwrap_or(0.0),
            mean_predicted_price: y_pred.mean().unwrap_or(0.0),
            fit_status: FitStatus::classify(train_r2_score, test_r2_score),
        })
    }
}
