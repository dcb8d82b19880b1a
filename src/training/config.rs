//! Training configuration

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::knn::{DistanceMetric, WeightScheme};
use crate::error::RealtyError;
use crate::preprocessing::ScalerType;

/// Regression estimator to fit behind the scaler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModelType {
    /// K-Nearest Neighbors
    KNN,
    /// Ordinary least squares
    LinearRegression,
}

impl Default for ModelType {
    fn default() -> Self {
        Self::KNN
    }
}

impl FromStr for ModelType {
    type Err = RealtyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "knn" | "k_nearest_neighbors" => Ok(ModelType::KNN),
            "linear" | "linear_regression" => Ok(ModelType::LinearRegression),
            other => Err(RealtyError::InvalidParameter {
                name: "model".to_string(),
                value: other.to_string(),
                reason: "expected one of: knn, linear".to_string(),
            }),
        }
    }
}

/// Configuration for one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Raw sale records
    pub sales_path: PathBuf,
    /// Zip-code demographics
    pub demographics_path: PathBuf,
    /// Where model, schema and evaluation artifacts are written
    pub output_dir: PathBuf,

    pub model_type: ModelType,
    pub scaler: ScalerType,
    /// Neighbours for KNN
    pub n_neighbors: usize,
    pub metric: DistanceMetric,
    pub weights: WeightScheme,
    /// L2 penalty for linear regression
    pub reg_lambda: f64,

    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the train/test shuffle
    pub random_state: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            sales_path: PathBuf::from("data/kc_house_data.csv"),
            demographics_path: PathBuf::from("data/zipcode_demographics.csv"),
            output_dir: PathBuf::from("model"),
            model_type: ModelType::KNN,
            scaler: ScalerType::Robust,
            n_neighbors: 5,
            metric: DistanceMetric::Euclidean,
            weights: WeightScheme::Uniform,
            reg_lambda: 0.0,
            test_size: 0.25,
            random_state: 42,
        }
    }
}

impl TrainingConfig {
    pub fn new(sales_path: impl Into<PathBuf>, demographics_path: impl Into<PathBuf>) -> Self {
        Self {
            sales_path: sales_path.into(),
            demographics_path: demographics_path.into(),
            ..Default::default()
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_model(mut self, model_type: ModelType) -> Self {
        self.model_type = model_type;
        self
    }

    pub fn with_scaler(mut self, scaler: ScalerType) -> Self {
        self.scaler = scaler;
        self
    }

    pub fn with_n_neighbors(mut self, k: usize) -> Self {
        self.n_neighbors = k;
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_weights(mut self, weights: WeightScheme) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrainingConfig::default();
        assert_eq!(config.test_size, 0.25);
        assert_eq!(config.random_state, 42);
        assert_eq!(config.n_neighbors, 5);
        assert_eq!(config.model_type, ModelType::KNN);
        assert_eq!(config.scaler, ScalerType::Robust);
        assert_eq!(config.metric, DistanceMetric::Euclidean);
        assert_eq!(config.weights, WeightScheme::Uniform);
    }

    #[test]
    fn test_builder_pattern() {
        let config = TrainingConfig::new("sales.csv", "demo.csv")
            .with_model(ModelType::LinearRegression)
            .with_test_size(0.3)
            .with_random_state(7)
            .with_output_dir("out")
            .with_scaler(ScalerType::MinMax)
            .with_metric(DistanceMetric::Manhattan)
            .with_weights(WeightScheme::Distance);

        assert_eq!(config.sales_path, PathBuf::from("sales.csv"));
        assert_eq!(config.model_type, ModelType::LinearRegression);
        assert_eq!(config.test_size, 0.3);
        assert_eq!(config.random_state, 7);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.scaler, ScalerType::MinMax);
        assert_eq!(config.metric, DistanceMetric::Manhattan);
        assert_eq!(config.weights, WeightScheme::Distance);
    }

    #[test]
    fn test_model_type_from_str() {
        assert_eq!("knn".parse::<ModelType>().unwrap(), ModelType::KNN);
        assert_eq!("Linear".parse::<ModelType>().unwrap(), ModelType::LinearRegression);
        assert!("random_forest".parse::<ModelType>().is_err());
    }
}
