//! Training orchestration

use std::path::PathBuf;

use tracing::{debug, info};

use super::{
    train_test_split, EvaluationReport, Estimator, KNNConfig, KNNRegressor, LinearRegression,
    ModelArtifact, ModelEvaluator, ModelType, ScaledRegressor, TrainTestSplit, TrainedModel,
    TrainingConfig,
};
use crate::data::{load_csv, DemographicsIndex, SchemaBuilder, TrainingFrame};
use crate::error::Result;

/// The fitted artifact and the partitions it was fitted and held out on
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub artifact: ModelArtifact,
    pub split: TrainTestSplit,
}

/// Result of the full train-evaluate-persist pipeline
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub report: EvaluationReport,
    pub output_dir: PathBuf,
    pub n_train: usize,
    pub n_test: usize,
}

/// Fits the configured estimator on a seeded training partition
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer {
    config: TrainingConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Unfitted scaler + regressor for the configured model type
    pub fn build_estimator(&self) -> ScaledRegressor {
        let model = match self.config.model_type {
            ModelType::KNN => TrainedModel::KNNRegressor(KNNRegressor::new(KNNConfig {
                n_neighbors: self.config.n_neighbors,
                metric: self.config.metric,
                weights: self.config.weights,
            })),
            ModelType::LinearRegression => {
                TrainedModel::LinearRegression(LinearRegression::new().with_alpha(self.config.reg_lambda))
            }
        };
        ScaledRegressor::new(self.config.scaler, model)
    }

    pub fn train(&self, frame: &TrainingFrame) -> Result<TrainingRun> {
        let split = train_test_split(
            &frame.features,
            &frame.target,
            self.config.test_size,
            self.config.random_state,
        )?;
        debug!(
            train = split.x_train.nrows(),
            test = split.x_test.nrows(),
            seed = self.config.random_state,
            "Split training frame"
        );

        let mut model = self.build_estimator();
        model.fit(&split.x_train, &split.y_train)?;
        info!(
            model_type = ?self.config.model_type,
            samples = split.x_train.nrows(),
            features = frame.schema.len(),
            "Fitted estimator"
        );

        Ok(TrainingRun {
            artifact: ModelArtifact::new(model, frame.schema.clone()),
            split,
        })
    }
}

/// Build the training frame from the configured CSVs, fit, evaluate on the
/// held-out partition and persist all three artifacts.
pub fn run_training(config: &TrainingConfig) -> Result<TrainingOutcome> {
    let sales = load_csv(&config.sales_path)?;
    let demographics = load_csv(&config.demographics_path)?;

    // Fails early on a demographics table that breaks zip uniqueness
    let index = DemographicsIndex::from_dataframe(&demographics)?;
    debug!(zipcodes = index.len(), "Demographics validated");

    let frame = SchemaBuilder::new().build(&sales, &demographics)?;
    let run = ModelTrainer::new(config.clone()).train(&frame)?;

    let split = &run.split;
    let report = ModelEvaluator::new().evaluate(
        run.artifact.model(),
        &split.x_train,
        &split.y_train,
        &split.x_test,
        &split.y_test,
    )?;
    info!(
        train_r2 = report.train_r2_score,
        test_r2 = report.test_r2_score,
        fit_status = %report.fit_status,
        "Evaluated model"
    );

    run.artifact.save_with_report(&config.output_dir, &report)?;

    Ok(TrainingOutcome {
        n_train: split.x_train.nrows(),
        n_test: split.x_test.nrows(),
        artifact: run.artifact,
        report,
        output_dir: config.output_dir.clone(),
    })
}
