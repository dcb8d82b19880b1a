//! Data preprocessing module
//!
//! - Feature scaling applied inside the estimator pipeline
//! - Correlation-based ranking of candidate features

mod scaler;
pub mod feature_selection;

pub use scaler::{Scaler, ScalerType};
pub use feature_selection::{
    pearson_correlation, FeatureCorrelation, FeatureRanker, FeatureRecommendations,
    CURRENT_MODEL_FEATURES,
};
