//! Serving-side inference
//!
//! - [`FeaturePreparer`] - lenient normalization of client attributes,
//!   demographic join and reindexing onto the training schema
//! - [`PredictionService`] - request validation and response shaping around
//!   the loaded [`ModelArtifact`](crate::training::ModelArtifact)

mod features;
mod service;

pub use features::{normalize_value, normalize_zipcode, FeaturePreparer, FeatureVector, NormalizedInput, NumericValue};
pub use service::{PredictionResponse, PredictionService, PredictionVariant, RequestStage, CURRENCY};
