//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::data::CORE_HOUSE_FEATURES;
use crate::inference::{PredictionResponse, PredictionVariant};

use super::error::{Result, ServerError};
use super::state::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "model_loaded": state.model_loaded(),
    }))
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>> {
    run_prediction(&state, PredictionVariant::Full, payload)
}

pub async fn predict_simple(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>> {
    run_prediction(&state, PredictionVariant::Simple, payload)
}

fn run_prediction(
    state: &AppState,
    variant: PredictionVariant,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>> {
    let Json(body) = payload.map_err(|rejection| {
        warn!(reason = %rejection.body_text(), "Rejected non-JSON prediction request");
        ServerError::BadRequest("Request must be JSON".to_string())
    })?;

    match state.service.predict(variant, &body) {
        Ok(response) => {
            info!(
                ?variant,
                zipcode = %response.zipcode,
                predicted_price = response.predicted_price,
                "Prediction served"
            );
            Ok(Json(response))
        }
        Err(err) => {
            if err.is_client_error() {
                warn!(?variant, error = %err, "Prediction request rejected");
            }
            Err(err.into())
        }
    }
}

pub async fn get_features(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "simple_endpoint_features": CORE_HOUSE_FEATURES,
        "model_features": state.service.model_features(),
        "note": "Demographics are automatically added based on zipcode",
    }))
}
