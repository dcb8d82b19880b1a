//! Request orchestration for price predictions

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::FeaturePreparer;
use crate::data::{DemographicsIndex, FeatureSchema, CORE_HOUSE_FEATURES, ZIPCODE_COLUMN};
use crate::error::{RealtyError, Result};
use crate::training::ModelArtifact;

pub const CURRENCY: &str = "USD";

/// Which contract a prediction request is held to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionVariant {
    /// Only the zip code is required; other attributes default to 0
    Full,
    /// All core house attributes are required; anything else is ignored
    Simple,
}

impl PredictionVariant {
    fn endpoint(self) -> Option<&'static str> {
        match self {
            PredictionVariant::Full => None,
            PredictionVariant::Simple => Some("simple"),
        }
    }
}

/// Progress of one request, recorded in traces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStage {
    Received,
    Validated,
    Prepared,
    Predicted,
    Responded,
}

impl fmt::Display for RequestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestStage::Received => "received",
            RequestStage::Validated => "validated",
            RequestStage::Prepared => "prepared",
            RequestStage::Predicted => "predicted",
            RequestStage::Responded => "responded",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    pub predicted_price: f64,
    pub currency: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<&'static str>,
    /// The zip code exactly as the client sent it
    pub zipcode: Value,
    pub status: &'static str,
}

/// Validates requests, prepares features and runs the estimator. Holds only
/// read-only state, so one instance serves all requests concurrently.
#[derive(Debug, Clone)]
pub struct PredictionService {
    preparer: FeaturePreparer,
    artifact: ModelArtifact,
}

impl PredictionService {
    pub fn new(artifact: ModelArtifact, demographics: Arc<DemographicsIndex>) -> Self {
        let preparer = FeaturePreparer::new(artifact.schema().clone(), demographics);
        Self { preparer, artifact }
    }

    /// Load the model artifact directory and the demographics CSV
    pub fn load(model_dir: impl AsRef<Path>, demographics_path: impl AsRef<Path>) -> Result<Self> {
        let artifact = ModelArtifact::load(model_dir)?;
        let demographics = DemographicsIndex::from_csv(demographics_path)?;
        Ok(Self::new(artifact, Arc::new(demographics)))
    }

    pub fn model_features(&self) -> &FeatureSchema {
        self.artifact.schema()
    }

    pub fn preparer(&self) -> &FeaturePreparer {
        &self.preparer
    }

    pub fn predict(&self, variant: PredictionVariant, body: &Value) -> Result<PredictionResponse> {
        debug!(stage = %RequestStage::Received, ?variant);
        let input = body
            .as_object()
            .ok_or_else(|| RealtyError::InvalidRequest("Request body must be a JSON object".to_string()))?;

        let input = self.validate(variant, input)?;
        debug!(stage = %RequestStage::Validated);

        let features = self.preparer.prepare(&input)?;
        debug!(stage = %RequestStage::Prepared, features = features.len());

        let predicted_price = self
            .artifact
            .predict(&features.to_row())?
            .first()
            .copied()
            .ok_or_else(|| RealtyError::DataError("estimator returned no prediction".to_string()))?;
        debug!(stage = %RequestStage::Predicted, predicted_price);

        let response = PredictionResponse {
            predicted_price,
            currency: CURRENCY,
            endpoint: variant.endpoint(),
            zipcode: input.get(ZIPCODE_COLUMN).cloned().unwrap_or(Value::Null),
            status: "success",
        };
        debug!(stage = %RequestStage::Responded);
        Ok(response)
    }

    fn validate(&self, variant: PredictionVariant, input: &Map<String, Value>) -> Result<Map<String, Value>> {
        match variant {
            PredictionVariant::Full => {
                if !input.contains_key(ZIPCODE_COLUMN) {
                    return Err(RealtyError::MissingField(ZIPCODE_COLUMN.to_string()));
                }
                Ok(input.clone())
            }
            PredictionVariant::Simple => {
                let missing: Vec<String> = CORE_HOUSE_FEATURES
                    .iter()
                    .filter(|field| !input.contains_key(**field))
                    .map(|field| field.to_string())
                    .collect();
                if !missing.is_empty() {
                    return Err(RealtyError::MissingFields(missing));
                }
                Ok(CORE_HOUSE_FEATURES
                    .iter()
                    .filter_map(|field| input.get(*field).map(|v| (field.to_string(), v.clone())))
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::ScalerType;
    use crate::training::{Estimator, LinearRegression, ScaledRegressor, TrainedModel};
    use ndarray::array;
    use serde_json::json;

    /// price = 100 * sqft_living + ppltn_qty
    fn service() -> PredictionService {
        let schema = FeatureSchema::new(vec!["sqft_living".into(), "ppltn_qty".into()]).unwrap();
        let x = array![[1000.0, 10.0], [2000.0, 30.0], [1500.0, 20.0], [3000.0, 5.0]];
        let y: ndarray::Array1<f64> = x.rows().into_iter().map(|r| 100.0 * r[0] + r[1]).collect();
        let mut model = ScaledRegressor::new(
            ScalerType::Standard,
            TrainedModel::LinearRegression(LinearRegression::new()),
        );
        model.fit(&x, &y).unwrap();

        let demographics =
            DemographicsIndex::from_records(vec!["ppltn_qty".into()], vec![("98103", vec![50.0])]).unwrap();
        PredictionService::new(ModelArtifact::new(model, schema), Arc::new(demographics))
    }

    fn simple_body() -> Value {
        json!({
            "bedrooms": 3, "bathrooms": 2, "sqft_living": 1500, "sqft_lot": 5000,
            "floors": 1, "sqft_above": 1500, "sqft_basement": 0, "zipcode": 98103
        })
    }

    #[test]
    fn test_full_prediction() {
        let response = service()
            .predict(PredictionVariant::Full, &json!({"sqft_living": 1000, "zipcode": "98103"}))
            .unwrap();
        assert!((response.predicted_price - 100_050.0).abs() < 1e-3);
        assert_eq!(response.currency, "USD");
        assert_eq!(response.status, "success");
        assert_eq!(response.endpoint, None);
        assert_eq!(response.zipcode, json!("98103"));
    }

    #[test]
    fn test_full_requires_zipcode() {
        let err = service()
            .predict(PredictionVariant::Full, &json!({"sqft_living": 1000}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: zipcode");
    }

    #[test]
    fn test_simple_reports_missing_fields() {
        let err = service()
            .predict(PredictionVariant::Simple, &json!({"bedrooms": 3}))
            .unwrap_err();
        match err {
            RealtyError::MissingFields(missing) => {
                assert_eq!(missing.len(), 7);
                assert!(!missing.contains(&"bedrooms".to_string()));
                assert!(missing.contains(&"zipcode".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_simple_ignores_extra_fields() {
        let svc = service();
        let plain = svc.predict(PredictionVariant::Simple, &simple_body()).unwrap();

        let mut body = simple_body();
        body["ppltn_qty"] = json!(1_000_000);
        let with_extra = svc.predict(PredictionVariant::Simple, &body).unwrap();

        assert_eq!(plain.predicted_price, with_extra.predicted_price);
        assert_eq!(plain.endpoint, Some("simple"));
    }

    #[test]
    fn test_zip_forms_predict_identically() {
        let svc = service();
        let prices: Vec<f64> = [json!(98103), json!(98103.0), json!("98103")]
            .into_iter()
            .map(|zip| {
                let mut body = simple_body();
                body["zipcode"] = zip;
                svc.predict(PredictionVariant::Simple, &body).unwrap().predicted_price
            })
            .collect();
        assert_eq!(prices[0], prices[1]);
        assert_eq!(prices[1], prices[2]);
    }

    #[test]
    fn test_non_object_body_rejected() {
        let err = service().predict(PredictionVariant::Full, &json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, RealtyError::InvalidRequest(_)));
        assert!(err.is_client_error());
    }
}
