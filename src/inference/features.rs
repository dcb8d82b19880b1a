//! Serving-side feature preparation
//!
//! Turns loosely typed client JSON into a row aligned to the persisted
//! [`FeatureSchema`]. Coercion is lenient: any house attribute that cannot be
//! read as a number becomes 0 rather than rejecting the request.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use ndarray::{Array1, Array2, Axis};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::data::demographics::canonical_zipcode_from_f64;
use crate::data::{canonical_zipcode, DemographicsIndex, FeatureSchema, ZIPCODE_COLUMN};
use crate::error::{RealtyError, Result};

/// A normalized scalar: integral values stay integers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NumericValue {
    Int(i64),
    Float(f64),
}

impl NumericValue {
    pub const ZERO: NumericValue = NumericValue::Int(0);

    fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return Self::ZERO;
        }
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            NumericValue::Int(value as i64)
        } else {
            NumericValue::Float(value)
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            NumericValue::Int(v) => v as f64,
            NumericValue::Float(v) => v,
        }
    }
}

/// Total coercion of a raw JSON value. Null, non-numeric strings, arrays and
/// objects all normalize to 0.
pub fn normalize_value(raw: &Value) -> NumericValue {
    match raw {
        Value::Null => NumericValue::ZERO,
        Value::Bool(b) => NumericValue::Int(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(v) => NumericValue::Int(v),
            None => n.as_f64().map(NumericValue::from_f64).unwrap_or(NumericValue::ZERO),
        },
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(NumericValue::from_f64)
            .unwrap_or(NumericValue::ZERO),
        Value::Array(_) | Value::Object(_) => NumericValue::ZERO,
    }
}

/// Canonical zip key for a raw JSON value. Unlike other fields a zip code
/// that cannot be read as a number is an error; null maps to `"0"`.
pub fn normalize_zipcode(raw: &Value) -> Result<String> {
    let canonical = match raw {
        Value::Null => Some("0".to_string()),
        Value::Bool(b) => Some(i64::from(*b).to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(v) => Some(v.to_string()),
            None => n.as_f64().and_then(canonical_zipcode_from_f64),
        },
        Value::String(s) => canonical_zipcode(s),
        Value::Array(_) | Value::Object(_) => None,
    };
    canonical.ok_or_else(|| RealtyError::InvalidZipcode(raw.to_string()))
}

/// Client input after per-field coercion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedInput {
    pub zipcode: String,
    /// Every field except the zip code
    pub attributes: BTreeMap<String, NumericValue>,
}

/// One house's values in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(String, f64)>,
}

impl FeatureVector {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, value)| *value).collect()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Single-row matrix for the estimator
    pub fn to_row(&self) -> Array2<f64> {
        Array1::from(self.values()).insert_axis(Axis(0))
    }
}

/// Normalizes client attributes, joins demographics by zip code and
/// reindexes onto the training schema
#[derive(Debug, Clone)]
pub struct FeaturePreparer {
    schema: FeatureSchema,
    demographics: Arc<DemographicsIndex>,
}

impl FeaturePreparer {
    pub fn new(schema: FeatureSchema, demographics: Arc<DemographicsIndex>) -> Self {
        Self { schema, demographics }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn demographics(&self) -> &DemographicsIndex {
        &self.demographics
    }

    /// An absent zip code is treated like a null one
    pub fn normalize(&self, input: &Map<String, Value>) -> Result<NormalizedInput> {
        let zipcode = normalize_zipcode(input.get(ZIPCODE_COLUMN).unwrap_or(&Value::Null))?;
        let attributes = input
            .iter()
            .filter(|(key, _)| key.as_str() != ZIPCODE_COLUMN)
            .map(|(key, value)| (key.clone(), normalize_value(value)))
            .collect();
        Ok(NormalizedInput { zipcode, attributes })
    }

    pub fn prepare_normalized(&self, input: &NormalizedInput) -> Result<FeatureVector> {
        let record = self
            .demographics
            .lookup(&input.zipcode)
            .ok_or_else(|| RealtyError::ZipcodeNotFound(input.zipcode.clone()))?;

        // demographics overwrite colliding house attributes
        let mut merged: HashMap<&str, f64> = input
            .attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_f64()))
            .collect();
        merged.extend(record.iter());

        let entries = self
            .schema
            .names()
            .iter()
            .map(|name| (name.clone(), merged.get(name.as_str()).copied().unwrap_or(0.0)))
            .collect();
        Ok(FeatureVector { entries })
    }

    pub fn prepare(&self, input: &Map<String, Value>) -> Result<FeatureVector> {
        let normalized = self.normalize(input)?;
        self.prepare_normalized(&normalized)
    }
}
