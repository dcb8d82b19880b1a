//! Training-side schema construction
//!
//! Merges sale records with zip-code demographics and fixes the ordered list
//! of feature names every downstream component relies on.

use std::path::Path;

use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    canonicalize_zipcodes, column_names, columns_to_array2, load_csv, require_column,
    SALES_COLUMN_SELECTION, TARGET_COLUMN, ZIPCODE_COLUMN,
};
use crate::error::{RealtyError, Result};

/// Ordered feature names an estimator is trained against.
///
/// Fixed once at training time and immutable afterwards; persisted as a JSON
/// array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Result<Self> {
        let mut seen = std::collections::HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(RealtyError::DataError(format!("Duplicate feature name: {name}")));
            }
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let names: Vec<String> = serde_json::from_str(&json)?;
        Self::new(names)
    }
}

/// Feature matrix and target vector with matching row order
#[derive(Debug, Clone)]
pub struct TrainingFrame {
    pub schema: FeatureSchema,
    pub features: Array2<f64>,
    pub target: Array1<f64>,
}

impl TrainingFrame {
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }
}

/// Builds the training frame from raw sales and demographics tables.
///
/// Sales rows whose zip code has no demographics match keep the row; every
/// demographic feature for that row is filled with 0.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    column_selection: Vec<String>,
    target_column: String,
    join_key: String,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self {
            column_selection: SALES_COLUMN_SELECTION.iter().map(|s| s.to_string()).collect(),
            target_column: TARGET_COLUMN.to_string(),
            join_key: ZIPCODE_COLUMN.to_string(),
        }
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the sales columns kept before the merge. The target and the
    /// join key are always kept.
    pub fn with_column_selection(mut self, columns: Vec<String>) -> Self {
        self.column_selection = columns;
        for required in [&self.target_column, &self.join_key] {
            if !self.column_selection.contains(required) {
                self.column_selection.push(required.clone());
            }
        }
        self
    }

    /// Left-join sales to demographics on the zip code and drop the join key.
    /// The target column is still present in the result.
    pub fn merge(&self, sales: &DataFrame, demographics: &DataFrame) -> Result<DataFrame> {
        require_column(sales, &self.join_key)?;
        require_column(demographics, &self.join_key)?;
        for column in &self.column_selection {
            require_column(sales, column)?;
        }

        let mut sales = sales.select(self.column_selection.iter().map(|s| s.as_str()))?;
        let mut demographics = demographics.clone();
        canonicalize_zipcodes(&mut sales)?;
        canonicalize_zipcodes(&mut demographics)?;

        let merged = sales.left_join(&demographics, [self.join_key.as_str()], [self.join_key.as_str()])?;
        debug!(rows = merged.height(), columns = merged.width(), "Merged sales with demographics");

        Ok(merged.drop(&self.join_key)?)
    }

    /// Merge, then split the target off into its own vector. The feature
    /// matrix column order defines the [`FeatureSchema`].
    pub fn build(&self, sales: &DataFrame, demographics: &DataFrame) -> Result<TrainingFrame> {
        let mut merged = self.merge(sales, demographics)?;

        let target_column = merged.drop_in_place(&self.target_column)?;
        let target: Array1<f64> = target_column
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect();

        let schema = FeatureSchema::new(column_names(&merged))?;
        let features = columns_to_array2(&merged, schema.names())?;

        info!(
            samples = features.nrows(),
            features = schema.len(),
            "Built training frame"
        );

        Ok(TrainingFrame {
            schema,
            features,
            target,
        })
    }

    pub fn build_from_csv(
        &self,
        sales_path: impl AsRef<Path>,
        demographics_path: impl AsRef<Path>,
    ) -> Result<TrainingFrame> {
        let sales = load_csv(sales_path)?;
        let demographics = load_csv(demographics_path)?;
        self.build(&sales, &demographics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales_df() -> DataFrame {
        df!(
            "id" => &[1i64, 2, 3],
            "price" => &[500000.0, 750000.0, 320000.0],
            "bedrooms" => &[3i64, 4, 2],
            "bathrooms" => &[2.0, 2.5, 1.0],
            "sqft_living" => &[1500i64, 2400, 900],
            "sqft_lot" => &[5000i64, 7200, 3000],
            "floors" => &[1.0, 2.0, 1.0],
            "sqft_above" => &[1500i64, 1800, 900],
            "sqft_basement" => &[0i64, 600, 0],
            "zipcode" => &[98103i64, 98004, 11111]
        )
        .unwrap()
    }

    fn demographics_df() -> DataFrame {
        df!(
            "ppltn_qty" => &[38249.0, 25000.0],
            "medn_hshld_incm_amt" => &[76000.0, 120000.0],
            "zipcode" => &["98103", "98004"]
        )
        .unwrap()
    }

    #[test]
    fn test_schema_excludes_target_and_join_key() {
        let frame = SchemaBuilder::new().build(&sales_df(), &demographics_df()).unwrap();

        assert!(!frame.schema.contains("price"));
        assert!(!frame.schema.contains("zipcode"));
        assert!(!frame.schema.contains("id"));
        assert_eq!(frame.schema.len(), 9);
        assert_eq!(
            &frame.schema.names()[..7],
            &["bedrooms", "bathrooms", "sqft_living", "sqft_lot", "floors", "sqft_above", "sqft_basement"]
        );
        assert!(frame.schema.contains("ppltn_qty"));
        assert!(frame.schema.contains("medn_hshld_incm_amt"));
        assert_eq!(frame.features.ncols(), frame.schema.len());
        assert_eq!(frame.features.nrows(), frame.target.len());
    }

    #[test]
    fn test_unmatched_zipcode_gets_zero_demographics() {
        let frame = SchemaBuilder::new().build(&sales_df(), &demographics_df()).unwrap();
        let pop_idx = frame.schema.names().iter().position(|n| n == "ppltn_qty").unwrap();
        let bed_idx = frame.schema.names().iter().position(|n| n == "bedrooms").unwrap();

        let row = (0..frame.n_samples())
            .find(|&r| frame.target[r] == 320000.0)
            .unwrap();
        assert_eq!(frame.features[[row, pop_idx]], 0.0);
        assert_eq!(frame.features[[row, bed_idx]], 2.0);
    }

    #[test]
    fn test_target_rows_match_feature_rows() {
        let frame = SchemaBuilder::new().build(&sales_df(), &demographics_df()).unwrap();
        let bed_idx = frame.schema.names().iter().position(|n| n == "bedrooms").unwrap();
        for r in 0..frame.n_samples() {
            let expected_beds = match frame.target[r] as i64 {
                500000 => 3.0,
                750000 => 4.0,
                320000 => 2.0,
                other => panic!("unexpected price {other}"),
            };
            assert_eq!(frame.features[[r, bed_idx]], expected_beds);
        }
    }

    #[test]
    fn test_missing_join_key_is_integrity_error() {
        let sales = sales_df().drop("zipcode").unwrap();
        let err = SchemaBuilder::new().build(&sales, &demographics_df()).unwrap_err();
        assert!(matches!(err, RealtyError::MissingColumn(c) if c == "zipcode"));

        let demographics = demographics_df().drop("zipcode").unwrap();
        let err = SchemaBuilder::new().build(&sales_df(), &demographics).unwrap_err();
        assert!(matches!(err, RealtyError::MissingColumn(c) if c == "zipcode"));
    }

    #[test]
    fn test_schema_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_features.json");
        let schema = FeatureSchema::new(vec!["b".into(), "a".into()]).unwrap();
        schema.save(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"["b","a"]"#);
        assert_eq!(FeatureSchema::load(&path).unwrap(), schema);
    }

    #[test]
    fn test_duplicate_feature_names_rejected() {
        assert!(FeatureSchema::new(vec!["a".into(), "a".into()]).is_err());
    }
}
