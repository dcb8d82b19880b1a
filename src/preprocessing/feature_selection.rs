//! Correlation-based feature recommendations
//!
//! Ranks sales attributes the model does not use yet by the strength of their
//! linear relationship with the sale price.

use std::path::Path;

use ndarray::ArrayView1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::data::{column_to_array1, require_column, TARGET_COLUMN, ZIPCODE_COLUMN};
use crate::error::Result;

/// Attributes the current model already uses (the core house features minus the join key)
pub const CURRENT_MODEL_FEATURES: [&str; 7] = [
    "bedrooms",
    "bathrooms",
    "sqft_living",
    "sqft_lot",
    "floors",
    "sqft_above",
    "sqft_basement",
];

/// Correlation of one column with the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCorrelation {
    pub feature: String,
    pub correlation: f64,
}

/// Persisted output of a recommendation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecommendations {
    pub top_3_features: Vec<String>,
    /// Keyed by feature, in rank order
    pub correlations: Map<String, Value>,
    pub date: String,
}

impl FeatureRecommendations {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Scores sales columns against the price target
#[derive(Debug, Clone)]
pub struct FeatureRanker {
    target: String,
    current_features: Vec<String>,
}

impl Default for FeatureRanker {
    fn default() -> Self {
        Self {
            target: TARGET_COLUMN.to_string(),
            current_features: CURRENT_MODEL_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FeatureRanker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_features(&self) -> &[String] {
        &self.current_features
    }

    /// Pearson correlation of every numeric column (except the zip key) with
    /// the target, strongest positive first. The target itself is included
    /// with correlation 1.
    pub fn correlations(&self, sales: &DataFrame) -> Result<Vec<FeatureCorrelation>> {
        require_column(sales, &self.target)?;
        let target = column_to_array1(sales, &self.target)?;

        let mut result: Vec<FeatureCorrelation> = sales
            .get_columns()
            .iter()
            .filter(|c| is_numeric(c.dtype()) && c.name().as_str() != ZIPCODE_COLUMN)
            .map(|c| -> Result<FeatureCorrelation> {
                let values = column_to_array1(sales, c.name().as_str())?;
                Ok(FeatureCorrelation {
                    feature: c.name().to_string(),
                    correlation: pearson_correlation(values.view(), target.view()),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        result.sort_by(|a, b| b.correlation.total_cmp(&a.correlation));
        Ok(result)
    }

    /// Correlations of the current model features, in model order
    pub fn current_feature_correlations(&self, correlations: &[FeatureCorrelation]) -> Vec<FeatureCorrelation> {
        self.current_features
            .iter()
            .filter_map(|f| correlations.iter().find(|c| &c.feature == f).cloned())
            .collect()
    }

    /// Columns available to the model at prediction time that it does not use
    /// yet, ranked by absolute correlation with the target.
    pub fn rank_unused(
        &self,
        correlations: &[FeatureCorrelation],
        available_features: &[String],
    ) -> Vec<FeatureCorrelation> {
        let mut unused: Vec<FeatureCorrelation> = available_features
            .iter()
            .filter(|f| **f != self.target && !self.current_features.contains(f))
            .filter_map(|f| correlations.iter().find(|c| &c.feature == f).cloned())
            .collect();

        unused.sort_by(|a, b| b.correlation.abs().total_cmp(&a.correlation.abs()));
        unused
    }

    pub fn recommend(&self, ranked_unused: &[FeatureCorrelation], top_k: usize) -> FeatureRecommendations {
        let top: Vec<&FeatureCorrelation> = ranked_unused.iter().take(top_k).collect();
        FeatureRecommendations {
            top_3_features: top.iter().map(|c| c.feature.clone()).collect(),
            correlations: top
                .iter()
                .map(|c| (c.feature.clone(), Value::from(c.correlation)))
                .collect(),
            date: chrono::Utc::now().to_rfc3339(),
        }
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}

/// Pearson correlation; 0 when either side has no variance
pub fn pearson_correlation(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let n = x.len() as f64;
    if n < 2.0 {
        return 0.0;
    }

    let x_mean = x.mean().unwrap_or(0.0);
    let y_mean = y.mean().unwrap_or(0.0);

    let x_std = (x.iter().map(|&v| (v - x_mean).powi(2)).sum::<f64>() / n).sqrt();
    let y_std = (y.iter().map(|&v| (v - y_mean).powi(2)).sum::<f64>() / n).sqrt();

    if x_std <= 0.0 || y_std <= 0.0 {
        return 0.0;
    }

    let covariance: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(&x, &y)| (x - x_mean) * (y - y_mean))
        .sum::<f64>()
        / n;

    covariance / (x_std * y_std)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sales_df() -> DataFrame {
        df!(
            "id" => &[7i64, 3, 9, 1, 5],
            "date" => &["a", "b", "c", "d", "e"],
            "price" => &[100.0, 200.0, 300.0, 400.0, 500.0],
            "bedrooms" => &[1i64, 2, 3, 4, 5],
            "grade" => &[5i64, 6, 7, 8, 9],
            "condition" => &[5i64, 4, 3, 2, 1],
            "view" => &[0i64, 1, 0, 1, 0],
            "zipcode" => &[98103i64, 98104, 98105, 98106, 98107]
        )
        .unwrap()
    }

    #[test]
    fn test_pearson_correlation() {
        let x = array![1.0, 2.0, 3.0, 4.0];
        let y = array![2.0, 4.0, 6.0, 8.0];
        assert!((pearson_correlation(x.view(), y.view()) - 1.0).abs() < 1e-10);

        let z = array![8.0, 6.0, 4.0, 2.0];
        assert!((pearson_correlation(x.view(), z.view()) + 1.0).abs() < 1e-10);

        let flat = array![1.0, 1.0, 1.0, 1.0];
        assert_eq!(pearson_correlation(x.view(), flat.view()), 0.0);
    }

    #[test]
    fn test_correlations_skip_text_and_zipcode() {
        let ranker = FeatureRanker::new();
        let correlations = ranker.correlations(&sales_df()).unwrap();
        let names: Vec<&str> = correlations.iter().map(|c| c.feature.as_str()).collect();

        assert!(!names.contains(&"date"));
        assert!(!names.contains(&"zipcode"));
        assert!(names.contains(&"price"));
        assert!((correlations[0].correlation - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_rank_unused_by_absolute_correlation() {
        let ranker = FeatureRanker::new();
        let correlations = ranker.correlations(&sales_df()).unwrap();
        let available: Vec<String> = ["bedrooms", "view", "condition", "grade", "unknown"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let ranked = ranker.rank_unused(&correlations, &available);
        let names: Vec<&str> = ranked.iter().map(|c| c.feature.as_str()).collect();

        // bedrooms is already used; unknown has no correlation
        assert_eq!(names.len(), 3);
        assert!(!names.contains(&"bedrooms"));
        assert_eq!(names[2], "view");
        assert!(names[..2].contains(&"grade"));
        assert!(names[..2].contains(&"condition"));
    }

    #[test]
    fn test_recommend_top_k() {
        let ranker = FeatureRanker::new();
        let ranked = vec![
            FeatureCorrelation { feature: "grade".into(), correlation: 0.66 },
            FeatureCorrelation { feature: "view".into(), correlation: 0.39 },
        ];
        let rec = ranker.recommend(&ranked, 3);
        assert_eq!(rec.top_3_features, vec!["grade", "view"]);
        assert_eq!(rec.correlations["grade"], 0.66);
        assert!(!rec.date.is_empty());
    }

    #[test]
    fn test_recommendations_keep_rank_order() {
        let ranker = FeatureRanker::new();
        let ranked = vec![
            FeatureCorrelation { feature: "view".into(), correlation: 0.71 },
            FeatureCorrelation { feature: "grade".into(), correlation: -0.52 },
            FeatureCorrelation { feature: "condition".into(), correlation: 0.12 },
        ];
        let rec = ranker.recommend(&ranked, 3);

        let keys: Vec<&str> = rec.correlations.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["view", "grade", "condition"]);

        let json = serde_json::to_string(&rec).unwrap();
        let view = json.find(r#""view":0.71"#).unwrap();
        let grade = json.find(r#""grade":-0.52"#).unwrap();
        let condition = json.find(r#""condition":0.12"#).unwrap();
        assert!(view < grade && grade < condition);
    }
}
