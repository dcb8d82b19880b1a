//! Feature scaling implementations

use std::str::FromStr;

use crate::error::{RealtyError, Result};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// Robust scaling using median and IQR
    Robust,
    /// No scaling
    None,
}

impl Default for ScalerType {
    fn default() -> Self {
        Self::Robust
    }
}

impl FromStr for ScalerType {
    type Err = RealtyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(ScalerType::Standard),
            "minmax" | "min_max" => Ok(ScalerType::MinMax),
            "robust" => Ok(ScalerType::Robust),
            "none" => Ok(ScalerType::None),
            other => Err(RealtyError::InvalidParameter {
                name: "scaler".to_string(),
                value: other.to_string(),
                reason: "expected one of: standard, minmax, robust, none".to_string(),
            }),
        }
    }
}

/// Parameters for one fitted column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct ScalerParams {
    center: f64, // mean, min, or median
    scale: f64,  // std, range, or IQR
}

/// Column-wise feature scaler over dense matrices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn scaler_type(&self) -> ScalerType {
        self.scaler_type
    }

    /// Fit per-column parameters
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(RealtyError::InvalidParameter {
                name: "x".to_string(),
                value: "0 rows".to_string(),
                reason: "cannot fit a scaler on an empty matrix".to_string(),
            });
        }

        self.params = x
            .axis_iter(Axis(1))
            .map(|column| self.compute_params(column))
            .collect();
        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(RealtyError::ModelNotFitted);
        }
        if x.ncols() != self.params.len() {
            return Err(RealtyError::ShapeError {
                expected: format!("{} columns", self.params.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut result = x.to_owned();
        for (mut column, params) in result.axis_iter_mut(Axis(1)).zip(self.params.iter()) {
            column.mapv_inplace(|v| (v - params.center) / params.scale);
        }
        Ok(result)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    fn compute_params(&self, column: ArrayView1<f64>) -> ScalerParams {
        let nonzero = |s: f64| if s == 0.0 || !s.is_finite() { 1.0 } else { s };

        match self.scaler_type {
            ScalerType::Standard => {
                let mean = column.mean().unwrap_or(0.0);
                let std = column.std(0.0);
                ScalerParams {
                    center: mean,
                    scale: nonzero(std),
                }
            }
            ScalerType::MinMax => {
                let min = column.iter().copied().fold(f64::INFINITY, f64::min);
                let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                ScalerParams {
                    center: min,
                    scale: nonzero(max - min),
                }
            }
            ScalerType::Robust => {
                let mut sorted = column.to_vec();
                sorted.sort_by(|a, b| a.total_cmp(b));
                let median = quantile(&sorted, 0.5);
                let iqr = quantile(&sorted, 0.75) - quantile(&sorted, 0.25);
                ScalerParams {
                    center: median,
                    scale: nonzero(iqr),
                }
            }
            ScalerType::None => ScalerParams {
                center: 0.0,
                scale: 1.0,
            },
        }
    }
}

/// Linear-interpolated quantile of pre-sorted data
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&x).unwrap();

        let mean = result.column(0).mean().unwrap();
        assert!(mean.abs() < 1e-10);
    }

    #[test]
    fn test_minmax_scaler() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let mut scaler = Scaler::new(ScalerType::MinMax);
        let result = scaler.fit_transform(&x).unwrap();

        assert!((result[[0, 0]] - 0.0).abs() < 1e-10);
        assert!((result[[4, 0]] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_robust_scaler_median_iqr() {
        // median 3, q1 2, q3 4 -> iqr 2
        let x = array![[1.0, 10.0], [2.0, 10.0], [3.0, 10.0], [4.0, 10.0], [5.0, 10.0]];
        let mut scaler = Scaler::new(ScalerType::Robust);
        let result = scaler.fit_transform(&x).unwrap();

        assert!((result[[2, 0]] - 0.0).abs() < 1e-10);
        assert!((result[[4, 0]] - 1.0).abs() < 1e-10);
        assert!((result[[0, 0]] + 1.0).abs() < 1e-10);
        // constant column: zero IQR falls back to unit scale
        assert!((result[[0, 1]] - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_scaler_type_from_str() {
        assert_eq!("standard".parse::<ScalerType>().unwrap(), ScalerType::Standard);
        assert_eq!("MinMax".parse::<ScalerType>().unwrap(), ScalerType::MinMax);
        assert_eq!("robust".parse::<ScalerType>().unwrap(), ScalerType::Robust);
        assert_eq!("none".parse::<ScalerType>().unwrap(), ScalerType::None);
        assert!(matches!(
            "quantile".parse::<ScalerType>(),
            Err(RealtyError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_none_scaler_is_identity() {
        let x = array![[1.0, -200.0], [7.5, 30.0]];
        let mut scaler = Scaler::new(ScalerType::None);
        assert_eq!(scaler.fit_transform(&x).unwrap(), x);
    }

    #[test]
    fn test_transform_requires_fit() {
        let scaler = Scaler::new(ScalerType::Robust);
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(RealtyError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_transform_column_mismatch() {
        let mut scaler = Scaler::new(ScalerType::Standard);
        scaler.fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(RealtyError::ShapeError { .. })
        ));
    }
}
