//! Ordinary least squares regression

use crate::error::{RealtyError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::Estimator;

/// Solve symmetric positive-definite system Ax = b using Cholesky decomposition.
/// Retries once with a small ridge on the diagonal if the matrix is not
/// positive definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    cholesky_solve_inner(a, b).or_else(|| {
        let mut a_reg = a.clone();
        let ridge = 1e-8 * a.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64;
        for k in 0..n {
            a_reg[[k, k]] += ridge.max(1e-12);
        }
        cholesky_solve_inner(&a_reg, b)
    })
}

fn cholesky_solve_inner(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();

    // A = L * L^T
    let mut l = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward substitution: L * y = b
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T * x = y
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Linear regression fitted on the normal equations, with optional L2 penalty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: Option<f64>,
    /// Regularization strength (L2)
    pub alpha: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            alpha: 0.0,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }
}

impl Estimator for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(RealtyError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| RealtyError::TrainingError("no training samples".to_string()))?;
        let y_mean = y.mean().unwrap_or(0.0);

        let x_centered = x - &x_mean.clone().insert_axis(Axis(0));
        let y_centered = y - y_mean;

        let mut xtx = x_centered.t().dot(&x_centered);
        for i in 0..n_features {
            xtx[[i, i]] += self.alpha;
        }
        let xty = x_centered.t().dot(&y_centered);

        let coefficients = cholesky_solve(&xtx, &xty).ok_or_else(|| {
            RealtyError::TrainingError("normal equations are singular".to_string())
        })?;

        self.intercept = Some(y_mean - x_mean.dot(&coefficients));
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (coefficients, intercept) = match (&self.coefficients, self.intercept) {
            (Some(c), Some(b)) => (c, b),
            _ => return Err(RealtyError::ModelNotFitted),
        };
        if x.ncols() != coefficients.len() {
            return Err(RealtyError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(coefficients) + intercept)
    }
}
