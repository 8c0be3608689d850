//! Per-column standardization to zero mean and unit variance.
//!
//! The scaler is fitted once over all rows and then applied, so `fit` followed by
//! `transform` on the same matrix is exactly `fit_transform`. Standard deviation is the
//! population value (divide by N). A column whose standard deviation is zero is divided
//! by 1.0 instead, which maps it to all zeros.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result, Stage};
use crate::table::FeatureMatrix;

/// Standardized N x D matrix. Only [`StandardScaler`] produces one.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardizedMatrix {
    rows: Vec<Vec<f32>>,
    n_cols: usize,
}

impl StandardizedMatrix {
    /// Number of rows (N).
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (D).
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Row-major view.
    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    /// True if every row equals the first (including the empty matrix).
    pub fn is_constant(&self) -> bool {
        match self.rows.split_first() {
            Some((first, rest)) => rest.iter().all(|r| r == first),
            None => true,
        }
    }
}

/// Column means and standard deviations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

impl StandardScaler {
    /// Compute column statistics over every row.
    pub fn fit(data: &FeatureMatrix) -> Result<Self> {
        let n = data.n_rows();
        if n == 0 {
            return Err(Error::invalid_input(Stage::Standardize, "empty feature matrix"));
        }
        let d = data.n_cols();
        if d == 0 {
            return Err(Error::invalid_input(
                Stage::Standardize,
                "feature matrix has no columns",
            ));
        }

        // Accumulate in f64; descriptor magnitudes vary by several orders.
        let mut sum = vec![0.0f64; d];
        for row in data.rows() {
            for (s, &v) in sum.iter_mut().zip(row) {
                *s += f64::from(v);
            }
        }
        let mean: Vec<f64> = sum.into_iter().map(|s| s / n as f64).collect();

        let mut sq = vec![0.0f64; d];
        for row in data.rows() {
            for ((s, &v), &m) in sq.iter_mut().zip(row).zip(&mean) {
                let c = f64::from(v) - m;
                *s += c * c;
            }
        }
        // A column of identical values gets exactly zero, whatever the rounding in `mean`.
        let first = &data.rows()[0];
        let constant: Vec<bool> = (0..d)
            .map(|j| data.rows().iter().all(|r| r[j] == first[j]))
            .collect();
        let std: Vec<f64> = sq
            .into_iter()
            .zip(&constant)
            .map(|(s, &c)| if c { 0.0 } else { (s / n as f64).sqrt() })
            .collect();

        Ok(Self {
            mean: mean
                .into_iter()
                .zip(&constant)
                .zip(first)
                .map(|((m, &c), &v)| if c { v } else { m as f32 })
                .collect(),
            std: std.into_iter().map(|s| s as f32).collect(),
        })
    }

    /// Indices of columns with zero standard deviation.
    pub fn constant_columns(&self) -> Vec<usize> {
        self.std
            .iter()
            .enumerate()
            .filter_map(|(j, &s)| (s == 0.0).then_some(j))
            .collect()
    }

    /// Apply `(x - mean) / std` column by column.
    pub fn transform(&self, data: &FeatureMatrix) -> Result<StandardizedMatrix> {
        if data.n_cols() != self.mean.len() {
            return Err(Error::invalid_input(
                Stage::Standardize,
                format!(
                    "matrix has {} columns, scaler was fitted on {}",
                    data.n_cols(),
                    self.mean.len()
                ),
            ));
        }

        let mut rows = Vec::with_capacity(data.n_rows());
        for row in data.rows() {
            let mut out = row.clone();
            self.apply_in_place(&mut out);
            rows.push(out);
        }
        Ok(StandardizedMatrix {
            rows,
            n_cols: data.n_cols(),
        })
    }

    /// Fit on `data`, then transform it.
    pub fn fit_transform(data: &FeatureMatrix) -> Result<(Self, StandardizedMatrix)> {
        let scaler = Self::fit(data)?;
        let constant = scaler.constant_columns();
        if !constant.is_empty() {
            warn!(columns = ?constant, "zero-variance descriptor columns standardize to 0");
        }
        let out = scaler.transform(data)?;
        debug!(rows = out.n_rows(), cols = out.n_cols(), "standardized features");
        Ok((scaler, out))
    }

    fn apply_in_place(&self, x: &mut [f32]) {
        for ((v, &m), &s) in x.iter_mut().zip(&self.mean).zip(&self.std) {
            let s = if s == 0.0 { 1.0 } else { s };
            *v = (*v - m) / s;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: Vec<Vec<f32>>) -> FeatureMatrix {
        FeatureMatrix::new(rows).unwrap()
    }

    fn column(m: &StandardizedMatrix, j: usize) -> Vec<f64> {
        m.rows().iter().map(|r| f64::from(r[j])).collect()
    }

    #[test]
    fn standardized_columns_have_zero_mean_unit_std() {
        let data = matrix(vec![
            vec![1.0, 200.0, -3.0],
            vec![2.0, 350.0, 0.5],
            vec![4.0, 410.0, 2.0],
            vec![8.0, 120.0, 7.5],
            vec![9.0, 500.0, 1.0],
        ]);
        let (_, z) = StandardScaler::fit_transform(&data).unwrap();
        for j in 0..3 {
            let col = column(&z, j);
            let n = col.len() as f64;
            let mean = col.iter().sum::<f64>() / n;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            assert!(mean.abs() < 1e-5, "col {j} mean {mean}");
            assert!((var.sqrt() - 1.0).abs() < 1e-4, "col {j} std {}", var.sqrt());
        }
    }

    #[test]
    fn zero_variance_column_becomes_zeros() {
        let data = matrix(vec![vec![3.0, 1.0], vec![3.0, 2.0], vec![3.0, 3.0]]);
        let (scaler, z) = StandardScaler::fit_transform(&data).unwrap();
        assert_eq!(scaler.constant_columns(), vec![0]);
        for row in z.rows() {
            assert_eq!(row[0], 0.0);
            assert!(row[1].is_finite());
        }
    }

    #[test]
    fn fit_then_transform_equals_fit_transform() {
        let data = matrix(vec![vec![1.0, 5.0], vec![2.0, 7.0], vec![6.0, 9.0]]);
        let scaler = StandardScaler::fit(&data).unwrap();
        let a = scaler.transform(&data).unwrap();
        let (_, b) = StandardScaler::fit_transform(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn identical_rows_are_constant() {
        let data = matrix(vec![vec![1.0, 2.0]; 4]);
        let (_, z) = StandardScaler::fit_transform(&data).unwrap();
        assert!(z.is_constant());
        assert!(z.rows().iter().flatten().all(|&v| v == 0.0));
    }

    #[test]
    fn empty_input_is_rejected() {
        let data = matrix(vec![]);
        let err = StandardScaler::fit(&data).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Standardize));
    }

    #[test]
    fn transform_rejects_width_mismatch() {
        let scaler = StandardScaler::fit(&matrix(vec![vec![1.0, 2.0]])).unwrap();
        assert!(scaler.transform(&matrix(vec![vec![1.0]])).is_err());
    }
}
