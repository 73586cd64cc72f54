//! Нормализация данных (StandardScaler)

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::types::FeatureVector;

/// Приводит каждый признак к нулевому среднему и единичной дисперсии.
/// Параметры сериализуются в артефакт и на сервисе только читаются.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    std: Option<Array1<f64>>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, X: &Array2<f64>) -> Result<(), ModelError> {
        if X.nrows() == 0 {
            return Err(ModelError::EmptyDataset);
        }
        if X.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite("scaler input"));
        }

        // Среднее и стандартное отклонение (ddof = 0) по каждому признаку
        let mean = X.mean_axis(Axis(0)).ok_or(ModelError::EmptyDataset)?;
        let mut std = X.std_axis(Axis(0), 0.0);

        // Избегаем деления на ноль
        for val in std.iter_mut() {
            if *val < 1e-10 {
                *val = 1.0;
            }
        }

        self.mean = Some(mean);
        self.std = Some(std);
        self.is_fitted = true;
        Ok(())
    }

    pub fn transform(&self, X: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        let (mean, std) = self.params()?;
        if X.ncols() != mean.len() {
            return Err(ModelError::DimensionMismatch {
                expected: mean.len(),
                got: X.ncols(),
            });
        }

        // Нормализация: (X - mean) / std
        let mut normalized = X.clone();
        for mut row in normalized.rows_mut() {
            for (i, val) in row.iter_mut().enumerate() {
                *val = (*val - mean[i]) / std[i];
            }
        }

        Ok(normalized)
    }

    pub fn transform_vector(&self, features: &FeatureVector) -> Result<Array1<f64>, ModelError> {
        let (mean, std) = self.params()?;
        let x = features.to_array();
        if x.len() != mean.len() {
            return Err(ModelError::DimensionMismatch {
                expected: mean.len(),
                got: x.len(),
            });
        }
        Ok((x - mean) / std)
    }

    pub fn fit_transform(&mut self, X: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        self.fit(X)?;
        self.transform(X)
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn n_features(&self) -> Option<usize> {
        self.mean.as_ref().map(|m| m.len())
    }

    fn params(&self) -> Result<(&Array1<f64>, &Array1<f64>), ModelError> {
        match (&self.mean, &self.std) {
            (Some(mean), Some(std)) if self.is_fitted && mean.len() == std.len() => Ok((mean, std)),
            _ => Err(ModelError::NotFitted),
        }
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_transform_zero_mean_unit_variance() {
        let X = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&X).unwrap();

        for column in scaled.columns() {
            assert!(column.mean().unwrap().abs() < 1e-12);
            assert!((column.std(0.0) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constant_feature_keeps_unit_scale() {
        let X = array![[5.0, 1.0], [5.0, 2.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&X).unwrap();
        assert_eq!(scaled.column(0).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_unfitted_and_empty() {
        let scaler = StandardScaler::new();
        assert!(matches!(scaler.transform(&array![[1.0]]), Err(ModelError::NotFitted)));

        let mut scaler = StandardScaler::new();
        assert!(matches!(
            scaler.fit(&Array2::zeros((0, 8))),
            Err(ModelError::EmptyDataset)
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0, 2.0, 3.0]]),
            Err(ModelError::DimensionMismatch { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_transform_vector_matches_matrix_transform() {
        let rows = [
            FeatureVector::new([188.0, 8.0, 16.0, 50.0, 3.2, 5000.0, 6.7, 2024.0]),
            FeatureVector::new([170.0, 6.0, 12.0, 48.0, 2.0, 4500.0, 6.1, 2022.0]),
            FeatureVector::new([221.0, 12.0, 32.0, 200.0, 3.3, 5000.0, 6.8, 2024.0]),
        ];
        let X = crate::preprocessing::FeatureEngineer::build_matrix(&rows);
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&X).unwrap();

        let single = scaler.transform_vector(&rows[1]).unwrap();
        assert_eq!(single, scaled.row(1).to_owned());
    }
}
