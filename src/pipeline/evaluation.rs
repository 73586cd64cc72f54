//! Оценка качества на отложенной выборке

use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::ModelError;
use crate::models::forest::{ForestParams, RandomForestRegressor};
use crate::preprocessing::StandardScaler;
use crate::types::{HoldoutEvaluation, RegressionMetrics};

/// Перемешивает индексы и отрезает `fraction` под отложенную выборку.
/// None, если одна из частей получается слишком маленькой.
pub fn split_holdout(n_samples: usize, fraction: f64, seed: u64) -> Option<(Vec<usize>, Vec<usize>)> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return None;
    }

    let holdout = (n_samples as f64 * fraction).round() as usize;
    if holdout == 0 || n_samples.saturating_sub(holdout) < 2 {
        return None;
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));
    let holdout_idx = indices.split_off(n_samples - holdout);
    Some((indices, holdout_idx))
}

pub fn regression_metrics(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> RegressionMetrics {
    let n = y_true.len();
    let errors = y_true - y_pred;
    let mae = errors.mapv(f64::abs).mean().unwrap_or(0.0);
    let mse = errors.mapv(|e| e * e).mean().unwrap_or(0.0);

    let y_mean = y_true.mean().unwrap_or(0.0);
    let ss_res: f64 = errors.mapv(|e| e * e).sum();
    let ss_tot: f64 = y_true.mapv(|t| (t - y_mean).powi(2)).sum();
    let r2 = if ss_tot < 1e-10 { 0.0 } else { 1.0 - ss_res / ss_tot };

    RegressionMetrics {
        mae,
        rmse: mse.sqrt(),
        r2,
        n_samples: n,
    }
}

/// Обучает лес (и линейную модель для сравнения) на части строк и считает метрики на остатке
pub fn evaluate_holdout(
    features: &Array2<f64>,
    targets: &Array1<f64>,
    fraction: f64,
    params: &ForestParams,
) -> Result<Option<HoldoutEvaluation>, ModelError> {
    let Some((train_idx, holdout_idx)) = split_holdout(features.nrows(), fraction, params.seed)
    else {
        tracing::info!(
            rows = features.nrows(),
            fraction,
            "Not enough rows for holdout evaluation, skipping"
        );
        return Ok(None);
    };

    let x_train = features.select(Axis(0), &train_idx);
    let y_train = targets.select(Axis(0), &train_idx);
    let x_holdout = features.select(Axis(0), &holdout_idx);
    let y_holdout = targets.select(Axis(0), &holdout_idx);

    let mut scaler = StandardScaler::new();
    let x_train = scaler.fit_transform(&x_train)?;
    let x_holdout = scaler.transform(&x_holdout)?;

    let forest = RandomForestRegressor::fit(&x_train, &y_train, params)?;
    let forest_metrics = regression_metrics(&y_holdout, &forest.predict(&x_holdout)?);

    let linear_baseline = linear_baseline(&x_train, &y_train, &x_holdout)
        .map(|pred| regression_metrics(&y_holdout, &pred));

    tracing::info!(
        mae = forest_metrics.mae,
        rmse = forest_metrics.rmse,
        r2 = forest_metrics.r2,
        baseline_r2 = linear_baseline.as_ref().map(|m| m.r2),
        "Holdout evaluation"
    );

    Ok(Some(HoldoutEvaluation {
        train_rows: train_idx.len(),
        holdout_rows: holdout_idx.len(),
        forest: forest_metrics,
        linear_baseline,
    }))
}

/// Обычная линейная регрессия (linfa) как точка отсчета
fn linear_baseline(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_holdout: &Array2<f64>,
) -> Option<Array1<f64>> {
    let dataset = Dataset::new(x_train.clone(), y_train.clone());
    match LinearRegression::new().fit(&dataset) {
        Ok(model) => {
            let predictions: Array1<f64> = model.predict(x_holdout);
            predictions
                .iter()
                .all(|v| v.is_finite())
                .then_some(predictions)
        }
        Err(err) => {
            tracing::warn!("Linear baseline failed: {}", err);
            None
        }
    }
}
