//! Пайплайн обучения: CSV -> очистка -> скейлер + лес -> артефакты

use std::path::PathBuf;

use chrono::Utc;
use ndarray::{Array1, Array2};

use crate::error::{DatasetError, ModelError, TrainingError};
use crate::models::{ArtifactStore, ForestParams, RandomForestRegressor, TrainedArtifact};
use crate::pipeline::dataset::{clean_price, DatasetLoader, DEFAULT_TARGET_COLUMN};
use crate::pipeline::evaluation;
use crate::preprocessing::{FeatureEngineer, StandardScaler};
use crate::types::{LabeledRecord, RowRejection, SpecField, TrainingReport};

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub dataset_path: PathBuf,
    pub artifacts_dir: PathBuf,
    pub target_column: String,
    pub forest: ForestParams,
    /// Доля строк для оценки качества (0 = не оценивать)
    pub holdout_fraction: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/Mobiles Dataset (2025).csv"),
            artifacts_dir: PathBuf::from("artifacts"),
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            forest: ForestParams::default(),
            holdout_fraction: 0.2,
        }
    }
}

/// Очищенные данные, готовые к обучению
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub features: Array2<f64>,
    pub targets: Array1<f64>,
    pub rows_total: usize,
    pub rejected: Vec<RowRejection>,
    pub processor_fallbacks: usize,
}

pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Полный прогон: загрузка, очистка, оценка, обучение, сохранение
    pub fn run(&self) -> Result<TrainingReport, TrainingError> {
        let config = &self.config;
        tracing::info!(
            dataset = %config.dataset_path.display(),
            target = %config.target_column,
            "Starting training"
        );

        let records = DatasetLoader::load(&config.dataset_path, &config.target_column)?;
        let data = Self::prepare(&records)?;

        let evaluation = evaluation::evaluate_holdout(
            &data.features,
            &data.targets,
            config.holdout_fraction,
            &config.forest,
        )?;

        let artifact = Self::fit(&data.features, &data.targets, &config.forest)?;

        let store = ArtifactStore::new(&config.artifacts_dir);
        store.save(&artifact)?;

        let report = TrainingReport {
            trained_at: Utc::now(),
            dataset: config.dataset_path.display().to_string(),
            target_column: config.target_column.clone(),
            rows_total: data.rows_total,
            rows_used: data.targets.len(),
            rejected: data.rejected,
            processor_fallbacks: data.processor_fallbacks,
            feature_names: SpecField::feature_names(),
            n_trees: artifact.model.n_trees(),
            evaluation,
        };
        store.save_report(&report)?;

        tracing::info!(
            rows_used = report.rows_used,
            rows_rejected = report.rejected.len(),
            artifacts = %config.artifacts_dir.display(),
            "Training finished"
        );
        Ok(report)
    }

    /// Прогоняет каждую строку через нормализацию и очистку цены.
    /// Плохие строки исключаются (не фатально); если не осталось ни одной - ошибка.
    pub fn prepare(records: &[LabeledRecord]) -> Result<PreparedData, DatasetError> {
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }

        let mut vectors = Vec::with_capacity(records.len());
        let mut targets = Vec::with_capacity(records.len());
        let mut rejected = Vec::new();
        let mut processor_fallbacks = 0;

        for record in records {
            let normalized = match FeatureEngineer::normalize(&record.spec) {
                Ok(normalized) => normalized,
                Err(err) => {
                    tracing::debug!(row = record.row, "Row rejected: {}", err);
                    rejected.push(RowRejection {
                        row: record.row,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let Some(price) = record.price.as_deref().and_then(clean_price) else {
                let reason = format!("invalid price: {:?}", record.price.as_deref().unwrap_or(""));
                tracing::debug!(row = record.row, "Row rejected: {}", reason);
                rejected.push(RowRejection {
                    row: record.row,
                    reason,
                });
                continue;
            };

            if normalized.processor.is_fallback() {
                processor_fallbacks += 1;
            }
            vectors.push(normalized.features);
            targets.push(price);
        }

        if !rejected.is_empty() {
            tracing::warn!(
                rejected = rejected.len(),
                total = records.len(),
                "Rows excluded from training"
            );
        }
        if processor_fallbacks > 0 {
            tracing::info!(
                count = processor_fallbacks,
                "Processors not in the clock table, used default clock speed"
            );
        }

        if vectors.is_empty() {
            return Err(DatasetError::NoValidRows {
                total: records.len(),
                rejected: rejected.len(),
            });
        }

        Ok(PreparedData {
            features: FeatureEngineer::build_matrix(&vectors),
            targets: Array1::from(targets),
            rows_total: records.len(),
            rejected,
            processor_fallbacks,
        })
    }

    /// Скейлер на всех строках, лес на отмасштабированных признаках
    pub fn fit(
        features: &Array2<f64>,
        targets: &Array1<f64>,
        params: &ForestParams,
    ) -> Result<TrainedArtifact, ModelError> {
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(features)?;
        let model = RandomForestRegressor::fit(&scaled, targets, params)?;
        Ok(TrainedArtifact::new(scaler, model))
    }
}
