//! Хранение обученных артефактов (скейлер + модель) на диске

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, ModelError};
use crate::models::forest::RandomForestRegressor;
use crate::preprocessing::StandardScaler;
use crate::types::{FeatureVector, SpecField, TrainingReport, FEATURE_COUNT};

pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "model.json";
pub const REPORT_FILE: &str = "training_report.json";

/// Версия формата файлов; при несовпадении артефакт не загружается
pub const FORMAT_VERSION: u32 = 1;

/// Обертка, общая для файлов скейлера и модели
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    format_version: u32,
    feature_names: Vec<String>,
    created_at: DateTime<Utc>,
    payload: T,
}

/// Результат обучения: неизменяем после создания, на сервисе только читается
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedArtifact {
    pub scaler: StandardScaler,
    pub model: RandomForestRegressor,
    pub created_at: DateTime<Utc>,
}

impl TrainedArtifact {
    pub fn new(scaler: StandardScaler, model: RandomForestRegressor) -> Self {
        Self {
            scaler,
            model,
            created_at: Utc::now(),
        }
    }

    /// Скейлинг + инференс для одного вектора
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let scaled = self.scaler.transform_vector(features)?;
        let prediction = self.model.predict_one(&scaled)?;
        if !prediction.is_finite() {
            return Err(ModelError::NonFinite("prediction"));
        }
        Ok(prediction)
    }
}

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(SCALER_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }

    /// Записывает артефакты, перезаписывая результаты предыдущего обучения
    pub fn save(&self, artifact: &TrainedArtifact) -> Result<(), ArtifactError> {
        fs::create_dir_all(&self.dir).map_err(|source| ArtifactError::Io {
            path: self.dir.clone(),
            source,
        })?;

        // сначала оба временных файла, потом rename; обрыв между rename ловит load
        let scaler_tmp = tmp_path(&self.scaler_path());
        let model_tmp = tmp_path(&self.model_path());
        write_json(&scaler_tmp, &envelope(&artifact.scaler, artifact.created_at))?;
        write_json(&model_tmp, &envelope(&artifact.model, artifact.created_at))?;
        replace(&scaler_tmp, &self.scaler_path())?;
        replace(&model_tmp, &self.model_path())?;

        tracing::info!(dir = %self.dir.display(), "Artifacts saved");
        Ok(())
    }

    pub fn save_report(&self, report: &TrainingReport) -> Result<(), ArtifactError> {
        let tmp = tmp_path(&self.report_path());
        write_json(&tmp, report)?;
        replace(&tmp, &self.report_path())
    }

    pub fn load(&self) -> Result<TrainedArtifact, ArtifactError> {
        let scaler_path = self.scaler_path();
        let model_path = self.model_path();

        let scaler_envelope: Envelope<StandardScaler> = read_json(&scaler_path)?;
        check_envelope(&scaler_path, &scaler_envelope)?;
        let model_envelope: Envelope<RandomForestRegressor> = read_json(&model_path)?;
        check_envelope(&model_path, &model_envelope)?;

        // скейлер и модель должны быть из одного обучения
        if scaler_envelope.created_at != model_envelope.created_at {
            return Err(incompatible(
                &model_path,
                &format!(
                    "model trained at {} but scaler at {}",
                    model_envelope.created_at, scaler_envelope.created_at
                ),
            ));
        }

        let scaler = scaler_envelope.payload;
        if !scaler.is_fitted() || scaler.n_features() != Some(FEATURE_COUNT) {
            return Err(incompatible(&scaler_path, "scaler is not fitted for 8 features"));
        }

        let model = model_envelope.payload;
        if model.n_features() != FEATURE_COUNT || !model.is_well_formed() {
            return Err(incompatible(&model_path, "model is malformed or not fitted for 8 features"));
        }

        tracing::info!(
            dir = %self.dir.display(),
            n_trees = model.n_trees(),
            trained_at = %model_envelope.created_at,
            "Artifacts loaded"
        );

        Ok(TrainedArtifact {
            scaler,
            model,
            created_at: model_envelope.created_at,
        })
    }
}

fn envelope<T>(payload: T, created_at: DateTime<Utc>) -> Envelope<T> {
    Envelope {
        format_version: FORMAT_VERSION,
        feature_names: SpecField::feature_names(),
        created_at,
        payload,
    }
}

fn check_envelope<T>(path: &Path, envelope: &Envelope<T>) -> Result<(), ArtifactError> {
    if envelope.format_version != FORMAT_VERSION {
        return Err(incompatible(
            path,
            &format!(
                "format version {} (expected {})",
                envelope.format_version, FORMAT_VERSION
            ),
        ));
    }
    if envelope.feature_names != SpecField::feature_names() {
        return Err(incompatible(
            path,
            &format!("feature order {:?} differs from current", envelope.feature_names),
        ));
    }
    Ok(())
}

fn incompatible(path: &Path, reason: &str) -> ArtifactError {
    ArtifactError::Incompatible {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|source| ArtifactError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_err)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn replace(from: &Path, to: &Path) -> Result<(), ArtifactError> {
    fs::rename(from, to).map_err(|source| ArtifactError::Io {
        path: to.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let file = File::open(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ArtifactError::Format {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forest::ForestParams;
    use crate::preprocessing::FeatureEngineer;
    use ndarray::Array1;
    use tempfile::tempdir;

    fn fitted_artifact() -> (TrainedArtifact, Vec<FeatureVector>) {
        let rows: Vec<FeatureVector> = (0..12)
            .map(|i| {
                let i = i as f64;
                FeatureVector::new([
                    160.0 + i * 5.0,
                    4.0 + (i % 3.0) * 2.0,
                    8.0 + i,
                    48.0,
                    2.0 + i * 0.1,
                    4000.0 + i * 100.0,
                    6.0 + i * 0.05,
                    2020.0 + (i % 4.0),
                ])
            })
            .collect();
        let features = FeatureEngineer::build_matrix(&rows);
        let y = Array1::from_shape_fn(rows.len(), |i| 10_000.0 + 2_500.0 * i as f64);

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&features).unwrap();
        let params = ForestParams {
            n_trees: 10,
            ..ForestParams::default()
        };
        let model = RandomForestRegressor::fit(&scaled, &y, &params).unwrap();
        (TrainedArtifact::new(scaler, model), rows)
    }

    #[test]
    fn test_save_and_load_preserves_predictions() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("artifacts"));
        let (artifact, rows) = fitted_artifact();

        store.save(&artifact).unwrap();
        assert!(store.scaler_path().exists());
        assert!(store.model_path().exists());

        let loaded = store.load().unwrap();
        for row in &rows {
            assert_eq!(artifact.predict(row).unwrap(), loaded.predict(row).unwrap());
        }
        assert_eq!(loaded.model, artifact.model);
        assert_eq!(loaded.scaler, artifact.scaler);
    }

    #[test]
    fn test_load_missing_artifacts() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(store.load(), Err(ArtifactError::Io { .. })));
    }

    #[test]
    fn test_load_garbage_artifact() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (artifact, _) = fitted_artifact();
        store.save(&artifact).unwrap();
        fs::write(store.model_path(), b"not json").unwrap();

        assert!(matches!(store.load(), Err(ArtifactError::Format { .. })));
    }

    #[test]
    fn test_load_rejects_scaler_and_model_from_different_runs() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (old, _) = fitted_artifact();
        store.save(&old).unwrap();
        let old_model = fs::read(store.model_path()).unwrap();

        let (new, _) = fitted_artifact();
        assert_ne!(old.created_at, new.created_at);
        store.save(&new).unwrap();
        // переобучение оборвалось после записи скейлера
        fs::write(store.model_path(), old_model).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, ArtifactError::Incompatible { .. }));
        assert!(err.to_string().contains("scaler at"));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (artifact, _) = fitted_artifact();
        store.save(&artifact).unwrap();
        store.save(&artifact).unwrap();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, [MODEL_FILE, SCALER_FILE]);
        assert_eq!(store.load().unwrap().created_at, artifact.created_at);
    }

    #[test]
    fn test_load_rejects_other_feature_order() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (artifact, _) = fitted_artifact();

        let mut names = SpecField::feature_names();
        names.swap(0, 1);
        let foreign = Envelope {
            format_version: FORMAT_VERSION,
            feature_names: names,
            created_at: artifact.created_at,
            payload: &artifact.scaler,
        };
        store.save(&artifact).unwrap();
        write_json(&store.scaler_path(), &foreign).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, ArtifactError::Incompatible { .. }));
        assert!(err.to_string().contains("feature order"));
    }
}
