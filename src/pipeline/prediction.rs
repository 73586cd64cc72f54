//! Сервис предсказаний: артефакты загружаются один раз при старте

use std::path::Path;
use std::sync::Arc;

use crate::error::PredictError;
use crate::models::{ArtifactStore, TrainedArtifact};
use crate::preprocessing::FeatureEngineer;
use crate::types::RawSpecRecord;

/// Состояние определяется один раз при старте и больше не меняется
#[derive(Debug, Clone)]
pub enum PredictionService {
    Ready(Arc<TrainedArtifact>),
    Unavailable { reason: String },
}

impl PredictionService {
    /// Никогда не падает: при ошибке загрузки сервис работает в режиме Unavailable
    pub fn load(artifacts_dir: &Path) -> Self {
        match ArtifactStore::new(artifacts_dir).load() {
            Ok(artifact) => Self::Ready(Arc::new(artifact)),
            Err(err) => {
                tracing::error!("Failed to load model artifacts: {}", err);
                Self::Unavailable {
                    reason: err.to_string(),
                }
            }
        }
    }

    pub fn from_artifact(artifact: TrainedArtifact) -> Self {
        Self::Ready(Arc::new(artifact))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn predict(&self, record: &RawSpecRecord) -> Result<f64, PredictError> {
        let artifact = match self {
            Self::Ready(artifact) => artifact,
            Self::Unavailable { reason } => {
                return Err(PredictError::ServiceUnavailable(format!(
                    "model not loaded ({})",
                    reason
                )))
            }
        };

        let features = FeatureEngineer::to_feature_vector(record)?;
        let prediction = artifact.predict(&features)?;

        tracing::debug!(?features, prediction, "Prediction made");
        Ok(prediction)
    }
}
