//! Mobile Price - оценка цены телефона по характеристикам
//!
//! Обучение (CSV -> очистка -> скейлер + случайный лес -> артефакты) и сервис
//! предсказаний, который использует ту же нормализацию признаков.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod types;

pub use error::{ArtifactError, DatasetError, ModelError, PredictError, TrainingError, ValidationError};
pub use models::*;
pub use pipeline::{PredictionService, TrainingConfig, TrainingPipeline};
pub use preprocessing::*;
pub use types::*;
