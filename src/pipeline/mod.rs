/// Обучение и предсказание

pub mod dataset;
pub mod evaluation;
pub mod prediction;
pub mod training;

pub use dataset::{clean_price, DatasetLoader, DEFAULT_TARGET_COLUMN};
pub use prediction::PredictionService;
pub use training::{PreparedData, TrainingConfig, TrainingPipeline};
