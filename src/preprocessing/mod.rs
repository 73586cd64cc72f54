/// Модуль предобработки данных

pub mod feature_engineering;
pub mod normalization;
pub mod processor;

pub use feature_engineering::{FeatureEngineer, NormalizedSpec};
pub use normalization::StandardScaler;
pub use processor::{ClockSource, ProcessorClock, DEFAULT_CLOCK_GHZ};
