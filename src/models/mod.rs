/// ML модели

pub mod artifacts;
pub mod forest;

pub use artifacts::{ArtifactStore, TrainedArtifact};
pub use forest::{ForestParams, RandomForestRegressor};
