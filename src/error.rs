//! Ошибки библиотеки

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::types::SpecField;

/// Что не так с конкретным полем
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum FieldProblem {
    Missing,
    NotNumeric { value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldIssue {
    pub field: SpecField,
    #[serde(flatten)]
    pub problem: FieldProblem,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            FieldProblem::Missing => write!(f, "'{}' is missing", self.field),
            FieldProblem::NotNumeric { value } => {
                write!(f, "'{}' is not numeric: {:?}", self.field, value)
            }
        }
    }
}

/// Некорректная запись спецификации. Содержит все проблемные поля сразу.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn fields(&self) -> Vec<SpecField> {
        self.issues.iter().map(|i| i.field).collect()
    }

    pub fn is_missing(&self, field: SpecField) -> bool {
        self.issues
            .iter()
            .any(|i| i.field == field && i.problem == FieldProblem::Missing)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid phone specs: ")?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Ошибки скейлера и леса
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Empty dataset")]
    EmptyDataset,

    #[error("Model not fitted")]
    NotFitted,

    #[error("Expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Features have {rows} rows but targets have {targets}")]
    LengthMismatch { rows: usize, targets: usize },

    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset not found at {0}")]
    NotFound(PathBuf),

    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset has no column '{0}'")]
    MissingColumn(String),

    #[error("Dataset is empty")]
    Empty,

    #[error("No valid rows after cleaning ({rejected} of {total} rejected)")]
    NoValidRows { total: usize, rejected: usize },
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to access artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed artifact {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Incompatible artifact {path}: {reason}")]
    Incompatible { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("Model fitting failed: {0}")]
    Model(#[from] ModelError),
}

/// Ошибки пути предсказания
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PredictError {
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::Validation(_) => "validation_error",
            PredictError::ServiceUnavailable(_) => "service_unavailable",
            PredictError::Internal(_) => "internal_error",
        }
    }
}

impl From<ModelError> for PredictError {
    fn from(err: ModelError) -> Self {
        PredictError::Internal(err.to_string())
    }
}
