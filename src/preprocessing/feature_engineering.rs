//! Feature engineering: сырая спецификация -> вектор признаков
//!
//! Единственная реализация нормализации, которой пользуются и обучение, и сервис.

use ndarray::Array2;

use crate::error::{FieldIssue, FieldProblem, ValidationError};
use crate::preprocessing::processor::ProcessorClock;
use crate::types::{FeatureVector, FieldValue, RawSpecRecord, SpecField, FEATURE_COUNT};

/// Результат нормализации одной записи
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedSpec {
    pub features: FeatureVector,
    pub processor: ProcessorClock,
}

pub struct FeatureEngineer;

impl FeatureEngineer {
    pub fn to_feature_vector(record: &RawSpecRecord) -> Result<FeatureVector, ValidationError> {
        Self::normalize(record).map(|n| n.features)
    }

    pub fn normalize(record: &RawSpecRecord) -> Result<NormalizedSpec, ValidationError> {
        let mut values = [0.0; FEATURE_COUNT];
        let mut issues = Vec::new();
        let mut processor = None;

        for (idx, field) in SpecField::ALL.iter().copied().enumerate() {
            let parsed = match record.get(field) {
                None => Err(FieldProblem::Missing),
                Some(value) if field == SpecField::Processor => {
                    Self::processor_clock(value).map(|clock| {
                        processor = Some(clock);
                        clock.ghz
                    })
                }
                Some(value) => Self::parse_numeric(field, value),
            };

            match parsed {
                Ok(v) => values[idx] = v,
                Err(problem) => issues.push(FieldIssue { field, problem }),
            }
        }

        match processor {
            Some(processor) if issues.is_empty() => Ok(NormalizedSpec {
                features: FeatureVector::new(values),
                processor,
            }),
            _ => Err(ValidationError { issues }),
        }
    }

    /// Число с единицами измерения ("5,000 mAh") -> 5000.0
    pub fn parse_numeric(field: SpecField, value: &FieldValue) -> Result<f64, FieldProblem> {
        let text = match value {
            FieldValue::Number(n) if n.is_finite() => return Ok(*n),
            FieldValue::Number(n) => {
                return Err(FieldProblem::NotNumeric {
                    value: n.to_string(),
                })
            }
            FieldValue::Text(text) => text,
        };

        let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
        if cleaned.is_empty() {
            return Err(FieldProblem::Missing);
        }

        let number = Self::strip_unit(&cleaned, field.unit_suffixes());
        number
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| FieldProblem::NotNumeric {
                value: text.clone(),
            })
    }

    /// Срезает первый подходящий суффикс (без учета регистра) и пробелы перед ним
    pub fn strip_unit<'a>(text: &'a str, suffixes: &[&str]) -> &'a str {
        let text = text.trim();
        for suffix in suffixes {
            let Some(start) = text.len().checked_sub(suffix.len()) else {
                continue;
            };
            if let Some(tail) = text.get(start..) {
                if tail.eq_ignore_ascii_case(suffix) {
                    return text[..start].trim_end();
                }
            }
        }
        text
    }

    fn processor_clock(value: &FieldValue) -> Result<ProcessorClock, FieldProblem> {
        match value {
            // число идет тем же путем, что и текст из CSV
            FieldValue::Number(ghz) if ghz.is_finite() => Ok(ProcessorClock::resolve(&ghz.to_string())),
            FieldValue::Number(ghz) => Err(FieldProblem::NotNumeric {
                value: ghz.to_string(),
            }),
            FieldValue::Text(name) if name.trim().is_empty() => Err(FieldProblem::Missing),
            FieldValue::Text(name) => Ok(ProcessorClock::resolve(name)),
        }
    }

    /// Матрица признаков (строка = запись) в порядке `SpecField::ALL`
    pub fn build_matrix(vectors: &[FeatureVector]) -> Array2<f64> {
        let mut features = Array2::zeros((vectors.len(), FEATURE_COUNT));
        for (i, vector) in vectors.iter().enumerate() {
            for (j, value) in vector.as_slice().iter().enumerate() {
                features[[i, j]] = *value;
            }
        }
        features
    }
}
