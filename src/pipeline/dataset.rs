//! Загрузка обучающего датасета из CSV

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::DatasetError;
use crate::types::{FieldValue, LabeledRecord, RawSpecRecord, SpecField};

/// Колонка цены по умолчанию
pub const DEFAULT_TARGET_COLUMN: &str = "Launched Price (India)";

const CURRENCY_CODES: &[&str] = &["INR", "USD", "PKR", "CNY", "AED", "Rs.", "Rs"];
// 'â', '‚' ('\u{82}'), '¹' - это "₹", прочитанный как cp1252 или Latin-1
const CURRENCY_SYMBOLS: &[char] = &['₹', '$', '€', '£', '¥', 'â', '‚', '\u{82}', '¹'];

pub struct DatasetLoader;

impl DatasetLoader {
    pub fn load(path: &Path, target_column: &str) -> Result<Vec<LabeledRecord>, DatasetError> {
        let bytes = fs::read(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => DatasetError::NotFound(path.to_path_buf()),
            _ => DatasetError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let records = Self::parse(&Self::decode(bytes), target_column)?;
        tracing::info!(
            path = %path.display(),
            rows = records.len(),
            "Dataset loaded"
        );
        Ok(records)
    }

    /// UTF-8, а если файл не в UTF-8, то Latin-1
    pub fn decode(bytes: Vec<u8>) -> String {
        match String::from_utf8(bytes) {
            Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
            Err(err) => {
                tracing::warn!("Dataset is not valid UTF-8, decoding as Latin-1");
                err.into_bytes().iter().map(|&b| b as char).collect()
            }
        }
    }

    pub fn parse(text: &str, target_column: &str) -> Result<Vec<LabeledRecord>, DatasetError> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
        };

        let mut field_columns = Vec::with_capacity(SpecField::ALL.len());
        for field in SpecField::ALL {
            field_columns.push((field, column(field.column_name())?));
        }
        let target_idx = column(target_column)?;

        let mut records = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let row = result?;
            if row.iter().all(str::is_empty) {
                continue;
            }

            let mut spec = RawSpecRecord::default();
            for &(field, idx) in &field_columns {
                spec.set(field, cell(&row, idx).map(FieldValue::from));
            }

            records.push(LabeledRecord {
                row: i + 1,
                spec,
                price: cell(&row, target_idx).map(str::to_string),
            });
        }

        if records.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(records)
    }
}

fn cell(row: &StringRecord, idx: usize) -> Option<&str> {
    row.get(idx).filter(|v| !v.is_empty())
}

/// "INR 1,09,999" / "₹74,999" / "USD 799" -> число. Нулевая или отрицательная цена = мусор.
pub fn clean_price(raw: &str) -> Option<f64> {
    let mut text = raw.trim().to_string();
    for code in CURRENCY_CODES {
        text = text.replace(code, "");
    }

    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && !CURRENCY_SYMBOLS.contains(c))
        .collect();

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}
