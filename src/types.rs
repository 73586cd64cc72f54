/// Типы данных для модели цены телефона

use serde::{Deserialize, Serialize};
use std::fmt;

/// Количество признаков в векторе
pub const FEATURE_COUNT: usize = 8;

/// Поля спецификации телефона в порядке, в котором модель их видит
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecField {
    #[serde(rename = "Mobile Weight")]
    MobileWeight,
    #[serde(rename = "RAM")]
    Ram,
    #[serde(rename = "Front Camera")]
    FrontCamera,
    #[serde(rename = "Back Camera")]
    BackCamera,
    #[serde(rename = "Processor")]
    Processor,
    #[serde(rename = "Battery Capacity")]
    BatteryCapacity,
    #[serde(rename = "Screen Size")]
    ScreenSize,
    #[serde(rename = "Launched Year")]
    LaunchedYear,
}

impl SpecField {
    /// Порядок признаков. Менять только вместе с переобучением модели.
    pub const ALL: [SpecField; FEATURE_COUNT] = [
        SpecField::MobileWeight,
        SpecField::Ram,
        SpecField::FrontCamera,
        SpecField::BackCamera,
        SpecField::Processor,
        SpecField::BatteryCapacity,
        SpecField::ScreenSize,
        SpecField::LaunchedYear,
    ];

    /// Имя колонки в датасете и ключ в JSON запросе
    pub fn column_name(self) -> &'static str {
        match self {
            SpecField::MobileWeight => "Mobile Weight",
            SpecField::Ram => "RAM",
            SpecField::FrontCamera => "Front Camera",
            SpecField::BackCamera => "Back Camera",
            SpecField::Processor => "Processor",
            SpecField::BatteryCapacity => "Battery Capacity",
            SpecField::ScreenSize => "Screen Size",
            SpecField::LaunchedYear => "Launched Year",
        }
    }

    /// Суффиксы единиц измерения, которые срезаются перед парсингом числа
    pub fn unit_suffixes(self) -> &'static [&'static str] {
        match self {
            SpecField::MobileWeight => &["g"],
            SpecField::Ram => &["GB"],
            SpecField::FrontCamera | SpecField::BackCamera => &["MP"],
            SpecField::BatteryCapacity => &["mAh"],
            SpecField::ScreenSize => &["inches", "inch", "\""],
            SpecField::Processor | SpecField::LaunchedYear => &[],
        }
    }

    pub fn feature_names() -> Vec<String> {
        Self::ALL.iter().map(|f| f.column_name().to_string()).collect()
    }
}

impl fmt::Display for SpecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Значение поля: в датасете это строка с единицами ("200g"), в запросе обычно число
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Сырая запись спецификации (строка датасета или тело запроса)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSpecRecord {
    #[serde(rename = "Mobile Weight", default)]
    pub mobile_weight: Option<FieldValue>,
    #[serde(rename = "RAM", default)]
    pub ram: Option<FieldValue>,
    #[serde(rename = "Front Camera", default)]
    pub front_camera: Option<FieldValue>,
    #[serde(rename = "Back Camera", default)]
    pub back_camera: Option<FieldValue>,
    #[serde(rename = "Processor", default)]
    pub processor: Option<FieldValue>,
    #[serde(rename = "Battery Capacity", default)]
    pub battery_capacity: Option<FieldValue>,
    #[serde(rename = "Screen Size", default)]
    pub screen_size: Option<FieldValue>,
    #[serde(rename = "Launched Year", default)]
    pub launched_year: Option<FieldValue>,
}

impl RawSpecRecord {
    pub fn get(&self, field: SpecField) -> Option<&FieldValue> {
        match field {
            SpecField::MobileWeight => self.mobile_weight.as_ref(),
            SpecField::Ram => self.ram.as_ref(),
            SpecField::FrontCamera => self.front_camera.as_ref(),
            SpecField::BackCamera => self.back_camera.as_ref(),
            SpecField::Processor => self.processor.as_ref(),
            SpecField::BatteryCapacity => self.battery_capacity.as_ref(),
            SpecField::ScreenSize => self.screen_size.as_ref(),
            SpecField::LaunchedYear => self.launched_year.as_ref(),
        }
    }

    pub fn set(&mut self, field: SpecField, value: Option<FieldValue>) {
        let slot = match field {
            SpecField::MobileWeight => &mut self.mobile_weight,
            SpecField::Ram => &mut self.ram,
            SpecField::FrontCamera => &mut self.front_camera,
            SpecField::BackCamera => &mut self.back_camera,
            SpecField::Processor => &mut self.processor,
            SpecField::BatteryCapacity => &mut self.battery_capacity,
            SpecField::ScreenSize => &mut self.screen_size,
            SpecField::LaunchedYear => &mut self.launched_year,
        };
        *slot = value;
    }

    pub fn with(mut self, field: SpecField, value: impl Into<FieldValue>) -> Self {
        self.set(field, Some(value.into()));
        self
    }
}

/// Вектор признаков фиксированной длины, порядок = `SpecField::ALL`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, field: SpecField) -> f64 {
        self.0[field as usize]
    }

    pub fn to_array(&self) -> ndarray::Array1<f64> {
        ndarray::Array1::from(self.0.to_vec())
    }
}

/// Строка обучающего датасета: спецификация + сырая цена
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    /// Номер строки в файле (1 = первая строка данных после заголовка)
    pub row: usize,
    pub spec: RawSpecRecord,
    pub price: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: f64,
}

/// Причина, по которой строка не попала в обучение
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowRejection {
    pub row: usize,
    pub reason: String,
}

/// Метрики на отложенной выборке
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub n_samples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldoutEvaluation {
    pub train_rows: usize,
    pub holdout_rows: usize,
    pub forest: RegressionMetrics,
    /// Линейная модель для сравнения (None, если не удалось обучить)
    pub linear_baseline: Option<RegressionMetrics>,
}

/// Отчет об обучении, сохраняется рядом с артефактами
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub dataset: String,
    pub target_column: String,
    pub rows_total: usize,
    pub rows_used: usize,
    pub rejected: Vec<RowRejection>,
    pub processor_fallbacks: usize,
    pub feature_names: Vec<String>,
    pub n_trees: usize,
    pub evaluation: Option<HoldoutEvaluation>,
}
