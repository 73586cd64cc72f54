//! Перевод названия процессора в тактовую частоту (ГГц)

use serde::Serialize;

/// Частота для процессоров, которых нет в таблице
pub const DEFAULT_CLOCK_GHZ: f64 = 2.0;

/// Фрагмент названия -> максимальная частота. Порядок важен: побеждает первое совпадение,
/// поэтому более длинные названия стоят раньше своих префиксов ("Google Tensor G3" до "Google Tensor").
const PROCESSOR_SPEEDS: &[(&str, f64)] = &[
    // Apple
    ("A17 Pro", 3.78),
    ("A17 Bionic", 3.78),
    ("A16 Bionic", 3.46),
    ("A15 Bionic", 3.23),
    ("A14 Bionic", 3.1),
    ("A13 Bionic", 2.65),
    ("A12 Bionic", 2.5),
    ("A11 Bionic", 2.4),
    // Snapdragon
    ("Snapdragon 8 Gen 3", 3.3),
    ("Snapdragon 8 Gen 2", 3.2),
    ("Snapdragon 8+ Gen 1", 3.2),
    ("Snapdragon 8 Gen 1", 3.0),
    ("Snapdragon 7+ Gen 2", 2.91),
    ("Snapdragon 7 Gen 1", 2.4),
    // MediaTek
    ("MediaTek Dimensity 9300", 3.25),
    ("MediaTek Dimensity 9200", 3.05),
    ("MediaTek Dimensity 9000", 3.05),
    ("MediaTek Dimensity 8300", 3.35),
    ("MediaTek Dimensity 8200", 3.1),
    // Exynos
    ("Exynos 2400", 3.2),
    ("Exynos 2200", 2.8),
    ("Exynos 1380", 2.4),
    // Google
    ("Google Tensor G3", 2.91),
    ("Google Tensor G2", 2.85),
    ("Google Tensor", 2.8),
];

/// Откуда взялась частота
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ClockSource {
    /// Совпадение с фрагментом из таблицы
    Table(&'static str),
    /// Значение уже было частотой ("2.4", "2.4 GHz" или число)
    Literal,
    /// Процессор не распознан, взято `DEFAULT_CLOCK_GHZ`
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProcessorClock {
    pub ghz: f64,
    pub source: ClockSource,
}

impl ProcessorClock {
    pub fn resolve(name: &str) -> Self {
        let lowered = name.to_lowercase();

        if let Some((fragment, ghz)) = PROCESSOR_SPEEDS
            .iter()
            .find(|(fragment, _)| lowered.contains(&fragment.to_lowercase()))
        {
            return Self {
                ghz: *ghz,
                source: ClockSource::Table(fragment),
            };
        }

        if let Some(ghz) = parse_clock_literal(name) {
            return Self::literal(ghz);
        }

        tracing::debug!(processor = name, "Unmapped processor, using {} GHz", DEFAULT_CLOCK_GHZ);
        Self {
            ghz: DEFAULT_CLOCK_GHZ,
            source: ClockSource::Fallback,
        }
    }

    pub fn literal(ghz: f64) -> Self {
        Self {
            ghz,
            source: ClockSource::Literal,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == ClockSource::Fallback
    }

    pub fn known_processors() -> impl Iterator<Item = (&'static str, f64)> {
        PROCESSOR_SPEEDS.iter().copied()
    }
}

fn parse_clock_literal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let number = match trimmed.len().checked_sub(3).and_then(|i| trimmed.get(i..).map(|s| (i, s))) {
        Some((i, suffix)) if suffix.eq_ignore_ascii_case("ghz") => trimmed[..i].trim_end(),
        _ => trimmed,
    };
    number.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}
