// Aligned chart data domain models
use super::observation::{DateWindow, DisplayMode};
use super::weather::WeatherReport;
use serde::Serialize;
use std::collections::BTreeMap;

/// One value per time-axis entry, `None` where nothing was reported.
pub type ValueSeries = Vec<Option<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Weather,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Weather => "weather",
            Category::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtremeValues {
    pub min: f64,
    pub max: f64,
}

impl ExtremeValues {
    /// Used when a field has no plottable values at all
    pub const FALLBACK: ExtremeValues = ExtremeValues { min: -1.0, max: 4.0 };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn as_pair(&self) -> [f64; 2] {
        [self.min, self.max]
    }

    pub fn range(&self) -> f64 {
        (self.max - self.min).abs()
    }
}

/// Axis sizing for a chart widget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisHints {
    pub x_range: Option<[i64; 2]>,
    pub x_tick_ms: i64,
    pub y_range: [f64; 2],
    pub extremes: ExtremeValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySeries {
    pub time_axis: Vec<i64>,
    pub fields: BTreeMap<String, ValueSeries>,
    pub labels: BTreeMap<String, String>,
    pub units: BTreeMap<String, String>,
    pub annotations: Vec<i64>,
    pub axes: AxisHints,
}

impl CategorySeries {
    pub fn len(&self) -> usize {
        self.time_axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_axis.is_empty()
    }

    pub fn field(&self, key: &str) -> Option<&ValueSeries> {
        self.fields.get(key)
    }

    /// Every field has exactly one entry per time-axis entry
    #[cfg(test)]
    pub fn is_consistent(&self) -> bool {
        self.fields.values().all(|v| v.len() == self.time_axis.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSeries {
    pub device: String,
    pub fields: BTreeMap<String, ValueSeries>,
    pub labels: BTreeMap<String, String>,
    pub units: BTreeMap<String, String>,
}

#[cfg(test)]
impl DeviceSeries {
    pub fn field(&self, key: &str) -> Option<&ValueSeries> {
        self.fields.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlignmentWarning {
    /// The device produced more ticks than the primary series has samples,
    /// so its tail cannot be matched against the primary tail.
    DeviceSeriesTooLong {
        device: String,
        length: usize,
        target: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceValues {
    pub device: String,
    pub values: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatestSnapshot {
    pub recorded: Option<i64>,
    pub other: BTreeMap<String, Option<f64>>,
    pub weather_recorded: Option<i64>,
    pub weather: BTreeMap<String, Option<f64>>,
    /// Upstream weather service report, when the payload carried one
    pub weather_report: Option<WeatherReport>,
    /// In device label order
    pub devices: Vec<DeviceValues>,
}

impl LatestSnapshot {
    #[cfg(test)]
    pub fn device(&self, device: &str) -> Option<&BTreeMap<String, Option<f64>>> {
        self.devices
            .iter()
            .find(|d| d.device == device)
            .map(|d| &d.values)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedDataset {
    pub mode: DisplayMode,
    pub dates: DateWindow,
    pub categories: BTreeMap<Category, CategorySeries>,
    /// In device label order
    pub devices: Vec<DeviceSeries>,
    pub device_axes: Option<AxisHints>,
    pub latest: LatestSnapshot,
    pub warnings: Vec<AlignmentWarning>,
}

impl AlignedDataset {
    #[cfg(test)]
    pub fn category(&self, category: Category) -> Option<&CategorySeries> {
        self.categories.get(&category)
    }

    #[cfg(test)]
    pub fn device(&self, label: &str) -> Option<&DeviceSeries> {
        self.devices.iter().find(|d| d.device == label)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.values().all(CategorySeries::is_empty)
    }
}
