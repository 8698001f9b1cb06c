// Observation domain models
use super::weather::WeatherReport;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Named numeric fields of a single sample. A `None` value means the field
/// was reported as null; a missing key means it was not reported at all.
pub type FieldValues = BTreeMap<String, Option<f64>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub recorded: i64,
    pub weather_recorded: Option<i64>,
    pub beacon_name: Option<String>,
    pub fields: FieldValues,
}

impl Observation {
    pub fn new(recorded: i64) -> Self {
        Self {
            recorded,
            weather_recorded: None,
            beacon_name: None,
            fields: FieldValues::new(),
        }
    }

    #[cfg(test)]
    pub fn with_weather_recorded(mut self, weather_recorded: i64) -> Self {
        self.weather_recorded = Some(weather_recorded);
        self
    }

    #[cfg(test)]
    pub fn with_field(mut self, key: &str, value: Option<f64>) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn value(&self, key: &str) -> Option<f64> {
        self.fields.get(key).copied().flatten()
    }
}

/// A reading from an auxiliary device, e.g. a RuuviTag in a named location.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReading {
    pub recorded: i64,
    pub device: String,
    pub values: FieldValues,
}

impl DeviceReading {
    pub fn new(recorded: i64, device: &str) -> Self {
        Self {
            recorded,
            device: device.to_string(),
            values: FieldValues::new(),
        }
    }

    #[cfg(test)]
    pub fn with_value(mut self, key: &str, value: Option<f64>) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    /// Indoor sensors, beacon, auxiliary devices and weather
    All,
    WeatherOnly,
}

impl DisplayMode {
    pub fn from_wire(mode: Option<&str>) -> Self {
        match mode {
            Some("all") => DisplayMode::All,
            _ => DisplayMode::WeatherOnly,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DateSpan {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// The currently shown dates and the dates that hold any data at all
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DateWindow {
    pub current: DateSpan,
    pub min: Option<String>,
    pub max: Option<String>,
}

/// Everything one display-data fetch returned, already decoded.
#[derive(Debug, Clone)]
pub struct ObservationBatch {
    pub mode: DisplayMode,
    pub observations: Vec<Observation>,
    pub device_readings: Vec<DeviceReading>,
    /// Every device expected in the view, including ones with no readings
    pub device_labels: Vec<String>,
    pub dates: DateWindow,
    pub weather: Option<WeatherReport>,
}

impl ObservationBatch {
    pub fn new(mode: DisplayMode) -> Self {
        Self {
            mode,
            observations: Vec::new(),
            device_readings: Vec::new(),
            device_labels: Vec::new(),
            dates: DateWindow::default(),
            weather: None,
        }
    }

    /// First non-null beacon name in the batch
    pub fn beacon_name(&self) -> Option<&str> {
        self.observations
            .iter()
            .find_map(|o| o.beacon_name.as_deref())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }
}
