// Mapper from upstream JSON payloads to domain models.
// Fields are always looked up by key, never by position.
use crate::domain::electricity::{DailyElectricity, ElectricityBatch, HourlyElectricity};
use crate::domain::error::AlignError;
use crate::domain::observation::{
    DateSpan, DateWindow, DeviceReading, DisplayMode, FieldValues, Observation, ObservationBatch,
};
use crate::domain::weather::{WeatherReport, WeatherSample};
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

const TIMESTAMP_KEYS: [&str; 3] = ["recorded", "weather-recorded", "time"];
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Milliseconds since epoch from either a number or a date-time string.
/// Strings without an offset are read as UTC.
pub fn parse_timestamp(field: &str, value: &Value) -> Result<i64, AlignError> {
    let malformed = || AlignError::MalformedTimestamp {
        field: field.to_string(),
        value: value.to_string(),
    };

    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .ok_or_else(malformed),
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.timestamp_millis());
            }
            NAIVE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
                .map(|naive| naive.and_utc().timestamp_millis())
                .ok_or_else(malformed)
        }
        _ => Err(malformed()),
    }
}

fn required_timestamp(object: &Value, key: &str) -> Result<i64, AlignError> {
    match object.get(key) {
        Some(Value::Null) | None => Err(AlignError::MissingField(key.to_string())),
        Some(value) => parse_timestamp(key, value),
    }
}

fn optional_timestamp(object: &Value, key: &str) -> Result<Option<i64>, AlignError> {
    match object.get(key) {
        Some(Value::Null) | None => Ok(None),
        Some(value) => parse_timestamp(key, value).map(Some),
    }
}

/// Numeric fields of an object; nulls are kept as None, other types skipped
fn numeric_fields(object: &Value, skip: &[&str]) -> FieldValues {
    let mut fields = FieldValues::new();
    if let Some(map) = object.as_object() {
        for (key, value) in map {
            if skip.contains(&key.as_str()) {
                continue;
            }
            match value {
                Value::Number(n) => {
                    fields.insert(key.clone(), n.as_f64());
                }
                Value::Null => {
                    fields.insert(key.clone(), None);
                }
                _ => {}
            }
        }
    }
    fields
}

pub fn observation_from_json(object: &Value, mode: DisplayMode) -> Result<Observation, AlignError> {
    let (recorded, weather_recorded) = match mode {
        DisplayMode::All => (
            required_timestamp(object, "recorded")?,
            optional_timestamp(object, "weather-recorded")?,
        ),
        DisplayMode::WeatherOnly => {
            // Weather-only observations are keyed by "time", older ones by "recorded"
            let recorded = match optional_timestamp(object, "time")? {
                Some(time) => time,
                None => required_timestamp(object, "recorded")?,
            };
            (recorded, Some(recorded))
        }
    };

    let mut observation = Observation::new(recorded);
    observation.weather_recorded = weather_recorded;
    observation.beacon_name = text(object, "beacon-name");
    observation.fields = numeric_fields(object, &TIMESTAMP_KEYS);
    Ok(observation)
}

pub fn device_reading_from_json(object: &Value) -> Result<DeviceReading, AlignError> {
    let recorded = required_timestamp(object, "recorded")?;
    let device = object
        .get("location")
        .and_then(Value::as_str)
        .ok_or_else(|| AlignError::MissingField("location".to_string()))?;

    let mut reading = DeviceReading::new(recorded, device);
    reading.values = numeric_fields(object, &["recorded", "id"]);
    Ok(reading)
}

fn text(object: &Value, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

fn date_span(span: Option<&Value>) -> DateSpan {
    match span {
        Some(span) => DateSpan {
            start: text(span, "start"),
            end: text(span, "end"),
        },
        None => DateSpan::default(),
    }
}

/// `obs-dates` carries the data bounds as a `min-max` span
fn observation_dates(dates: Option<&Value>) -> DateWindow {
    let Some(dates) = dates else {
        return DateWindow::default();
    };
    let bounds = date_span(dates.get("min-max"));
    DateWindow {
        current: date_span(dates.get("current")),
        min: bounds.start,
        max: bounds.end,
    }
}

/// Electricity `dates` carries the data bounds as separate `min` and `max`
fn electricity_dates(dates: Option<&Value>) -> DateWindow {
    let Some(dates) = dates else {
        return DateWindow::default();
    };
    DateWindow {
        current: date_span(dates.get("current")),
        min: text(dates, "min"),
        max: text(dates, "max"),
    }
}

fn weather_sample(object: &Value) -> Result<Option<WeatherSample>, AlignError> {
    if !object.is_object() {
        return Ok(None);
    }
    let number = |key: &str| object.get(key).and_then(Value::as_f64);

    Ok(Some(WeatherSample {
        time: optional_timestamp(object, "time")?,
        temperature: number("temperature"),
        cloudiness: number("cloudiness"),
        wind_speed: number("wind-speed"),
        wind_direction: object
            .get("wind-direction")
            .and_then(|d| text(d, "long")),
        precipitation: number("precipitation"),
    }))
}

/// First weather description of an OpenWeatherMap entry
fn owm_description(entry: Option<&Value>) -> Option<String> {
    entry
        .and_then(|e| e.get("weather"))
        .and_then(|w| w.get(0))
        .and_then(|w| text(w, "description"))
}

/// OpenWeatherMap reports sunrise and sunset in epoch seconds
fn owm_seconds(entry: Option<&Value>, key: &str) -> Option<i64> {
    entry
        .and_then(|e| e.get(key))
        .and_then(Value::as_i64)
        .and_then(|secs| secs.checked_mul(1000))
}

/// Decode `weather-data`. In weather-only mode the object is the current FMI
/// sample itself; otherwise it nests FMI and OpenWeatherMap reports.
pub fn weather_from_json(
    weather: &Value,
    mode: DisplayMode,
) -> Result<Option<WeatherReport>, AlignError> {
    if !weather.is_object() {
        return Ok(None);
    }

    match mode {
        DisplayMode::WeatherOnly => Ok(Some(WeatherReport {
            current: weather_sample(weather)?,
            ..WeatherReport::default()
        })),
        DisplayMode::All => {
            let fmi = weather.get("fmi");
            let sample = |key: &str| match fmi.and_then(|f| f.get(key)) {
                Some(value) => weather_sample(value),
                None => Ok(None),
            };
            let owm_current = weather.get("owm").and_then(|o| o.get("current"));
            let owm_forecast = weather.get("owm").and_then(|o| o.get("forecast"));

            Ok(Some(WeatherReport {
                current: sample("current")?,
                forecast: sample("forecast")?,
                description: owm_description(owm_current),
                forecast_description: owm_description(owm_forecast),
                sunrise: owm_seconds(owm_current, "sunrise"),
                sunset: owm_seconds(owm_current, "sunset"),
            }))
        }
    }
}

fn array<'a>(payload: &'a Value, key: &str) -> &'a [Value] {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Decode a `data/display` payload
pub fn batch_from_json(payload: &Value) -> Result<ObservationBatch, AlignError> {
    let mode = DisplayMode::from_wire(payload.get("mode").and_then(Value::as_str));
    let mut batch = ObservationBatch::new(mode);

    batch.observations = array(payload, "obs-data")
        .iter()
        .map(|o| observation_from_json(o, mode))
        .collect::<Result<_, _>>()?;

    if mode == DisplayMode::All {
        batch.device_readings = array(payload, "rt-data")
            .iter()
            .map(device_reading_from_json)
            .collect::<Result<_, _>>()?;
        batch.device_labels = array(payload, "rt-names")
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }

    batch.dates = observation_dates(payload.get("obs-dates"));
    batch.weather = match payload.get("weather-data") {
        Some(weather) => weather_from_json(weather, mode)?,
        None => None,
    };
    Ok(batch)
}

/// Decode a `data/elec-data` payload. Error payloads are handled by the caller.
pub fn electricity_from_json(payload: &Value) -> Result<ElectricityBatch, AlignError> {
    let hourly = array(payload, "data-hour")
        .iter()
        .map(|row| {
            Ok(HourlyElectricity {
                start_time: required_timestamp(row, "start-time")?,
                price: row.get("price").and_then(Value::as_f64),
                consumption: row.get("consumption").and_then(Value::as_f64),
            })
        })
        .collect::<Result<_, AlignError>>()?;

    let daily = array(payload, "data-day")
        .iter()
        .filter(|row| !row.is_null())
        .map(|row| {
            let date = row
                .get("date")
                .and_then(Value::as_str)
                .ok_or_else(|| AlignError::MissingField("date".to_string()))?;
            Ok(DailyElectricity {
                date: date.to_string(),
                price: row.get("price").and_then(Value::as_f64),
                consumption: row.get("consumption").and_then(Value::as_f64),
            })
        })
        .collect::<Result<_, AlignError>>()?;

    Ok(ElectricityBatch {
        hourly,
        daily,
        dates: electricity_dates(payload.get("dates")),
        month_average_price: payload.get("elec-price-avg").and_then(Value::as_f64),
    })
}
