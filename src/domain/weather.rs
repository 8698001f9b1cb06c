// Current weather and forecast as reported by the upstream weather services
use serde::Serialize;

/// One FMI weather sample, either the current observation or a forecast
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherSample {
    pub time: Option<i64>,
    pub temperature: Option<f64>,
    pub cloudiness: Option<f64>,
    pub wind_speed: Option<f64>,
    /// Long compass name, e.g. "southwest"
    pub wind_direction: Option<String>,
    pub precipitation: Option<f64>,
}

/// The `weather-data` object of a display payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherReport {
    pub current: Option<WeatherSample>,
    pub forecast: Option<WeatherSample>,
    pub description: Option<String>,
    pub forecast_description: Option<String>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

impl WeatherReport {
    /// Current weather as chart field values, keyed like the weather series
    pub fn current_fields(&self) -> Option<(Option<i64>, Vec<(&'static str, Option<f64>)>)> {
        let current = self.current.as_ref()?;
        Some((
            current.time,
            vec![
                ("fmi-temperature", current.temperature),
                ("cloudiness", current.cloudiness),
                ("wind-speed", current.wind_speed),
            ],
        ))
    }
}
