// Electricity price and consumption domain models
use super::dataset::ValueSeries;
use super::observation::DateWindow;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyElectricity {
    pub start_time: i64,
    pub price: Option<f64>,
    pub consumption: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyElectricity {
    pub date: String,
    pub price: Option<f64>,
    pub consumption: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElectricityBatch {
    pub hourly: Vec<HourlyElectricity>,
    pub daily: Vec<DailyElectricity>,
    pub dates: DateWindow,
    pub month_average_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyElectricitySeries {
    pub time_axis: Vec<i64>,
    pub price: ValueSeries,
    pub consumption: ValueSeries,
    pub annotations: Vec<i64>,
    /// Index of the sample covering the current hour
    pub current_index: Option<usize>,
    pub x_tick_ms: i64,
    pub price_range: [f64; 2],
    pub consumption_range: [f64; 2],
    pub annotation_range: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyElectricitySeries {
    pub dates: Vec<String>,
    pub price: ValueSeries,
    pub consumption: ValueSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedElectricity {
    pub dates: DateWindow,
    pub hourly: HourlyElectricitySeries,
    pub daily: DailyElectricitySeries,
    pub month_average_price: Option<f64>,
}
