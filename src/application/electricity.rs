// Electricity alignment - Hourly and daily price/consumption chart data
use crate::application::aligner::{extreme_values, x_axis_tick_size, DisplayZone};
use crate::domain::electricity::{
    AlignedElectricity, DailyElectricitySeries, ElectricityBatch, HourlyElectricitySeries,
};
use crate::domain::observation::DateRange;

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: f64 = 86_400_000.0;
const PRICE_PADDING: f64 = 0.5;
const CONSUMPTION_PADDING: f64 = 0.1;
const ANNOTATION_PADDING: f64 = 0.4;

/// Index of the hourly sample covering `now_ms`. When the nearest sample is
/// the upcoming hour, the one before it is used instead. `None` once `now_ms`
/// is past the hour of the last sample.
pub fn closest_hour_index(time_axis: &[i64], now_ms: i64, zone: &DisplayZone) -> Option<usize> {
    let last = *time_axis.last()?;
    if now_ms >= last.saturating_add(HOUR_MS) {
        return None;
    }

    let (index, &closest) = time_axis
        .iter()
        .enumerate()
        .min_by_key(|(_, ts)| ts.abs_diff(now_ms))?;

    match (zone.hour(now_ms), zone.hour(closest)) {
        (Some(now_hour), Some(closest_hour)) if now_hour < closest_hour => index.checked_sub(1),
        _ => Some(index),
    }
}

/// Midnight markers for hourly data, leaving out the first and last sample
pub fn hourly_day_boundaries(time_axis: &[i64], zone: &DisplayZone) -> Vec<i64> {
    if time_axis.len() < 3 {
        return Vec::new();
    }

    time_axis[1..time_axis.len() - 1]
        .iter()
        .filter(|&&ts| zone.hour(ts) == Some(0))
        .copied()
        .collect()
}

fn padded(pair: [f64; 2], padding: f64) -> [f64; 2] {
    [pair[0] - padding, pair[1] + padding]
}

/// The current hour is only marked when the range reaches today
fn range_reaches_today(range: &DateRange, now_ms: i64, zone: &DisplayZone) -> bool {
    match (range.end, zone.date(now_ms)) {
        (Some(end), Some(today)) => end >= today,
        _ => true,
    }
}

/// Build chart series from an electricity batch. Without an explicit range
/// the newest hourly and daily rows are still filling up and are left out.
pub fn align_electricity(
    batch: &ElectricityBatch,
    now_ms: i64,
    zone: &DisplayZone,
    range: &DateRange,
) -> AlignedElectricity {
    let drop_last = range.start.is_none() && range.end.is_none();

    let hourly_rows = if drop_last {
        &batch.hourly[..batch.hourly.len().saturating_sub(1)]
    } else {
        &batch.hourly[..]
    };
    let daily_rows = if drop_last {
        &batch.daily[..batch.daily.len().saturating_sub(1)]
    } else {
        &batch.daily[..]
    };

    let time_axis: Vec<i64> = hourly_rows.iter().map(|r| r.start_time).collect();
    let price: Vec<Option<f64>> = hourly_rows.iter().map(|r| r.price).collect();
    let consumption: Vec<Option<f64>> = hourly_rows.iter().map(|r| r.consumption).collect();

    let x_tick_ms = match (time_axis.first(), time_axis.last()) {
        (Some(&first), Some(&last)) => x_axis_tick_size(last.abs_diff(first) as f64 / DAY_MS),
        _ => x_axis_tick_size(0.0),
    };

    let current_index = if range_reaches_today(range, now_ms, zone) {
        closest_hour_index(&time_axis, now_ms, zone)
    } else {
        None
    };

    let hourly = HourlyElectricitySeries {
        annotations: hourly_day_boundaries(&time_axis, zone),
        current_index,
        x_tick_ms,
        price_range: padded(extreme_values([&price]).as_pair(), PRICE_PADDING),
        consumption_range: padded(
            extreme_values([&consumption]).as_pair(),
            CONSUMPTION_PADDING,
        ),
        annotation_range: padded(
            extreme_values([&price, &consumption]).as_pair(),
            ANNOTATION_PADDING,
        ),
        time_axis,
        price,
        consumption,
    };

    let daily = DailyElectricitySeries {
        dates: daily_rows.iter().map(|r| r.date.clone()).collect(),
        price: daily_rows.iter().map(|r| r.price).collect(),
        consumption: daily_rows.iter().map(|r| r.consumption).collect(),
    };

    tracing::debug!(
        "Aligned {} hourly and {} daily electricity rows",
        hourly.time_axis.len(),
        daily.dates.len()
    );

    AlignedElectricity {
        dates: batch.dates.clone(),
        hourly,
        daily,
        month_average_price: batch.month_average_price,
    }
}
