// Series aligner - Turns independently sampled observation streams into
// index-aligned, null-padded arrays that share a time axis per chart
use crate::domain::dataset::{
    AlignedDataset, AlignmentWarning, AxisHints, Category, CategorySeries, DeviceSeries,
    DeviceValues, ExtremeValues, LatestSnapshot, ValueSeries,
};
use crate::domain::error::AlignError;
use crate::domain::labels::{device_label, field_label, unit_suffix};
use crate::domain::observation::{DeviceReading, DisplayMode, FieldValues, Observation, ObservationBatch};
use crate::infrastructure::config::AlignmentSettings;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Timelike};
use std::collections::{BTreeMap, BTreeSet};

/// Leading time-axis entries that never get a day boundary marker
const ANNOTATION_WARMUP: usize = 2;

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: f64 = 86_400_000.0;

/// Device buckets keyed by the reference timestamp of each tick
pub type DeviceBuckets = BTreeMap<i64, BTreeMap<String, FieldValues>>;

/// Per device, one series per field. Devices keep their label order.
pub type AlignedDevices = Vec<(String, BTreeMap<String, ValueSeries>)>;

/// Zone used to decide where a day starts on the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    Local,
    Fixed(FixedOffset),
}

impl DisplayZone {
    pub fn hour_minute(&self, time_ms: i64) -> Option<(u32, u32)> {
        let utc = DateTime::from_timestamp_millis(time_ms)?;
        let (hour, minute) = match self {
            DisplayZone::Local => {
                let local = utc.with_timezone(&Local);
                (local.hour(), local.minute())
            }
            DisplayZone::Fixed(offset) => {
                let fixed = utc.with_timezone(offset);
                (fixed.hour(), fixed.minute())
            }
        };
        Some((hour, minute))
    }

    pub fn hour(&self, time_ms: i64) -> Option<u32> {
        self.hour_minute(time_ms).map(|(hour, _)| hour)
    }

    /// Calendar date of `time_ms` in this zone
    pub fn date(&self, time_ms: i64) -> Option<NaiveDate> {
        let utc = DateTime::from_timestamp_millis(time_ms)?;
        Some(match self {
            DisplayZone::Local => utc.with_timezone(&Local).date_naive(),
            DisplayZone::Fixed(offset) => utc.with_timezone(offset).date_naive(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldSet {
    pub weather: Vec<String>,
    pub other: Vec<String>,
}

/// Which categories, fields and devices an alignment run produces.
/// Resolved once per batch.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentOptions {
    pub include_auxiliary_devices: bool,
    pub include_weather: bool,
    pub field_set: FieldSet,
    pub device_fields: Vec<String>,
    pub threshold_seconds: i64,
    pub zone: DisplayZone,
}

impl AlignmentOptions {
    pub fn for_mode(mode: DisplayMode, settings: &AlignmentSettings, zone: DisplayZone) -> Self {
        match mode {
            DisplayMode::All => Self {
                include_auxiliary_devices: settings.include_auxiliary_devices,
                include_weather: true,
                field_set: FieldSet {
                    weather: settings.weather_fields.clone(),
                    other: settings.other_fields.clone(),
                },
                device_fields: settings.device_fields.clone(),
                threshold_seconds: settings.threshold_seconds,
                zone,
            },
            DisplayMode::WeatherOnly => Self {
                include_auxiliary_devices: false,
                include_weather: true,
                field_set: FieldSet {
                    weather: settings.weather_fields.clone(),
                    other: Vec::new(),
                },
                device_fields: settings.device_fields.clone(),
                threshold_seconds: settings.threshold_seconds,
                zone,
            },
        }
    }
}

/// Group device readings into ticks. A reading more than `threshold_seconds`
/// away from the current tick's reference timestamp opens a new tick.
/// Readings must already be in time order.
pub fn bucket_by_proximity(
    readings: &[DeviceReading],
    threshold_seconds: i64,
) -> Result<DeviceBuckets, AlignError> {
    let threshold_ms = threshold_seconds.unsigned_abs().saturating_mul(1000);
    let mut buckets = DeviceBuckets::new();
    let mut reference: Option<i64> = None;
    let mut previous: Option<i64> = None;

    for reading in readings {
        if let Some(previous) = previous {
            if reading.recorded < previous {
                return Err(AlignError::NonMonotonicTimestamps {
                    previous,
                    current: reading.recorded,
                });
            }
        }
        previous = Some(reading.recorded);

        let tick = match reference {
            Some(tick) if tick.abs_diff(reading.recorded) <= threshold_ms => tick,
            _ => reading.recorded,
        };
        reference = Some(tick);

        buckets
            .entry(tick)
            .or_default()
            .insert(reading.device.clone(), reading.values.clone());
    }

    Ok(buckets)
}

/// One array per device and field, one entry per tick. Devices that did not
/// report in a tick get `None`. Devices come out in label order.
pub fn materialize_aligned(
    buckets: &DeviceBuckets,
    device_labels: &[String],
    device_fields: &[String],
) -> Result<AlignedDevices, AlignError> {
    let mut expected: BTreeSet<&str> = BTreeSet::new();
    let labels: Vec<&str> = device_labels
        .iter()
        .map(String::as_str)
        .filter(|label| expected.insert(*label))
        .collect();

    for devices in buckets.values() {
        if let Some(unknown) = devices.keys().find(|d| !expected.contains(d.as_str())) {
            return Err(AlignError::UnknownDevice(unknown.clone()));
        }
    }

    let mut aligned: AlignedDevices = labels
        .iter()
        .map(|label| {
            let fields = device_fields
                .iter()
                .map(|f| (f.clone(), Vec::with_capacity(buckets.len())))
                .collect();
            (label.to_string(), fields)
        })
        .collect();

    for devices in buckets.values() {
        for (label, fields) in aligned.iter_mut() {
            let reported = devices.get(label.as_str());
            for (field, series) in fields.iter_mut() {
                series.push(reported.and_then(|values| values.get(field).copied().flatten()));
            }
        }
    }

    Ok(aligned)
}

/// Prepend nulls so the series ends at the same index as a series of
/// `target_len`. Longer series are returned as they are.
pub fn pad_to_align(target_len: usize, series: ValueSeries) -> ValueSeries {
    if series.len() >= target_len {
        return series;
    }

    let mut padded = vec![None; target_len - series.len()];
    padded.extend(series);
    padded
}

/// Timestamps where the display-zone clock reads exactly midnight
pub fn day_boundary_annotations(time_axis: &[i64], zone: &DisplayZone) -> Vec<i64> {
    time_axis
        .iter()
        .skip(ANNOTATION_WARMUP)
        .filter(|&&ts| zone.hour_minute(ts) == Some((0, 0)))
        .copied()
        .collect()
}

fn finite_extremes<'a, I>(series: I) -> Option<ExtremeValues>
where
    I: IntoIterator<Item = &'a ValueSeries>,
{
    series
        .into_iter()
        .flat_map(|s| s.iter())
        .filter_map(|v| *v)
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<ExtremeValues>, v| match acc {
            None => Some(ExtremeValues::new(v, v)),
            Some(e) => Some(ExtremeValues::new(e.min.min(v), e.max.max(v))),
        })
}

/// Minimum and maximum over all series, ignoring nulls and NaNs.
/// Falls back to [-1, 4] when nothing is left.
pub fn extreme_values<'a, I>(series: I) -> ExtremeValues
where
    I: IntoIterator<Item = &'a ValueSeries>,
{
    finite_extremes(series).unwrap_or(ExtremeValues::FALLBACK)
}

pub fn y_axis_padding(extremes: &ExtremeValues) -> f64 {
    let range = extremes.range();
    if range < 20.0 {
        1.0
    } else if range < 100.0 {
        4.0
    } else {
        8.0
    }
}

/// Value axis range with padding, or the unpadded fallback when there is
/// nothing to plot.
pub fn value_axis_range<'a, I>(series: I) -> [f64; 2]
where
    I: IntoIterator<Item = &'a ValueSeries>,
{
    match finite_extremes(series) {
        Some(extremes) => {
            let padding = y_axis_padding(&extremes);
            [extremes.min - padding, extremes.max + padding]
        }
        None => ExtremeValues::FALLBACK.as_pair(),
    }
}

pub fn x_axis_tick_size(diff_in_days: f64) -> i64 {
    if diff_in_days >= 20.0 {
        6 * HOUR_MS
    } else if diff_in_days >= 10.0 {
        5 * HOUR_MS
    } else if diff_in_days >= 6.0 {
        3 * HOUR_MS
    } else if diff_in_days >= 3.0 {
        2 * HOUR_MS
    } else {
        HOUR_MS
    }
}

pub fn axis_hints<'a, I>(time_axis: &[i64], series: I) -> AxisHints
where
    I: IntoIterator<Item = &'a ValueSeries> + Clone,
{
    let x_range = match (time_axis.first(), time_axis.last()) {
        (Some(&first), Some(&last)) => Some([first, last]),
        _ => None,
    };
    let x_tick_ms = x_range
        .map(|[first, last]| x_axis_tick_size(last.abs_diff(first) as f64 / DAY_MS))
        .unwrap_or(HOUR_MS);

    AxisHints {
        x_range,
        x_tick_ms,
        y_range: value_axis_range(series.clone()),
        extremes: extreme_values(series),
    }
}

fn ensure_monotonic<I: IntoIterator<Item = i64>>(timestamps: I) -> Result<(), AlignError> {
    let mut previous: Option<i64> = None;
    for current in timestamps {
        if let Some(previous) = previous {
            if current < previous {
                return Err(AlignError::NonMonotonicTimestamps { previous, current });
            }
        }
        previous = Some(current);
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct Aligner {
    options: AlignmentOptions,
}

impl Aligner {
    pub fn new(options: AlignmentOptions) -> Self {
        Self { options }
    }

    pub fn align(&self, batch: &ObservationBatch) -> Result<AlignedDataset, AlignError> {
        ensure_monotonic(batch.observations.iter().map(|o| o.recorded))?;
        ensure_monotonic(batch.observations.iter().filter_map(|o| o.weather_recorded))?;

        let beacon_name = batch.beacon_name();
        let mut categories = BTreeMap::new();

        if !self.options.field_set.other.is_empty() {
            let time_axis: Vec<i64> = batch.observations.iter().map(|o| o.recorded).collect();
            let series = self.category_series(
                time_axis,
                &batch.observations.iter().collect::<Vec<_>>(),
                &self.options.field_set.other,
                beacon_name,
            );
            categories.insert(Category::Other, series);
        }

        if self.options.include_weather {
            let weather: Vec<&Observation> = batch
                .observations
                .iter()
                .filter(|o| o.weather_recorded.is_some())
                .collect();
            let time_axis: Vec<i64> = weather.iter().filter_map(|o| o.weather_recorded).collect();
            let series =
                self.category_series(time_axis, &weather, &self.options.field_set.weather, beacon_name);
            categories.insert(Category::Weather, series);
        }

        let mut warnings = Vec::new();
        let devices = if self.options.include_auxiliary_devices {
            self.device_series(batch, &mut warnings)?
        } else {
            Vec::new()
        };

        let device_axes = if devices.is_empty() {
            None
        } else {
            let primary_axis: Vec<i64> = batch.observations.iter().map(|o| o.recorded).collect();
            let all_series: Vec<&ValueSeries> =
                devices.iter().flat_map(|d| d.fields.values()).collect();
            Some(axis_hints(&primary_axis, all_series))
        };

        let mut latest = self.latest_snapshot(&categories, &devices);
        if let Some(report) = &batch.weather {
            // The weather service's own current reading beats the last chart sample
            if let Some((time, fields)) = report.current_fields() {
                latest.weather_recorded = time.or(latest.weather_recorded);
                for (key, value) in fields {
                    latest.weather.insert(key.to_string(), value);
                }
            }
            latest.weather_report = Some(report.clone());
        }

        tracing::debug!(
            "Aligned {} observations, {} device readings into {} categories and {} devices",
            batch.observations.len(),
            batch.device_readings.len(),
            categories.len(),
            devices.len()
        );

        Ok(AlignedDataset {
            mode: batch.mode,
            dates: batch.dates.clone(),
            categories,
            devices,
            device_axes,
            latest,
            warnings,
        })
    }

    fn category_series(
        &self,
        time_axis: Vec<i64>,
        observations: &[&Observation],
        fields: &[String],
        beacon_name: Option<&str>,
    ) -> CategorySeries {
        let values: BTreeMap<String, ValueSeries> = fields
            .iter()
            .map(|key| {
                let series = observations.iter().map(|o| o.value(key)).collect();
                (key.clone(), series)
            })
            .collect();
        let labels = fields
            .iter()
            .map(|key| (key.clone(), field_label(key, beacon_name)))
            .collect();
        let units = fields
            .iter()
            .map(|key| (key.clone(), unit_suffix(key)))
            .collect();
        let annotations = day_boundary_annotations(&time_axis, &self.options.zone);
        let axes = axis_hints(&time_axis, values.values());

        CategorySeries {
            time_axis,
            fields: values,
            labels,
            units,
            annotations,
            axes,
        }
    }

    fn device_series(
        &self,
        batch: &ObservationBatch,
        warnings: &mut Vec<AlignmentWarning>,
    ) -> Result<Vec<DeviceSeries>, AlignError> {
        let target = batch.observations.len();

        let aligned = if target == 0 {
            // Nothing to align against: every device stays empty
            let no_buckets = DeviceBuckets::new();
            materialize_aligned(&no_buckets, &batch.device_labels, &self.options.device_fields)?
        } else {
            let buckets = bucket_by_proximity(&batch.device_readings, self.options.threshold_seconds)?;
            materialize_aligned(&buckets, &batch.device_labels, &self.options.device_fields)?
        };

        let mut devices = Vec::with_capacity(aligned.len());
        for (device, fields) in aligned {
            let mut padded = BTreeMap::new();
            let mut labels = BTreeMap::new();
            let mut units = BTreeMap::new();
            let mut flagged = false;

            for (field, series) in fields {
                if series.len() > target && !flagged {
                    tracing::warn!(
                        "Device {} has {} ticks but the primary series only {} samples",
                        device,
                        series.len(),
                        target
                    );
                    warnings.push(AlignmentWarning::DeviceSeriesTooLong {
                        device: device.clone(),
                        length: series.len(),
                        target,
                    });
                    flagged = true;
                }
                labels.insert(field.clone(), device_label(&device, &field));
                units.insert(field.clone(), unit_suffix(&field));
                padded.insert(field, pad_to_align(target, series));
            }

            devices.push(DeviceSeries {
                device,
                fields: padded,
                labels,
                units,
            });
        }

        Ok(devices)
    }

    fn latest_snapshot(
        &self,
        categories: &BTreeMap<Category, CategorySeries>,
        devices: &[DeviceSeries],
    ) -> LatestSnapshot {
        let mut snapshot = LatestSnapshot::default();

        if let Some(other) = categories.get(&Category::Other) {
            if let Some(last) = other.len().checked_sub(1) {
                snapshot.recorded = Some(other.time_axis[last]);
                snapshot.other = other
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v[last]))
                    .collect();
            }
        }

        if let Some(weather) = categories.get(&Category::Weather) {
            if let Some(last) = weather.len().checked_sub(1) {
                // Prefer the newest sample where the leading weather field is present
                let index = self
                    .options
                    .field_set
                    .weather
                    .first()
                    .and_then(|key| weather.field(key))
                    .and_then(|series| series.iter().rposition(Option::is_some))
                    .unwrap_or(last);
                snapshot.weather_recorded = Some(weather.time_axis[index]);
                snapshot.weather = weather
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v[index]))
                    .collect();
            }
        }

        snapshot.devices = devices
            .iter()
            .map(|series| DeviceValues {
                device: series.device.clone(),
                values: series
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.last().copied().flatten()))
                    .collect(),
            })
            .collect();

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::weather::{WeatherReport, WeatherSample};

    const MINUTE_MS: i64 = 60_000;

    fn utc() -> DisplayZone {
        DisplayZone::Fixed(FixedOffset::east_opt(0).unwrap())
    }

    fn ts(s: &str) -> i64 {
        DateTime::parse_from_rfc3339(s).unwrap().timestamp_millis()
    }

    fn reading(recorded: i64, device: &str, temperature: f64, humidity: f64) -> DeviceReading {
        DeviceReading::new(recorded, device)
            .with_value("temperature", Some(temperature))
            .with_value("humidity", Some(humidity))
    }

    fn device_fields() -> Vec<String> {
        vec!["temperature".to_string(), "humidity".to_string()]
    }

    fn options() -> AlignmentOptions {
        AlignmentOptions {
            include_auxiliary_devices: true,
            include_weather: true,
            field_set: FieldSet {
                weather: vec!["fmi-temperature".to_string(), "cloudiness".to_string()],
                other: vec!["o-temperature".to_string(), "brightness".to_string()],
            },
            device_fields: device_fields(),
            threshold_seconds: 10,
            zone: utc(),
        }
    }

    #[test]
    fn test_bucket_by_proximity_groups_close_readings() {
        let base = ts("2024-03-01T09:00:00Z");
        let readings = vec![
            reading(base, "sauna", 60.0, 10.0),
            reading(base + 4_000, "bedroom", 21.0, 40.0),
            reading(base + 10_000, "cellar", 8.0, 80.0),
            reading(base + 300_000, "sauna", 62.0, 11.0),
            reading(base + 305_000, "bedroom", 21.5, 41.0),
        ];

        let buckets = bucket_by_proximity(&readings, 10).unwrap();

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[&base].len(), 3);
        assert_eq!(buckets[&(base + 300_000)].len(), 2);
        assert_eq!(
            buckets[&(base + 300_000)]["sauna"]["temperature"],
            Some(62.0)
        );
    }

    #[test]
    fn test_bucket_members_stay_within_threshold() {
        let readings: Vec<DeviceReading> = (0..40)
            .map(|i| reading(i * 3_700, if i % 2 == 0 { "a" } else { "b" }, 1.0, 1.0))
            .collect();

        let buckets = bucket_by_proximity(&readings, 10).unwrap();

        // Every reading lands in the last tick at or before it, within the threshold
        for r in &readings {
            let (tick, _) = buckets.range(..=r.recorded).next_back().unwrap();
            assert!(r.recorded - tick <= 10_000);
        }
    }

    #[test]
    fn test_bucket_same_device_last_report_wins() {
        let readings = vec![reading(0, "a", 1.0, 1.0), reading(5_000, "a", 2.0, 2.0)];

        let buckets = bucket_by_proximity(&readings, 10).unwrap();

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[&0]["a"]["temperature"], Some(2.0));
    }

    #[test]
    fn test_bucket_rejects_out_of_order_readings() {
        let readings = vec![reading(20_000, "a", 1.0, 1.0), reading(5_000, "b", 2.0, 2.0)];

        let err = bucket_by_proximity(&readings, 10).unwrap_err();
        assert_eq!(
            err,
            AlignError::NonMonotonicTimestamps {
                previous: 20_000,
                current: 5_000
            }
        );
    }

    #[test]
    fn test_materialize_fills_missing_devices_with_null() {
        let readings = vec![
            reading(0, "a", 1.0, 10.0),
            reading(60_000, "a", 2.0, 20.0),
            reading(61_000, "b", 5.0, 50.0),
        ];
        let labels = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let buckets = bucket_by_proximity(&readings, 10).unwrap();

        let aligned = materialize_aligned(&buckets, &labels, &device_fields()).unwrap();

        assert_eq!(aligned.len(), 3);
        for (_, fields) in &aligned {
            for series in fields.values() {
                assert_eq!(series.len(), buckets.len());
            }
        }
        assert_eq!(aligned[0].1["temperature"], vec![Some(1.0), Some(2.0)]);
        assert_eq!(aligned[1].1["humidity"], vec![None, Some(50.0)]);
        assert_eq!(aligned[2].1["temperature"], vec![None, None]);
    }

    #[test]
    fn test_materialize_rejects_unknown_device() {
        let readings = vec![reading(0, "garage", 1.0, 1.0)];
        let buckets = bucket_by_proximity(&readings, 10).unwrap();

        let err = materialize_aligned(&buckets, &["a".to_string()], &device_fields()).unwrap_err();
        assert_eq!(err, AlignError::UnknownDevice("garage".to_string()));
    }

    #[test]
    fn test_pad_to_align_prepends_nulls() {
        let series = vec![Some(15.0), Some(16.0)];

        let padded = pad_to_align(5, series.clone());

        assert_eq!(padded.len(), 5);
        assert_eq!(&padded[..3], &[None, None, None]);
        assert_eq!(&padded[3..], series.as_slice());
    }

    #[test]
    fn test_pad_to_align_never_truncates() {
        let series = vec![Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(pad_to_align(2, series.clone()), series);
        assert_eq!(pad_to_align(3, series.clone()), series);
    }

    #[test]
    fn test_day_boundary_annotations_skip_warmup() {
        let midnight = ts("2024-03-02T00:00:00Z");
        let axis = vec![
            midnight,
            midnight + 10 * MINUTE_MS,
            midnight + 20 * MINUTE_MS,
            midnight + 24 * 60 * MINUTE_MS,
            midnight + 24 * 60 * MINUTE_MS + 30_000,
            midnight + 24 * 60 * MINUTE_MS + MINUTE_MS,
        ];

        let annotations = day_boundary_annotations(&axis, &utc());

        assert_eq!(
            annotations,
            vec![midnight + 24 * 60 * MINUTE_MS, midnight + 24 * 60 * MINUTE_MS + 30_000]
        );
        assert!(annotations.windows(2).all(|w| w[0] <= w[1]));
        assert!(annotations.iter().all(|a| axis.contains(a)));
    }

    #[test]
    fn test_day_boundary_uses_display_zone() {
        // 22:00 UTC is midnight at UTC+2
        let base = ts("2024-03-01T21:40:00Z");
        let axis: Vec<i64> = (0..4).map(|i| base + i * 10 * MINUTE_MS).collect();
        let helsinki = DisplayZone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap());

        assert_eq!(day_boundary_annotations(&axis, &helsinki), vec![base + 20 * MINUTE_MS]);
        assert!(day_boundary_annotations(&axis, &utc()).is_empty());
    }

    #[test]
    fn test_extreme_values_ignore_null_and_nan() {
        let a = vec![Some(3.0), None, Some(f64::NAN), Some(-2.5)];
        let b = vec![Some(10.0), None];

        let extremes = extreme_values([&a, &b]);
        assert_eq!(extremes.as_pair(), [-2.5, 10.0]);

        // Idempotent, and a null contributes nothing
        assert_eq!(extreme_values([&a, &b]), extremes);
        let without_nulls = vec![Some(3.0), Some(f64::NAN), Some(-2.5)];
        assert_eq!(extreme_values([&without_nulls, &b]), extremes);
    }

    #[test]
    fn test_extreme_values_fallback_when_all_null() {
        let a: ValueSeries = vec![None, None];
        let b: ValueSeries = vec![Some(f64::NAN)];

        assert_eq!(extreme_values([&a, &b]).as_pair(), [-1.0, 4.0]);
        assert_eq!(extreme_values(Vec::<&ValueSeries>::new()).as_pair(), [-1.0, 4.0]);
        assert_eq!(value_axis_range([&a]), [-1.0, 4.0]);
    }

    #[test]
    fn test_y_axis_padding_steps() {
        assert_eq!(y_axis_padding(&ExtremeValues::new(0.0, 19.9)), 1.0);
        assert_eq!(y_axis_padding(&ExtremeValues::new(-10.0, 10.0)), 4.0);
        assert_eq!(y_axis_padding(&ExtremeValues::new(0.0, 99.0)), 4.0);
        assert_eq!(y_axis_padding(&ExtremeValues::new(0.0, 100.0)), 8.0);

        let series = vec![Some(-5.0), Some(30.0)];
        assert_eq!(value_axis_range([&series]), [-9.0, 34.0]);
    }

    #[test]
    fn test_x_axis_tick_size() {
        assert_eq!(x_axis_tick_size(1.0), HOUR_MS);
        assert_eq!(x_axis_tick_size(3.0), 2 * HOUR_MS);
        assert_eq!(x_axis_tick_size(7.5), 3 * HOUR_MS);
        assert_eq!(x_axis_tick_size(12.0), 5 * HOUR_MS);
        assert_eq!(x_axis_tick_size(45.0), 6 * HOUR_MS);
    }

    #[test]
    fn test_align_pads_device_series_to_primary_tail() {
        let t0 = ts("2024-03-01T09:00:00Z");
        let t1 = ts("2024-03-01T09:05:00Z");
        let t2 = ts("2024-03-01T09:10:00Z");

        let mut batch = ObservationBatch::new(DisplayMode::All);
        batch.observations = vec![
            Observation::new(t0).with_field("o-temperature", Some(20.0)),
            Observation::new(t1).with_field("o-temperature", Some(21.0)),
            Observation::new(t2).with_field("o-temperature", Some(22.0)),
        ];
        batch.device_readings = vec![
            reading(t1, "A", 15.0, 40.0),
            reading(t2, "A", 16.0, 41.0),
        ];
        batch.device_labels = vec!["A".to_string()];

        let dataset = Aligner::new(options()).align(&batch).unwrap();

        let other = dataset.category(Category::Other).unwrap();
        assert_eq!(other.time_axis, vec![t0, t1, t2]);
        assert_eq!(
            other.field("o-temperature").unwrap(),
            &vec![Some(20.0), Some(21.0), Some(22.0)]
        );
        // Not reported at all, still one entry per sample
        assert_eq!(other.field("brightness").unwrap(), &vec![None, None, None]);
        assert!(other.is_consistent());

        let device = dataset.device("A").unwrap();
        assert_eq!(
            device.field("temperature").unwrap(),
            &vec![None, Some(15.0), Some(16.0)]
        );
        assert_eq!(device.labels["temperature"], "RT \"A\" temperature");
        assert_eq!(device.units["humidity"], " %H");
        assert!(dataset.warnings.is_empty());
        assert_eq!(dataset.latest.device("A").unwrap()["humidity"], Some(41.0));
    }

    #[test]
    fn test_align_empty_primary_stream() {
        let mut batch = ObservationBatch::new(DisplayMode::All);
        batch.device_readings = vec![reading(1_000, "A", 15.0, 40.0)];
        batch.device_labels = vec!["A".to_string()];

        let dataset = Aligner::new(options()).align(&batch).unwrap();

        assert!(dataset.is_empty());
        for category in dataset.categories.values() {
            assert!(category.time_axis.is_empty());
            assert!(category.annotations.is_empty());
            assert!(category.fields.values().all(|v| v.is_empty()));
            assert_eq!(category.axes.y_range, [-1.0, 4.0]);
            assert_eq!(category.axes.x_range, None);
        }
        assert!(dataset.device("A").unwrap().fields.values().all(|v| v.is_empty()));
        assert_eq!(dataset.latest.weather_report, None);
        assert_eq!(dataset.latest.recorded, None);
        assert_eq!(dataset.latest.weather_recorded, None);
        assert!(dataset.latest.other.is_empty());
        assert_eq!(dataset.latest.device("A").unwrap()["temperature"], None);
    }

    #[test]
    fn test_align_flags_over_length_device_series() {
        let mut batch = ObservationBatch::new(DisplayMode::All);
        batch.observations = vec![Observation::new(0).with_field("o-temperature", Some(1.0))];
        batch.device_readings = vec![
            reading(0, "A", 1.0, 1.0),
            reading(60_000, "A", 2.0, 2.0),
            reading(120_000, "A", 3.0, 3.0),
        ];
        batch.device_labels = vec!["A".to_string()];

        let dataset = Aligner::new(options()).align(&batch).unwrap();

        assert_eq!(
            dataset.warnings,
            vec![AlignmentWarning::DeviceSeriesTooLong {
                device: "A".to_string(),
                length: 3,
                target: 1
            }]
        );
        assert_eq!(dataset.device("A").unwrap().field("temperature").unwrap().len(), 3);
    }

    #[test]
    fn test_align_weather_uses_weather_timestamps() {
        let t0 = ts("2024-03-01T09:00:00Z");
        let mut batch = ObservationBatch::new(DisplayMode::All);
        batch.observations = vec![
            Observation::new(t0)
                .with_weather_recorded(t0 - 120_000)
                .with_field("fmi-temperature", Some(-3.0))
                .with_field("cloudiness", Some(8.0)),
            Observation::new(t0 + 300_000).with_field("brightness", Some(400.0)),
            Observation::new(t0 + 600_000)
                .with_weather_recorded(t0 + 480_000)
                .with_field("fmi-temperature", None)
                .with_field("cloudiness", Some(7.0)),
        ];

        let dataset = Aligner::new(options()).align(&batch).unwrap();

        let weather = dataset.category(Category::Weather).unwrap();
        assert_eq!(weather.time_axis, vec![t0 - 120_000, t0 + 480_000]);
        assert_eq!(weather.field("cloudiness").unwrap(), &vec![Some(8.0), Some(7.0)]);
        assert_eq!(weather.labels["fmi-temperature"], "Temperature");
        assert_eq!(weather.axes.extremes.as_pair(), [-3.0, 8.0]);

        // Latest weather comes from the newest sample with a temperature
        assert_eq!(dataset.latest.weather_recorded, Some(t0 - 120_000));
        assert_eq!(dataset.latest.weather["fmi-temperature"], Some(-3.0));
        assert_eq!(dataset.category(Category::Other).unwrap().len(), 3);
    }

    #[test]
    fn test_align_rejects_unsorted_observations() {
        let mut batch = ObservationBatch::new(DisplayMode::All);
        batch.observations = vec![Observation::new(10), Observation::new(5)];

        assert!(matches!(
            Aligner::new(options()).align(&batch),
            Err(AlignError::NonMonotonicTimestamps { .. })
        ));
    }

    #[test]
    fn test_weather_only_mode_options() {
        let settings = AlignmentSettings::default();
        let options = AlignmentOptions::for_mode(DisplayMode::WeatherOnly, &settings, utc());

        assert!(!options.include_auxiliary_devices);
        assert!(options.include_weather);
        assert!(options.field_set.other.is_empty());

        let mut batch = ObservationBatch::new(DisplayMode::WeatherOnly);
        batch.observations = vec![
            Observation::new(0).with_weather_recorded(0).with_field("wind-speed", Some(3.0)),
        ];
        batch.device_labels = vec!["ignored".to_string()];

        let dataset = Aligner::new(options).align(&batch).unwrap();
        assert!(dataset.category(Category::Other).is_none());
        assert!(dataset.devices.is_empty());
        assert_eq!(dataset.device_axes, None);
        assert_eq!(
            dataset.category(Category::Weather).unwrap().field("wind-speed").unwrap(),
            &vec![Some(3.0)]
        );
    }

    #[test]
    fn test_devices_keep_label_order() {
        let mut batch = ObservationBatch::new(DisplayMode::All);
        batch.observations = vec![Observation::new(0)];
        batch.device_readings = vec![reading(0, "bedroom", 21.0, 40.0)];
        batch.device_labels = vec![
            "sauna".to_string(),
            "bedroom".to_string(),
            "attic".to_string(),
            "sauna".to_string(),
        ];

        let dataset = Aligner::new(options()).align(&batch).unwrap();

        let order: Vec<&str> = dataset.devices.iter().map(|d| d.device.as_str()).collect();
        assert_eq!(order, vec!["sauna", "bedroom", "attic"]);
        let latest: Vec<&str> = dataset.latest.devices.iter().map(|d| d.device.as_str()).collect();
        assert_eq!(latest, order);

        let json = serde_json::to_value(&dataset).unwrap();
        assert_eq!(json["devices"][0]["device"], "sauna");
        assert_eq!(json["devices"][2]["device"], "attic");
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let readings = vec![reading(i64::MIN, "a", 1.0, 1.0), reading(i64::MAX, "a", 2.0, 2.0)];

        let buckets = bucket_by_proximity(&readings, 10).unwrap();
        assert_eq!(buckets.len(), 2);

        let series = vec![Some(1.0)];
        let hints = axis_hints(&[i64::MIN, i64::MAX], [&series]);
        assert_eq!(hints.x_tick_ms, 6 * HOUR_MS);
        assert_eq!(bucket_by_proximity(&readings, i64::MAX).unwrap().len(), 1);
    }

    #[test]
    fn test_weather_report_drives_latest_weather() {
        let t0 = ts("2024-03-01T09:00:00Z");
        let mut batch = ObservationBatch::new(DisplayMode::All);
        batch.observations = vec![
            Observation::new(t0)
                .with_weather_recorded(t0)
                .with_field("fmi-temperature", Some(-3.0))
                .with_field("cloudiness", Some(8.0)),
        ];
        batch.weather = Some(WeatherReport {
            current: Some(WeatherSample {
                time: Some(t0 + 600_000),
                temperature: Some(-1.0),
                cloudiness: Some(6.0),
                wind_speed: Some(4.0),
                wind_direction: Some("north".to_string()),
                precipitation: None,
            }),
            description: Some("light snow".to_string()),
            ..WeatherReport::default()
        });

        let dataset = Aligner::new(options()).align(&batch).unwrap();

        assert_eq!(dataset.latest.weather_recorded, Some(t0 + 600_000));
        assert_eq!(dataset.latest.weather["fmi-temperature"], Some(-1.0));
        assert_eq!(dataset.latest.weather["wind-speed"], Some(4.0));
        let report = dataset.latest.weather_report.as_ref().unwrap();
        assert_eq!(report.description.as_deref(), Some("light snow"));
        // The chart series itself is untouched
        assert_eq!(
            dataset.category(Category::Weather).unwrap().field("fmi-temperature").unwrap(),
            &vec![Some(-3.0)]
        );
    }

    #[test]
    fn test_display_zone_date() {
        let late = ts("2024-03-01T23:30:00Z");
        let helsinki = DisplayZone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap());

        assert_eq!(utc().date(late), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(helsinki.date(late), NaiveDate::from_ymd_opt(2024, 3, 2));
    }

    #[test]
    fn test_beacon_name_flows_into_labels() {
        let mut first = Observation::new(0).with_field("beacon-rssi", Some(-70.0));
        first.beacon_name = Some("keys".to_string());
        let mut batch = ObservationBatch::new(DisplayMode::All);
        batch.observations = vec![first];
        let mut opts = options();
        opts.field_set.other.push("beacon-rssi".to_string());

        let dataset = Aligner::new(opts).align(&batch).unwrap();

        let other = dataset.category(Category::Other).unwrap();
        assert_eq!(other.labels["beacon-rssi"], "Beacon \"keys\" RSSI");
    }
}
