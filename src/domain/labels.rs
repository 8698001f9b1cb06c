// Display labels and unit suffixes for chart series

/// Human readable name of an observation field
pub fn field_label(key: &str, beacon_name: Option<&str>) -> String {
    match (key, beacon_name) {
        ("fmi-temperature", _) => "Temperature".to_string(),
        ("cloudiness", _) => "Cloudiness".to_string(),
        ("wind-speed", _) => "Wind speed".to_string(),
        ("brightness", _) => "Brightness".to_string(),
        ("o-temperature", _) => "Outside temperature".to_string(),
        ("beacon-rssi", Some(name)) => format!("Beacon \"{}\" RSSI", name),
        ("beacon-rssi", None) => "Beacon RSSI".to_string(),
        ("beacon-battery", Some(name)) => format!("Beacon \"{}\" battery level", name),
        ("beacon-battery", None) => "Beacon battery level".to_string(),
        (other, _) => other.to_string(),
    }
}

pub fn device_label(device: &str, field: &str) -> String {
    format!("RT \"{}\" {}", device, field)
}

/// Unit suffix derived from the field key, e.g. " ℃" for temperatures
pub fn unit_suffix(key: &str) -> String {
    let key = key.to_lowercase();
    let mut suffix = String::new();
    if key.contains("temperature") {
        suffix.push_str(" \u{2103}");
    }
    if key.contains("wind") {
        suffix.push_str(" m/s");
    }
    if key.contains("humidity") {
        suffix.push_str(" %H");
    }
    if key.contains("rssi") {
        suffix.push_str(" dBm");
    }
    if key.contains("battery") {
        suffix.push_str(" %");
    }
    suffix
}
