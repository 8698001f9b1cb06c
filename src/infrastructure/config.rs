use chrono::FixedOffset;
use serde::Deserialize;

use crate::application::aligner::DisplayZone;

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub api: ApiSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AlignmentConfig {
    #[serde(default)]
    pub alignment: AlignmentSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlignmentSettings {
    /// Device readings closer than this to a tick's first reading join that tick
    #[serde(default = "default_threshold_seconds")]
    pub threshold_seconds: i64,
    #[serde(default = "default_true")]
    pub include_auxiliary_devices: bool,
    #[serde(default = "default_weather_fields")]
    pub weather_fields: Vec<String>,
    #[serde(default = "default_other_fields")]
    pub other_fields: Vec<String>,
    #[serde(default = "default_device_fields")]
    pub device_fields: Vec<String>,
    /// Fixed display offset; the host's local zone is used when unset
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        Self {
            threshold_seconds: default_threshold_seconds(),
            include_auxiliary_devices: true,
            weather_fields: default_weather_fields(),
            other_fields: default_other_fields(),
            device_fields: default_device_fields(),
            utc_offset_minutes: None,
        }
    }
}

impl AlignmentSettings {
    pub fn display_zone(&self) -> anyhow::Result<DisplayZone> {
        match self.utc_offset_minutes {
            None => Ok(DisplayZone::Local),
            Some(minutes) => FixedOffset::east_opt(minutes * 60)
                .map(DisplayZone::Fixed)
                .ok_or_else(|| anyhow::anyhow!("invalid utc_offset_minutes: {}", minutes)),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_threshold_seconds() -> i64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_weather_fields() -> Vec<String> {
    ["fmi-temperature", "cloudiness", "wind-speed"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_other_fields() -> Vec<String> {
    ["brightness", "o-temperature", "beacon-rssi", "beacon-battery"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_device_fields() -> Vec<String> {
    ["temperature", "humidity"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("OBSCHARTS").separator("__")
}

pub fn load_api_config() -> anyhow::Result<ApiConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/api").required(false))
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_alignment_config() -> anyhow::Result<AlignmentConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/alignment").required(false))
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}
