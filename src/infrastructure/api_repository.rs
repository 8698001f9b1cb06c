// Upstream data API repository implementation
use crate::application::observation_repository::ObservationRepository;
use crate::domain::electricity::ElectricityBatch;
use crate::domain::observation::{DateRange, ObservationBatch};
use crate::infrastructure::wire_mapper::{batch_from_json, electricity_from_json};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const DISPLAY_PATH: &str = "data/display";
const ELECTRICITY_PATH: &str = "data/elec-data";
const ELECTRICITY_NOT_ENABLED: &str = "not-enabled";

#[derive(Debug, Clone)]
pub struct HttpObservationRepository {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpObservationRepository {
    pub fn new(base_url: String, token: Option<String>, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    fn build_query_url(&self, path: &str, range: &DateRange) -> String {
        let mut params = Vec::new();
        if let Some(start) = range.start {
            params.push(format!("startDate={}", urlencoding::encode(&start.to_string())));
        }
        if let Some(end) = range.end {
            params.push(format!("endDate={}", urlencoding::encode(&end.to_string())));
        }

        if params.is_empty() {
            format!("{}/{}", self.base_url, path)
        } else {
            format!("{}/{}?{}", self.base_url, path, params.join("&"))
        }
    }

    async fn execute_query(&self, url: &str) -> Result<Value> {
        tracing::debug!("Requesting {}", url);

        let mut request = self.client.get(url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header("Cookie", format!("X-Authorization-Token={}", token));
        }

        let response = request
            .send()
            .await
            .context("Failed to send request to the data API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Data API request failed with status {}: {}", status, body);
        }

        response
            .json::<Value>()
            .await
            .context("Failed to parse data API response")
    }
}

/// Electricity payloads report problems in an `error` field
fn electricity_payload(payload: &Value) -> Result<Option<ElectricityBatch>> {
    match payload.get("error").and_then(Value::as_str) {
        Some(ELECTRICITY_NOT_ENABLED) => Ok(None),
        Some(error) => anyhow::bail!("Electricity data error: {}", error),
        None if payload.is_null() => Ok(None),
        None => Ok(Some(electricity_from_json(payload)?)),
    }
}

#[async_trait]
impl ObservationRepository for HttpObservationRepository {
    async fn fetch_display_data(&self, range: &DateRange) -> Result<ObservationBatch> {
        let url = self.build_query_url(DISPLAY_PATH, range);
        let payload = self.execute_query(&url).await?;

        Ok(batch_from_json(&payload)?)
    }

    async fn fetch_electricity_data(&self, range: &DateRange) -> Result<Option<ElectricityBatch>> {
        let url = self.build_query_url(ELECTRICITY_PATH, range);
        let payload = self.execute_query(&url).await?;

        let batch = electricity_payload(&payload)?;
        if batch.is_none() {
            tracing::debug!("Electricity data is not enabled upstream");
        }
        Ok(batch)
    }
}
