// HTTP request handlers
use crate::domain::observation::DateRange;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl RangeQuery {
    fn into_range(self) -> Result<DateRange, ApiError> {
        let range = DateRange::new(self.start_date, self.end_date);
        if !range.is_valid() {
            return Err(ApiError::BadRequest(
                "start date must not be after end date".to_string(),
            ));
        }
        Ok(range)
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Aligned observation series for the sensor and weather charts
pub async fn get_observations(
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let range = query.into_range()?;
    let dataset = state.dashboard_service.get_observations(&range).await?;

    Ok(json_response(&dataset, accepts_brotli(&headers)).await?)
}

/// Aligned electricity price and consumption series
pub async fn get_electricity(
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let range = query.into_range()?;
    let compress = accepts_brotli(&headers);

    match state.dashboard_service.get_electricity(&range).await? {
        Some(electricity) => Ok(json_response(&electricity, compress).await?),
        None => Ok(json_response(&json!({ "error": "not-enabled" }), compress).await?),
    }
}

/// Observations and electricity data in one response
pub async fn get_dashboard(
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let range = query.into_range()?;
    let dashboard = state.dashboard_service.get_dashboard(&range).await?;

    Ok(json_response(&dashboard, accepts_brotli(&headers)).await?)
}
