//! Open-Meteo proxy routes.
//!
//! Each route resolves its query, asks the shared [`OpenMeteoClient`] for the
//! upstream payload (cached per URL) and remaps it for the dashboard.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::weather::{
    remap, UpstreamError, ANALYTICS_CACHE_TTL, CURRENT_CACHE_TTL, DEFAULT_LAT, DEFAULT_LON,
    FORECAST_CACHE_TTL,
};
use crate::AppState;

// ---

const DEFAULT_DAYS: u32 = 7;
const MAX_DAYS: u32 = 16;
const DEFAULT_PAST_DAYS: u32 = 2;
const MAX_PAST_DAYS: u32 = 7;

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/v1/open-meteo/current", get(current))
        .route("/v1/open-meteo/forecast", get(forecast))
        .route("/v1/open-meteo/analytics", get(analytics))
}

/// Raw query values. Kept as strings so bad numbers can be reported (for
/// coordinates) or defaulted (for day counts) instead of rejected by the
/// extractor.
#[derive(Debug, Default, Deserialize)]
struct WeatherQuery {
    lat: Option<String>,
    lon: Option<String>,
    days: Option<String>,
    past_days: Option<String>,
}

fn parse_coordinate(raw: Option<&str>, default: f64) -> Option<f64> {
    match raw {
        None => Some(default),
        Some(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

fn parse_clamped(raw: Option<&str>, default: u32, min: u32, max: u32) -> u32 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|v| v.clamp(min as i64, max as i64) as u32)
        .unwrap_or(default)
}

impl WeatherQuery {
    fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = parse_coordinate(self.lat.as_deref(), DEFAULT_LAT)?;
        let lon = parse_coordinate(self.lon.as_deref(), DEFAULT_LON)?;
        Some((lat, lon))
    }

    fn days(&self) -> u32 {
        parse_clamped(self.days.as_deref(), DEFAULT_DAYS, 1, MAX_DAYS)
    }

    fn past_days(&self) -> u32 {
        parse_clamped(self.past_days.as_deref(), DEFAULT_PAST_DAYS, 0, MAX_PAST_DAYS)
    }
}

fn invalid_coordinates() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid coordinates" })),
    )
        .into_response()
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        // ---
        warn!("Open-Meteo request failed: {}", self);
        (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "status": "error",
                "error": self.to_string(),
                "source": "open-meteo",
            })),
        )
            .into_response()
    }
}

/// `now` shifted into the location's local time, which is what upstream
/// hourly stamps use. An out-of-range offset leaves `now` unshifted.
fn local_time(now: DateTime<Utc>, offset_secs: i64) -> NaiveDateTime {
    TimeDelta::try_seconds(offset_secs)
        .and_then(|offset| now.checked_add_signed(offset))
        .unwrap_or(now)
        .naive_utc()
}

async fn current(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Response, UpstreamError> {
    // ---
    let Some((lat, lon)) = query.coordinates() else {
        return Ok(invalid_coordinates());
    };

    let fetched = state
        .weather
        .forecast(&remap::current_params(lat, lon), CURRENT_CACHE_TTL)
        .await?;
    Ok(Json(remap::current_body(&fetched.data, fetched.cached)).into_response())
}

async fn forecast(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Response, UpstreamError> {
    // ---
    let Some((lat, lon)) = query.coordinates() else {
        return Ok(invalid_coordinates());
    };

    let params = remap::forecast_params(lat, lon, query.days());
    let fetched = state.weather.forecast(&params, FORECAST_CACHE_TTL).await?;
    Ok(Json(remap::forecast_body(&fetched.data, fetched.cached)).into_response())
}

async fn analytics(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Response, UpstreamError> {
    // ---
    let Some((lat, lon)) = query.coordinates() else {
        return Ok(invalid_coordinates());
    };

    let past_days = query.past_days();
    let params = remap::analytics_params(lat, lon, query.days(), past_days);
    let fetched = state.weather.forecast(&params, ANALYTICS_CACHE_TTL).await?;

    let now = Utc::now();
    let offset = fetched
        .data
        .get("utc_offset_seconds")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let local_now = local_time(now, offset);
    let generated_at = now.to_rfc3339_opts(SecondsFormat::Millis, true);

    Ok(Json(remap::analytics_body(
        &fetched.data,
        fetched.cached,
        past_days,
        local_now,
        &generated_at,
    ))
    .into_response())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn query(lat: Option<&str>, lon: Option<&str>) -> WeatherQuery {
        WeatherQuery {
            lat: lat.map(str::to_string),
            lon: lon.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn coordinates_default_when_absent() {
        // ---
        assert_eq!(
            query(None, None).coordinates(),
            Some((DEFAULT_LAT, DEFAULT_LON))
        );
        assert_eq!(
            query(Some("52.1"), Some("-0.5")).coordinates(),
            Some((52.1, -0.5))
        );
    }

    #[test]
    fn bad_coordinates_are_rejected() {
        // ---
        assert_eq!(query(Some("north"), None).coordinates(), None);
        assert_eq!(query(None, Some("")).coordinates(), None);
        assert_eq!(query(Some("NaN"), None).coordinates(), None);
        assert_eq!(query(None, Some("inf")).coordinates(), None);
    }

    #[test]
    fn day_counts_are_clamped_or_defaulted() {
        // ---
        let mut q = WeatherQuery::default();
        assert_eq!(q.days(), 7);
        assert_eq!(q.past_days(), 2);

        q.days = Some("40".into());
        q.past_days = Some("-3".into());
        assert_eq!(q.days(), 16);
        assert_eq!(q.past_days(), 0);

        q.days = Some("0".into());
        q.past_days = Some("9".into());
        assert_eq!(q.days(), 1);
        assert_eq!(q.past_days(), 7);

        q.days = Some("soon".into());
        q.past_days = Some("1.5".into());
        assert_eq!(q.days(), 7);
        assert_eq!(q.past_days(), 2);
    }

    #[test]
    fn local_time_applies_offset_and_ignores_overflow() {
        // ---
        let now = DateTime::parse_from_rfc3339("2025-06-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(local_time(now, 7200).to_string(), "2025-06-01 12:00:00");
        assert_eq!(local_time(now, i64::MAX), now.naive_utc());
        assert_eq!(local_time(now, i64::MIN), now.naive_utc());
    }

    #[test]
    fn upstream_error_maps_to_502() {
        // ---
        let err = UpstreamError::Status {
            status: 500,
            reason: "Internal Server Error".into(),
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
