//! `GET /v1/chart-data`: demo series for the dashboard charts.
//!
//! Requires a live session. The values are synthetic until station readings
//! are persisted.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;

use crate::session::session_id_from_headers;
use crate::AppState;

// ---

const DEMO_DEVICE_ID: &str = "device-demo-01";
const POINTS: usize = 12;

#[derive(Debug, Serialize)]
struct ChartPoint {
    ts: String,
    value: f64,
}

#[derive(Debug, Serialize)]
struct ChartSeries {
    metric: &'static str,
    label: &'static str,
    unit: &'static str,
    data: Vec<ChartPoint>,
}

#[derive(Debug, Serialize)]
struct ChartData {
    status: &'static str,
    device_id: &'static str,
    updated_at: String,
    series: Vec<ChartSeries>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/chart-data", get(handler))
}

async fn handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    // ---
    let authorized = session_id_from_headers(&headers)
        .and_then(|id| state.sessions.get(&id))
        .is_some();
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized" })),
        )
            .into_response();
    }

    Json(demo_chart_data(Utc::now())).into_response()
}

fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn series(
    samples: &[(String, f64)],
    metric: &'static str,
    label: &'static str,
    unit: &'static str,
    f: fn(f64) -> f64,
) -> ChartSeries {
    ChartSeries {
        metric,
        label,
        unit,
        data: samples
            .iter()
            .map(|(ts, i)| ChartPoint {
                ts: ts.clone(),
                value: f(*i),
            })
            .collect(),
    }
}

/// Twelve one-minute samples ending at `now`, oldest first.
fn demo_chart_data(now: DateTime<Utc>) -> ChartData {
    // ---
    let samples: Vec<(String, f64)> = (0..POINTS)
        .rev()
        .map(|i| (iso(now - Duration::minutes(i as i64)), i as f64))
        .collect();

    ChartData {
        status: "ok",
        device_id: DEMO_DEVICE_ID,
        updated_at: iso(now),
        series: vec![
            series(&samples, "temperature", "Temperature", "C", |i| {
                round(20.5 + (i / 3.0).sin() * 1.2, 2)
            }),
            series(&samples, "humidity", "Humidity", "%RH", |i| {
                round(55.0 + (i / 4.0).cos() * 3.0, 1)
            }),
            series(&samples, "pressure", "Pressure", "hPa", |i| {
                round(1013.0 + (i / 2.0).sin() * 0.6, 1)
            }),
            series(&samples, "battery_voltage", "Battery", "V", |i| {
                round(3.8 - i * 0.002, 3)
            }),
        ],
    }
}
