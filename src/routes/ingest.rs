//! `POST /v1/ingest`: telemetry batch submission.
//!
//! Maps each [`IngestOutcome`] to exactly one status code and JSON body:
//!
//! | outcome            | status | `status` field |
//! |--------------------|--------|----------------|
//! | invalid JSON       | 400    | `error`        |
//! | envelope invalid   | 400    | `error`        |
//! | all readings bad   | 400    | `error`        |
//! | partially accepted | 207    | `partial`      |
//! | fully accepted     | 200    | `ok`           |
//!
//! Any other method gets 405 via the shared method fallback.

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

use super::method_not_allowed;
use crate::ingest::{process_body, IngestOutcome};

// ---

const INVALID_PAYLOAD: &str = "invalid_payload";

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/v1/ingest", post(handler).fallback(method_not_allowed))
}

async fn handler(body: Bytes) -> Response {
    // ---
    info!("POST /v1/ingest - {} bytes", body.len());
    process_body(&body).into_response()
}

impl IngestOutcome {
    pub fn status_code(&self) -> StatusCode {
        match self {
            IngestOutcome::InvalidJson
            | IngestOutcome::InvalidEnvelope(_)
            | IngestOutcome::AllInvalid { .. } => StatusCode::BAD_REQUEST,
            IngestOutcome::PartiallyAccepted { .. } => StatusCode::MULTI_STATUS,
            IngestOutcome::FullyAccepted { .. } => StatusCode::OK,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            IngestOutcome::InvalidJson => json!({
                "status": "error",
                "error": INVALID_PAYLOAD,
                "message": "Invalid JSON",
            }),
            IngestOutcome::InvalidEnvelope(errors) => json!({
                "status": "error",
                "error": INVALID_PAYLOAD,
                "message": "Envelope validation failed",
                "details": errors,
            }),
            IngestOutcome::AllInvalid { rejections } => json!({
                "status": "error",
                "error": INVALID_PAYLOAD,
                "message": "All readings invalid",
                "rejections": rejections,
            }),
            IngestOutcome::PartiallyAccepted {
                accepted,
                rejections,
                ..
            } => json!({
                "status": "partial",
                "ingested": accepted.len(),
                "rejected": rejections.len(),
                "rejections": rejections,
            }),
            IngestOutcome::FullyAccepted { accepted, .. } => json!({
                "status": "ok",
                "ingested": accepted.len(),
            }),
        }
    }
}

impl IntoResponse for IngestOutcome {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    fn reading() -> Value {
        json!({
            "ts": "2025-01-01T00:00:00Z",
            "sensor_key": "temp_1",
            "metric": "temperature",
            "unit": "C",
            "value": 21.5
        })
    }

    fn batch(readings: Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "schema": "measurements.v1",
            "device_id": "d-1",
            "sent_at": "2025-01-01T00:00:10Z",
            "readings": readings
        }))
        .unwrap()
    }

    #[test]
    fn invalid_json_maps_to_400() {
        // ---
        let outcome = process_body(b"not json");
        assert_eq!(outcome.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            outcome.body(),
            json!({ "status": "error", "error": "invalid_payload", "message": "Invalid JSON" })
        );
    }

    #[test]
    fn envelope_failure_carries_details_only() {
        // ---
        let outcome = process_body(br#"{"device_id":"d-1","readings":[{}]}"#);
        let body = outcome.body();
        assert_eq!(outcome.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("Envelope validation failed"));
        assert_eq!(body["details"][0]["path"], json!("schema"));
        assert!(body.get("rejections").is_none());
    }

    #[test]
    fn all_invalid_maps_to_400_with_rejections() {
        // ---
        let outcome = process_body(&batch(json!([{}])));
        let body = outcome.body();
        assert_eq!(outcome.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], json!("All readings invalid"));
        assert_eq!(body["rejections"].as_array().unwrap().len(), 1);
        assert_eq!(body["rejections"][0]["error"], json!("invalid_reading"));
        assert_eq!(body["rejections"][0]["index"], json!(0));
    }

    #[test]
    fn partial_maps_to_207() {
        // ---
        let mut bad = reading();
        bad["ts"] = json!("bad-ts");
        let outcome = process_body(&batch(json!([reading(), bad])));

        assert_eq!(outcome.status_code(), StatusCode::MULTI_STATUS);
        assert_eq!(
            outcome.body(),
            json!({
                "status": "partial",
                "ingested": 1,
                "rejected": 1,
                "rejections": [{
                    "index": 1,
                    "error": "invalid_reading",
                    "message": "ts: ts must be RFC3339 string"
                }]
            })
        );
    }

    #[test]
    fn full_acceptance_maps_to_200() {
        // ---
        let outcome = process_body(&batch(json!([reading()])));
        assert_eq!(outcome.status_code(), StatusCode::OK);
        assert_eq!(outcome.body(), json!({ "status": "ok", "ingested": 1 }));
    }
}
