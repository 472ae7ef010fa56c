//! Batch ingestion processor.
//!
//! Turns a raw request body into an [`IngestOutcome`]:
//! parse JSON, validate the envelope (fail fast), validate every reading on
//! its own, then decide between full, partial and no acceptance. Pure: no
//! I/O, no shared state. Accepted readings are not stored anywhere yet.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::models::{Reading, TelemetryBatchEnvelope};
use crate::validation::{validate_envelope, validate_reading, ValidationErrors};

// ---

/// Error tag carried by every per-reading rejection.
pub const INVALID_READING: &str = "invalid_reading";

/// A reading that failed validation, located by its index in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub index: usize,
    pub error: &'static str,
    pub message: String,
}

/// Terminal state of one ingestion request (method checks happen in the router).
#[derive(Debug)]
pub enum IngestOutcome {
    InvalidJson,
    InvalidEnvelope(ValidationErrors),
    AllInvalid {
        rejections: Vec<Rejection>,
    },
    PartiallyAccepted {
        envelope: TelemetryBatchEnvelope,
        accepted: Vec<Reading>,
        rejections: Vec<Rejection>,
    },
    FullyAccepted {
        envelope: TelemetryBatchEnvelope,
        accepted: Vec<Reading>,
    },
}

/// Readings split by validity, both halves in input order.
#[derive(Debug, Default)]
pub struct Partition {
    pub accepted: Vec<Reading>,
    pub rejections: Vec<Rejection>,
}

/// Parse and process a raw request body.
pub fn process_body(body: &[u8]) -> IngestOutcome {
    // ---
    match serde_json::from_slice::<Value>(body) {
        Ok(payload) => process(&payload),
        Err(e) => {
            debug!("Ingest body is not JSON: {}", e);
            IngestOutcome::InvalidJson
        }
    }
}

/// Process an already-parsed payload.
pub fn process(payload: &Value) -> IngestOutcome {
    // ---
    let envelope = match validate_envelope(payload) {
        Ok(envelope) => envelope,
        Err(errors) => {
            info!("Rejecting batch, envelope invalid: {}", errors);
            return IngestOutcome::InvalidEnvelope(errors);
        }
    };

    let Partition {
        accepted,
        rejections,
    } = partition(&envelope.readings);

    info!(
        device_id = %envelope.device_id,
        seq = ?envelope.seq,
        accepted = accepted.len(),
        rejected = rejections.len(),
        "Batch validated"
    );
    for reading in &accepted {
        debug!(
            "Accepted {}/{} from {} at {}",
            reading.sensor_key, reading.metric, envelope.device_id, reading.ts
        );
    }

    if accepted.is_empty() {
        IngestOutcome::AllInvalid { rejections }
    } else if !rejections.is_empty() {
        IngestOutcome::PartiallyAccepted {
            envelope,
            accepted,
            rejections,
        }
    } else {
        IngestOutcome::FullyAccepted { envelope, accepted }
    }
}

/// Validate each candidate independently, preserving order on both sides.
pub fn partition(readings: &[Value]) -> Partition {
    // ---
    let mut result = Partition::default();

    for (index, raw) in readings.iter().enumerate() {
        match validate_reading(raw) {
            Ok(reading) => result.accepted.push(reading),
            Err(errors) => result.rejections.push(Rejection {
                index,
                error: INVALID_READING,
                message: errors.to_string(),
            }),
        }
    }

    result
}
