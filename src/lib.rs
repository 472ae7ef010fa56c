//! Edge API for a personal weather station.
//!
//! - `POST /v1/ingest` validates telemetry batches from station firmware
//! - `/auth/*` and `GET /v1/chart-data` back the dashboard login and charts
//! - `GET /v1/open-meteo/*` proxies and reshapes Open-Meteo forecasts
//!
//! The binary in `main.rs` only loads configuration, installs tracing and
//! serves [`routes::router`]; everything else lives in this library so the
//! integration tests can run the same router in-process.

pub mod config;
pub mod cookies;
pub mod ingest;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod validation;
pub mod weather;

pub use config::Config;
pub use models::{Reading, TelemetryBatchEnvelope};
pub use session::{MemorySessionStore, SessionStore};
pub use state::AppState;
