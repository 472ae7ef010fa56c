//! Open-Meteo proxy: cached upstream client plus dashboard remapping.

mod cache;
mod client;
pub mod codes;
pub mod remap;

use std::time::Duration;

pub use cache::TtlCache;
pub use client::{Fetched, OpenMeteoClient, UpstreamError};

// ---

/// Location used when the dashboard does not pass coordinates.
pub const DEFAULT_LAT: f64 = 50.01548560455507;
pub const DEFAULT_LON: f64 = 20.01632187262851;

pub const CURRENT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
pub const FORECAST_CACHE_TTL: Duration = Duration::from_secs(30 * 60);
pub const ANALYTICS_CACHE_TTL: Duration = Duration::from_secs(15 * 60);
