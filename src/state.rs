//! Shared state handed to every route.

use std::sync::Arc;

use anyhow::Result;

use crate::{session::SessionStore, weather::OpenMeteoClient, Config};

// ---

/// Cheap to clone: everything behind it is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<dyn SessionStore>,
    pub weather: OpenMeteoClient,
}

impl AppState {
    /// Build state from configuration with an explicitly chosen session store.
    pub fn new(config: Config, sessions: Arc<dyn SessionStore>) -> Result<Self> {
        // ---
        let weather = OpenMeteoClient::new(&config.open_meteo_base_url, config.upstream_timeout)?;

        Ok(Self {
            config: Arc::new(config),
            sessions,
            weather,
        })
    }
}
