//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FarmRepository;
use crate::services::weather::WeatherApiConfig;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FarmRepository>,
    /// Weather API parameters, when configured
    pub weather: Option<WeatherApiConfig>,
    /// Shared HTTP client for upstream calls
    pub http_client: reqwest::Client,
}

impl AppState {
    /// Create application state with weather parameters read from the
    /// environment (absent when `OPENWEATHER_API_KEY` is unset).
    pub fn new(repository: Arc<dyn FarmRepository>) -> Self {
        Self {
            repository,
            weather: WeatherApiConfig::from_env().ok(),
            http_client: reqwest::Client::new(),
        }
    }
}
