//! Response bodies that are not domain entities.

use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" when the service is up
    pub status: String,
    /// Whether the backing store answered its liveness probe
    pub database: bool,
}
