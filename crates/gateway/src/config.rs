//! Gateway configuration.

use fanbuf::BufferConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration injected at supervisor construction.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Path to the room map file (`<room_id> <sensor_id>` per line).
    pub map_path: PathBuf,
    /// SQLite database path; `:memory:` is accepted.
    pub db_uri: String,
    /// Watchdog timeout for every blocking buffer wait, in milliseconds.
    pub cv_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            map_path: PathBuf::from("room_sensor.map"),
            db_uri: "sensor_gateway.db".to_owned(),
            cv_timeout_ms: 10_000,
        }
    }
}

impl GatewayConfig {
    /// Sets the room map path.
    pub fn with_map_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.map_path = path.into();
        self
    }

    /// Sets the database location.
    pub fn with_db_uri(mut self, uri: impl Into<String>) -> Self {
        self.db_uri = uri.into();
        self
    }

    /// Sets the condvar watchdog timeout.
    pub fn with_cv_timeout_ms(mut self, millis: u64) -> Self {
        self.cv_timeout_ms = millis;
        self
    }

    /// The buffer configuration this gateway config implies.
    pub fn buffer_config(&self) -> BufferConfig {
        BufferConfig::default().with_wait_timeout(Duration::from_millis(self.cv_timeout_ms))
    }
}
