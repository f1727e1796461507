//! Process configuration.

use nordjobs_sync::SyncConfig;

/// Runtime configuration assembled once at startup.
///
/// All environment access happens here; the engine and stores receive
/// explicit values instead of reading env vars themselves.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Shared secret required by the sync trigger surface. `None` rejects
    /// every trigger call rather than opening the endpoint.
    pub sync_secret: Option<String>,
    /// Postgres connection string; in-memory stores when absent.
    pub database_url: Option<String>,
    /// Live feed endpoint; the mock fixture adapter when absent.
    pub feed_url: Option<String>,
    /// Grace period before an unseen affiliate job is soft-expired.
    pub expiry_window_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            sync_secret: std::env::var("SYNC_SECRET").ok(),
            database_url: std::env::var("DATABASE_URL").ok(),
            feed_url: std::env::var("FEED_URL").ok(),
            expiry_window_hours: std::env::var("SYNC_EXPIRY_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(48),
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            expiry_window: chrono::Duration::hours(self.expiry_window_hours),
            ..SyncConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_carries_the_expiry_window() {
        let config = AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            sync_secret: None,
            database_url: None,
            feed_url: None,
            expiry_window_hours: 12,
        };

        assert_eq!(config.sync_config().expiry_window, chrono::Duration::hours(12));
    }
}
