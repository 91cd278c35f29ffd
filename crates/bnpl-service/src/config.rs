//! Service configuration.

use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

use bnpl_core::{DEFAULT_IDEMPOTENCY_TTL_HOURS, DEFAULT_INSTALLMENT_INTERVAL_DAYS};
use bnpl_engine::LedgerConfig;

/// Which store the service runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Process-local store; data is lost on restart.
    #[default]
    Memory,
    /// `RocksDB` under `data_dir` (requires the `rocksdb-backend` feature).
    RocksDb,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "rocksdb" => Ok(Self::RocksDb),
            other => Err(format!("unknown storage backend {other:?}")),
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Storage backend (default: memory).
    pub storage_backend: StorageBackend,

    /// Path to `RocksDB` data directory (default: "/data/bnpl").
    pub data_dir: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Seconds between overdue sweeps.
    pub overdue_sweep_interval_seconds: u64,

    /// Seconds between idempotency cache purges.
    pub idempotency_purge_interval_seconds: u64,

    /// How long idempotent responses are replayed, in hours.
    pub idempotency_ttl_hours: i64,

    /// Days between installment due dates.
    pub installment_interval_days: u32,

    /// Shared secret for merchant webhook signatures (optional).
    pub webhook_secret: Option<String>,

    /// Register the demo users at startup.
    pub seed_demo_users: bool,
}

/// Webhook secrets file structure.
#[derive(Debug, Deserialize)]
struct WebhookSecrets {
    secret: String,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            storage_backend: std::env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|s| match s.parse::<StorageBackend>() {
                    Ok(backend) => Some(backend),
                    Err(e) => {
                        tracing::warn!(error = %e, "Ignoring STORAGE_BACKEND");
                        None
                    }
                })
                .unwrap_or(defaults.storage_backend),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
            overdue_sweep_interval_seconds: env_parse::<u64>("OVERDUE_SWEEP_INTERVAL_SECONDS")
                .filter(|s| *s > 0)
                .unwrap_or(defaults.overdue_sweep_interval_seconds),
            idempotency_purge_interval_seconds: env_parse::<u64>("IDEMPOTENCY_PURGE_INTERVAL_SECONDS")
                .filter(|s| *s > 0)
                .unwrap_or(defaults.idempotency_purge_interval_seconds),
            idempotency_ttl_hours: env_parse::<i64>("IDEMPOTENCY_TTL_HOURS")
                .filter(|h| *h > 0)
                .unwrap_or(defaults.idempotency_ttl_hours),
            installment_interval_days: env_parse::<u32>("INSTALLMENT_INTERVAL_DAYS")
                .filter(|d| *d > 0)
                .unwrap_or(defaults.installment_interval_days),
            webhook_secret: load_webhook_secret(),
            seed_demo_users: env_parse("SEED_DEMO_USERS").unwrap_or(defaults.seed_demo_users),
        }
    }

    /// The ledger tunables carried by this configuration.
    #[must_use]
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            idempotency_ttl: chrono::Duration::hours(self.idempotency_ttl_hours),
            installment_interval_days: self.installment_interval_days,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

/// Load the webhook secret from file or environment.
fn load_webhook_secret() -> Option<String> {
    let secret_paths = [
        ".secrets/webhook.json",
        "bnpl/.secrets/webhook.json",
        "../.secrets/webhook.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<WebhookSecrets>(path) {
            tracing::info!(path = %path, "Loaded webhook secret from file");
            return Some(secrets.secret);
        }
    }

    tracing::debug!("Webhook secrets file not found, using environment variables");
    std::env::var("WEBHOOK_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            storage_backend: StorageBackend::Memory,
            data_dir: "/data/bnpl".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            overdue_sweep_interval_seconds: 300,
            idempotency_purge_interval_seconds: 3600,
            idempotency_ttl_hours: DEFAULT_IDEMPOTENCY_TTL_HOURS,
            installment_interval_days: DEFAULT_INSTALLMENT_INTERVAL_DAYS,
            webhook_secret: None,
            seed_demo_users: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_parses_case_insensitively() {
        assert_eq!("memory".parse(), Ok(StorageBackend::Memory));
        assert_eq!(" RocksDB ".parse(), Ok(StorageBackend::RocksDb));
        assert!("postgres".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn default_ledger_config_matches_ledger_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.ledger_config(), LedgerConfig::default());
        assert_eq!(config.overdue_sweep_interval_seconds, 300);
        assert_eq!(config.idempotency_purge_interval_seconds, 3600);
    }

    #[test]
    fn secrets_file_missing_is_not_found() {
        let err = load_secrets_file::<WebhookSecrets>("does/not/exist.json").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
