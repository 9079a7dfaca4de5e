use std::path::PathBuf;
use std::sync::Arc;

use goodvibes_core::storage::{ClientStorage, FileStorage, MemoryStorage};

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the remote API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API server, without the `/api/v1` prefix.
    pub api_url: String,
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Load from environment variables.
    ///
    /// Returns `None` when `GOODVIBES_API_URL` is unset or blank: the client
    /// is then "not configured" and runs without a remote store.
    ///
    /// | Env Var                          | Default |
    /// |----------------------------------|---------|
    /// | `GOODVIBES_API_URL`              | (none)  |
    /// | `GOODVIBES_REQUEST_TIMEOUT_SECS` | `30`    |
    pub fn from_env() -> Option<Self> {
        let api_url = std::env::var("GOODVIBES_API_URL").ok()?;
        if api_url.trim().is_empty() {
            return None;
        }

        let request_timeout_secs = match std::env::var("GOODVIBES_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Invalid GOODVIBES_REQUEST_TIMEOUT_SECS, using default");
                DEFAULT_REQUEST_TIMEOUT_SECS
            }),
            Err(_) => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Some(Self {
            request_timeout_secs,
            ..Self::new(api_url.trim())
        })
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.api_url)
    }
}

/// Client storage selected by `GOODVIBES_STORAGE_PATH`.
///
/// A JSON file at that path when set, otherwise an in-memory store that
/// forgets the device identity and vote ledger on exit.
pub fn storage_from_env() -> Arc<dyn ClientStorage> {
    storage_at(std::env::var("GOODVIBES_STORAGE_PATH").ok().as_deref())
}

/// File storage at `path`, or memory storage when it is absent or blank.
pub fn storage_at(path: Option<&str>) -> Arc<dyn ClientStorage> {
    match path.map(str::trim) {
        Some(path) if !path.is_empty() => Arc::new(FileStorage::new(PathBuf::from(path))),
        _ => {
            tracing::info!("GOODVIBES_STORAGE_PATH not set, client state will not persist");
            Arc::new(MemoryStorage::new())
        }
    }
}
