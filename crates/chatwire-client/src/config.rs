use std::path::Path;
use std::time::Duration;

use chatwire_protocol::DEFAULT_MANIFEST_VERSION;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

/// Where and how to fetch a room's parser manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Room endpoint; the room id is appended as the last path segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Retries after the first attempt (0 = no retries).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff unit, doubled on every retry.
    #[serde(default = "default_base_wait_ms")]
    pub base_wait_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Which manifest of the document decoders are built from.
    #[serde(default = "default_manifest_version")]
    pub manifest_version: String,
}

fn default_base_url() -> String {
    "https://www.stream.me/api-web/v1/chat/room".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_wait_ms() -> u64 {
    500
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_manifest_version() -> String {
    DEFAULT_MANIFEST_VERSION.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            max_retries: default_max_retries(),
            base_wait_ms: default_base_wait_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            manifest_version: default_manifest_version(),
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_wait: Duration::from_millis(self.base_wait_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn room_url(&self, room_id: &str) -> String {
        format!("{}/{room_id}", self.base_url.trim_end_matches('/'))
    }
}
