use chatwire_protocol::ManifestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("manifest request failed: {0}")]
    Transport(String),

    #[error(
        "Unable to fetch parser manifest, status code: {status}{}",
        reason_suffix(.reason)
    )]
    Status { status: u16, reason: Option<String> },

    #[error("Malformed response body: this parserManifest doesn't exist.")]
    MalformedBody,

    #[error("invalid parser manifest: {0}")]
    Manifest(#[from] ManifestError),
}

impl FetchError {
    /// Whether another attempt could succeed. A manifest that was delivered
    /// but fails validation is final.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Manifest(_))
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(" reason: {r}"))
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
