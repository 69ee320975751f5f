use std::sync::Arc;

use chatwire_protocol::{Decoder, ManifestDocument};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::FetchError;
use crate::transport::HttpTransport;

/// Looks up parser manifests for chat rooms.
pub struct ManifestClient<T> {
    transport: T,
    config: ClientConfig,
}

#[cfg(feature = "reqwest")]
impl ManifestClient<crate::transport::ReqwestTransport> {
    /// Client backed by `reqwest`, honoring the configured request timeout.
    pub fn from_config(config: ClientConfig) -> Self {
        let transport = crate::transport::ReqwestTransport::new(config.request_timeout());
        Self::new(transport, config)
    }
}

impl<T: HttpTransport> ManifestClient<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch the manifest document for `room_id`.
    ///
    /// Transport failures, non-200 responses and bodies without
    /// `parserManifests` are retried with backoff; after the last retry the
    /// most recent failure is returned.
    pub async fn fetch_manifest(&self, room_id: &str) -> Result<ManifestDocument, FetchError> {
        let url = self.config.room_url(room_id);
        let policy = self.config.retry_policy();
        let mut attempt = 0;

        loop {
            match self.fetch_once(&url).await {
                Ok(document) => {
                    tracing::debug!(room = room_id, attempt, "parser manifest fetched");
                    return Ok(document);
                }
                Err(e) if e.is_retryable() && policy.should_retry(attempt) => {
                    let delay = policy.delay_for(attempt);
                    tracing::debug!(
                        room = room_id,
                        attempt = attempt + 1,
                        error = %e,
                        "retrying parser manifest fetch in {:?}",
                        delay,
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        room = room_id,
                        attempts = attempt + 1,
                        error = %e,
                        "failed to fetch parser manifest"
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Fetch the room's manifest and build a decoder for the configured
    /// manifest version.
    pub async fn create_decoder(&self, room_id: &str) -> Result<Decoder, FetchError> {
        let document = self.fetch_manifest(room_id).await?;
        Ok(Decoder::with_version(
            Arc::new(document),
            &self.config.manifest_version,
        )?)
    }

    async fn fetch_once(&self, url: &str) -> Result<ManifestDocument, FetchError> {
        let response = self
            .transport
            .get(url)
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.is_ok() {
            return Err(FetchError::Status {
                status: response.status,
                reason: failure_reason(&response.body),
            });
        }

        manifest_from_response(&response.body)
    }
}

/// Extract the manifest document from a room response body.
pub fn manifest_from_response(body: &[u8]) -> Result<ManifestDocument, FetchError> {
    let Ok(mut body) = serde_json::from_slice::<Value>(body) else {
        return Err(FetchError::MalformedBody);
    };
    match body.get_mut("parserManifests").map(Value::take) {
        Some(manifests @ Value::Object(_)) => Ok(ManifestDocument::from_value(manifests)?),
        _ => Err(FetchError::MalformedBody),
    }
}

/// First human-readable reason of an API error body, if any.
fn failure_reason(body: &[u8]) -> Option<String> {
    let body: Value = serde_json::from_slice(body).ok()?;
    body.pointer("/reasons/0/message")?
        .as_str()
        .map(str::to_owned)
}
