use thiserror::Error;

/// A parser manifest document could not be turned into a usable decoder.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("manifest document has no \"{0}\" manifest")]
    MissingVersion(String),

    #[error("invalid manifest entry \"{field}\": {reason}")]
    InvalidEntry { field: String, reason: String },
}

/// A single raw message could not be decoded.
///
/// Failures are local to the message being decoded; the decoder stays usable.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("could not parse message: raw message isn't an array as expected (found {found})")]
    InputShape { found: &'static str },

    #[error("could not parse message: invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
