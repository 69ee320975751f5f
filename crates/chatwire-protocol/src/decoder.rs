use std::sync::Arc;

use serde_json::Value;

use crate::decode::{decode_level, value_kind};
use crate::error::{DecodeError, ManifestError};
use crate::manifest::{Manifest, ManifestDocument, DEFAULT_MANIFEST_VERSION};
use crate::message::Message;

/// Decodes raw chat messages for one room.
///
/// Cheap to clone and safe to share across threads: the manifest document is
/// held behind an `Arc` and never mutated.
#[derive(Debug, Clone)]
pub struct Decoder {
    document: Arc<ManifestDocument>,
    manifest: Arc<Manifest>,
    version: String,
}

/// Build a decoder for the default manifest version.
pub fn create_decoder(document: ManifestDocument) -> Result<Decoder, ManifestError> {
    Decoder::new(document)
}

impl Decoder {
    pub fn new(document: ManifestDocument) -> Result<Self, ManifestError> {
        Self::with_version(Arc::new(document), DEFAULT_MANIFEST_VERSION)
    }

    /// Build a decoder for a specific manifest version of a shared document.
    pub fn with_version(
        document: Arc<ManifestDocument>,
        version: &str,
    ) -> Result<Self, ManifestError> {
        let manifest = document
            .manifest(version)
            .cloned()
            .ok_or_else(|| ManifestError::MissingVersion(version.to_owned()))?;

        tracing::debug!(
            version,
            fields = manifest.len(),
            templates = document.url_templates().len(),
            "parser manifest loaded"
        );

        Ok(Self {
            document,
            manifest,
            version: version.to_owned(),
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn document(&self) -> &ManifestDocument {
        &self.document
    }

    /// Decode one raw message, which must be a JSON array.
    pub fn decode(&self, raw: &Value) -> Result<Message, DecodeError> {
        let Value::Array(part) = raw else {
            return Err(DecodeError::InputShape {
                found: value_kind(raw),
            });
        };

        let fields = decode_level(part, &self.manifest, &self.document.templates());
        let message = Message::from_fields(fields);

        tracing::trace!(
            fields = message.fields().len(),
            replaceable = message.index().len(),
            "decoded chat message"
        );
        Ok(message)
    }

    /// Parse JSON text, then decode it.
    pub fn decode_slice(&self, bytes: &[u8]) -> Result<Message, DecodeError> {
        let raw: Value = serde_json::from_slice(bytes)?;
        self.decode(&raw)
    }

    pub fn decode_str(&self, text: &str) -> Result<Message, DecodeError> {
        let raw: Value = serde_json::from_str(text)?;
        self.decode(&raw)
    }
}
