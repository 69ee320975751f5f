use std::collections::HashMap;

use chatwire_protocol::Decoder;
use parking_lot::RwLock;

use crate::client::ManifestClient;
use crate::error::FetchError;
use crate::transport::HttpTransport;

/// Decoders keyed by room id.
///
/// A room's manifest is looked up on first use and reused until the room is
/// invalidated. Two first uses racing for the same room may both fetch; the
/// first decoder stored wins.
pub struct DecoderCache<T> {
    client: ManifestClient<T>,
    decoders: RwLock<HashMap<String, Decoder>>,
}

impl<T: HttpTransport> DecoderCache<T> {
    pub fn new(client: ManifestClient<T>) -> Self {
        Self {
            client,
            decoders: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, room_id: &str) -> Option<Decoder> {
        self.decoders.read().get(room_id).cloned()
    }

    pub async fn get_or_fetch(&self, room_id: &str) -> Result<Decoder, FetchError> {
        if let Some(decoder) = self.get(room_id) {
            return Ok(decoder);
        }

        let decoder = self.client.create_decoder(room_id).await?;
        tracing::debug!(room = room_id, version = decoder.version(), "caching room decoder");

        let mut decoders = self.decoders.write();
        Ok(decoders
            .entry(room_id.to_owned())
            .or_insert(decoder)
            .clone())
    }

    /// Drop a room's decoder so the next use fetches a fresh manifest.
    /// Returns whether the room was cached.
    pub fn invalidate(&self, room_id: &str) -> bool {
        self.decoders.write().remove(room_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.decoders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.read().is_empty()
    }
}
