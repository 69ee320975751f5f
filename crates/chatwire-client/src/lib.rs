pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod retry;
pub mod transport;

pub use cache::DecoderCache;
pub use client::{manifest_from_response, ManifestClient};
pub use config::ClientConfig;
pub use error::{ConfigError, FetchError};
pub use retry::RetryPolicy;
pub use transport::{HttpResponse, HttpTransport};

#[cfg(feature = "reqwest")]
pub use transport::{ReqwestTransport, ReqwestTransportError};
