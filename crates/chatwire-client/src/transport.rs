//! HTTP seam for the manifest lookup.
//!
//! The client only ever issues a GET and looks at the status code and body,
//! so that is all the trait exposes. Tests drive the client with a scripted
//! transport; production uses [`ReqwestTransport`].

use bytes::Bytes;
use futures::future::BoxFuture;

/// A minimal async HTTP client.
pub trait HttpTransport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, Self::Error>>;
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_transport::{ReqwestTransport, ReqwestTransportError};

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use std::time::Duration;

    use futures::future::BoxFuture;
    use futures::FutureExt;
    use reqwest::header::ACCEPT;

    use super::{HttpResponse, HttpTransport};

    #[derive(Debug, thiserror::Error)]
    #[error("HTTP request failed: {0}")]
    pub struct ReqwestTransportError(#[from] reqwest::Error);

    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        inner: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new(timeout: Duration) -> Self {
            Self {
                inner: reqwest::Client::builder()
                    .timeout(timeout)
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            }
        }
    }

    impl HttpTransport for ReqwestTransport {
        type Error = ReqwestTransportError;

        fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, Self::Error>> {
            async move {
                let response = self
                    .inner
                    .get(url)
                    .header(ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status().as_u16();
                let body = response.bytes().await?;
                Ok(HttpResponse { status, body })
            }
            .boxed()
        }
    }
}
