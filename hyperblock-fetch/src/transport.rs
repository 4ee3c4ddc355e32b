//! Raw GET transport to the proxy API.
//!
//! The fetcher only needs "GET this path, give me the status and body". The
//! [`Transport`] trait captures exactly that so tests can substitute an
//! in-memory stub for [`HttpTransport`].

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Status and body of a completed request, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// A `200 OK` response with the given body.
    #[must_use]
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Whether the status is `200 OK`.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// A request that produced no response at all.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request path does not form a valid URL.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Connection, timeout or body read failure.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Any other transport-level failure.
    #[error("{0}")]
    Other(String),
}

/// Performs `GET {base}/{path}` against the proxy.
pub trait Transport: Send + Sync + 'static {
    /// Fetch `path`, relative to the transport's base URL.
    ///
    /// Non-2xx statuses are not errors at this level; they are reported in
    /// [`RawResponse::status`].
    fn fetch_raw(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    /// Build a transport for the proxy at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Url`] if `base_url` is not a valid URL and
    /// [`TransportError::Http`] if the client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let mut base = Url::parse(base_url)?;
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()?;
        Ok(Self { http, base })
    }

    /// Base URL every request path is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }
}

impl Transport for HttpTransport {
    async fn fetch_raw(&self, path: &str) -> Result<RawResponse, TransportError> {
        let url = self.base.join(path)?;
        let response = self.http.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let transport = HttpTransport::new("http://proxy.local/api", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.base_url().as_str(), "http://proxy.local/api/");
        let joined = transport
            .base_url()
            .join("hyperblock/by-nonce/7?withLogs=true")
            .unwrap();
        assert_eq!(
            joined.as_str(),
            "http://proxy.local/api/hyperblock/by-nonce/7?withLogs=true",
            "path and query resolved under the base"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = HttpTransport::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, TransportError::Url(_)), "{err}");
    }
}
