use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use event_wire::drain::DrainBodyFuture;
use event_wire::{byte_body, empty_body};
use http_body_util::Full;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Request, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

/// Status and drained body of one response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Pooled HTTP/1 client bound to one target host.
///
/// Clones share the connection pool.
#[derive(Clone)]
pub struct HttpClient {
    client: Client<HttpConnector, Full<Bytes>>,
    host: Arc<str>,
    timeout: Option<Duration>,
}

impl HttpClient {
    /// `host` is a base URI such as `http://localhost:8000`, request paths are appended to it.
    pub fn new(host: &str) -> Result<Self> {
        let host = host.trim_end_matches('/');
        let uri: Uri = host
            .parse()
            .with_context(|| format!("Invalid host {host:?}"))?;
        if uri.scheme_str() != Some("http") {
            bail!("Unsupported host {host:?}, only http:// targets are supported");
        }
        if uri.authority().is_none() {
            bail!("Host {host:?} is missing an authority");
        }
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self {
            client,
            host: Arc::from(host),
            timeout: None,
        })
    }

    /// Fails requests whose response is not fully received within `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    #[must_use]
    pub fn uri(&self, path: &str) -> String {
        format!("{}{path}", self.host)
    }

    pub async fn send_recv(&self, request: Request<Full<Bytes>>) -> Result<RawResponse> {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.exchange(request))
                .await
                .with_context(|| format!("Request timed out after {timeout:?}"))?,
            None => self.exchange(request).await,
        }
    }

    pub async fn post_json(&self, path: &str, body: Bytes) -> Result<RawResponse> {
        let request = Request::post(self.uri(path))
            .header(CONTENT_TYPE, "application/json")
            .body(byte_body(body))
            .context("Failed to build post request")?;
        self.send_recv(request).await
    }

    pub async fn get(&self, path: &str) -> Result<RawResponse> {
        let request = Request::get(self.uri(path))
            .body(empty_body())
            .context("Failed to build get request")?;
        self.send_recv(request).await
    }

    async fn exchange(&self, request: Request<Full<Bytes>>) -> Result<RawResponse> {
        let resp = self
            .client
            .request(request)
            .await
            .context("Failed to send request")?;
        let status = resp.status();
        let content_length: usize = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|hv| hv.to_str().ok())
            .and_then(|hv| hv.parse().ok())
            .unwrap_or(1024);
        let body: Vec<u8> =
            DrainBodyFuture::new_trusted_length(resp.into_body(), content_length.min(1 << 20))
                .await
                .context("Failed to read response body")?;
        Ok(RawResponse { status, body })
    }
}
