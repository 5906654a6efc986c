//! HTTP transport used by the lookup client.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::trace;
use url::Url;

use crate::error::TransportError;

/// Media types accepted from WebFinger endpoints, preferred first.
pub const JRD_ACCEPT: &str = "application/jrd+json, application/json;q=0.9";

/// A fully received HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response with no headers.
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Performs the HTTP GET requests of a lookup.
///
/// Implementations follow redirects, apply their own timeouts and read the
/// whole body before returning.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url`, returning the final response after redirects.
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        (**self).get(url).await
    }
}

/// A [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a default HTTP client.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("webfinger/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies, TLS roots).
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static(JRD_ACCEPT))
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        trace!(status = %status, "HTTP response");

        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn response_without_headers() {
        let response = HttpResponse::new(StatusCode::OK, "{}");
        assert!(response.headers.is_empty());
        assert_eq!(response.body, b"{}");
    }

    #[tokio::test]
    async fn refused_connection_is_classified() {
        // Grab a free port, then close it so nothing is listening.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();

        let err = ReqwestTransport::new().get(&url).await.unwrap_err();
        assert!(matches!(err, TransportError::Refused { .. }), "unexpected error: {}", err);
        assert!(err.permits_insecure_retry());
    }

    #[tokio::test]
    async fn url_text_does_not_affect_classification() {
        // `.invalid` never resolves, so every attempt fails before TLS starts.
        for host in ["tls-nothing-here.invalid", "sslmate-nothing.invalid"] {
            let url = Url::parse(&format!(
                "https://{}/.well-known/webfinger?rel=ssl_certificate_error&resource=acct%3Ahandshake%40certificate.invalid",
                host
            ))
            .unwrap();

            let err = ReqwestTransport::new().get(&url).await.unwrap_err();
            assert!(
                !matches!(err, TransportError::Tls { .. }),
                "unexpected error: {}",
                err
            );
            assert!(!err.permits_insecure_retry(), "unexpected retry for {}", err);
            assert!(!err.to_string().contains(host));
        }
    }
}
