//! Mock WebFinger server tests.
//!
//! These tests use wiremock to simulate a WebFinger endpoint. wiremock only
//! speaks plain HTTP, so requests go through a transport that downgrades the
//! query URL before handing it to the real reqwest transport.

use async_trait::async_trait;
use serde_json::json;
use url::Url;
use webfinger::error::TransportError;
use webfinger::{Client, Error, HttpResponse, ReqwestTransport, Transport};
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Sends every request over plain HTTP.
struct PlainHttp(ReqwestTransport);

#[async_trait]
impl Transport for PlainHttp {
    async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
        let mut url = url.clone();
        url.set_scheme("http").unwrap();
        self.0.get(&url).await
    }
}

fn mock_client() -> Client<PlainHttp> {
    Client::with_transport(PlainHttp(ReqwestTransport::new()))
}

/// `host:port` of the mock server.
fn mock_host(server: &MockServer) -> String {
    format!("127.0.0.1:{}", server.address().port())
}

#[tokio::test]
async fn test_lookup_success() {
    let server = MockServer::start().await;
    let host = mock_host(&server);

    Mock::given(method("GET"))
        .and(path("/.well-known/webfinger"))
        .and(query_param("resource", format!("acct:bob@{}", host)))
        .and(header_exists("accept"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/jrd+json")
                .set_body_string(r#"{"subject":"bob@example.com"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let jrd = mock_client()
        .lookup(&format!("acct:bob@{}", host), &[])
        .await
        .unwrap();

    assert_eq!(jrd.subject.as_deref(), Some("bob@example.com"));
    assert!(jrd.aliases.is_empty());
    assert!(jrd.properties.is_empty());
    assert!(jrd.links.is_empty());
    assert_eq!(jrd.expires, None);
}

#[tokio::test]
async fn test_lookup_email_like_identifier() {
    let server = MockServer::start().await;
    let host = mock_host(&server);

    Mock::given(method("GET"))
        .and(path("/.well-known/webfinger"))
        .and(query_param("resource", format!("acct:alice@{}", host)))
        .and(query_param("rel", "http://webfinger.net/rel/profile-page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subject": format!("acct:alice@{}", host),
            "aliases": ["https://example.com/@alice"],
            "links": [
                {
                    "rel": "http://webfinger.net/rel/profile-page",
                    "type": "text/html",
                    "href": "https://example.com/@alice"
                },
                {
                    "rel": "self",
                    "type": "application/activity+json",
                    "href": "https://example.com/users/alice"
                }
            ]
        })))
        .mount(&server)
        .await;

    let jrd = mock_client()
        .lookup(
            &format!("alice@{}", host),
            &["http://webfinger.net/rel/profile-page"],
        )
        .await
        .unwrap();

    assert_eq!(jrd.aliases, ["https://example.com/@alice"]);
    let profile = jrd
        .link_by_rel("http://webfinger.net/rel/profile-page")
        .unwrap();
    assert_eq!(profile.media_type.as_deref(), Some("text/html"));
    assert_eq!(
        jrd.link_by_rel("self").unwrap().href.as_deref(),
        Some("https://example.com/users/alice")
    );
}

#[tokio::test]
async fn test_lookup_404() {
    let server = MockServer::start().await;

    let result = mock_client()
        .lookup(&format!("bob@{}", mock_host(&server)), &[])
        .await;

    match result {
        Err(Error::Status(err)) => assert_eq!(err.status, 404),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_lookup_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/webfinger"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = mock_client()
        .lookup(&format!("bob@{}", mock_host(&server)), &[])
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "500 Internal Server Error");
}

#[tokio::test]
async fn test_lookup_invalid_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/webfinger"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let result = mock_client()
        .lookup(&format!("bob@{}", mock_host(&server)), &[])
        .await;

    assert!(matches!(result, Err(Error::Decode(_))));
}

#[tokio::test]
async fn test_lookup_follows_redirects() {
    let server = MockServer::start().await;
    let host = mock_host(&server);

    Mock::given(method("GET"))
        .and(path("/.well-known/webfinger"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "/webfinger/bob.json"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/webfinger/bob.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subject": "acct:bob@example.com",
            "properties": {"http://example.com/ns/role": null}
        })))
        .mount(&server)
        .await;

    let jrd = mock_client()
        .lookup(&format!("bob@{}", host), &[])
        .await
        .unwrap();

    assert_eq!(jrd.subject.as_deref(), Some("acct:bob@example.com"));
    assert_eq!(jrd.property("http://example.com/ns/role"), "");
    assert_eq!(jrd.properties.get("http://example.com/ns/role"), Some(&None));
}

#[tokio::test]
async fn test_allow_http_falls_back_when_https_refused() {
    let server = MockServer::start().await;
    let host = mock_host(&server);

    // Refuses every HTTPS request, as a host without a TLS listener would.
    struct RefuseHttps(ReqwestTransport);

    #[async_trait]
    impl Transport for RefuseHttps {
        async fn get(&self, url: &Url) -> Result<HttpResponse, TransportError> {
            if url.scheme() == "https" {
                return Err(TransportError::Refused {
                    message: "tcp connect error: Connection refused (os error 111)".to_string(),
                });
            }
            self.0.get(url).await
        }
    }

    Mock::given(method("GET"))
        .and(path("/.well-known/webfinger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subject": format!("acct:bob@{}", host)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::with_transport(RefuseHttps(ReqwestTransport::new())).allow_http(true);
    let jrd = client.lookup(&format!("bob@{}", host), &[]).await.unwrap();

    assert_eq!(jrd.subject, Some(format!("acct:bob@{}", host)));
}
