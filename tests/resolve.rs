//! Integration tests for feed metadata resolution over HTTP.
//!
//! Each test starts its own wiremock server, so tests are isolated and
//! can assert on exactly how many requests the resolver issued.

use curio_feed::feed::{FeedMeta, FeedMetadataResolver, ResolveError};
use pretty_assertions::assert_eq;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_rss_xml(title: &str, description: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>{title}</title>
    <link>https://example.com</link>
    <description>{description}</description>
    <item>
      <title>Hello world</title>
      <link>https://example.com/hello</link>
    </item>
  </channel>
</rss>"#
    )
}

fn create_atom_xml(title: &str, subtitle: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>{title}</title>
  <subtitle>{subtitle}</subtitle>
  <link href="https://example.com/"/>
  <updated>2024-01-01T00:00:00Z</updated>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <entry>
    <title>Atom entry</title>
  </entry>
</feed>"#
    )
}

fn resolver() -> FeedMetadataResolver {
    FeedMetadataResolver::new(reqwest::Client::new())
}

async fn serve(status: u16, body: &str) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&mock_server)
        .await;
    mock_server
}

fn feed_url(server: &MockServer) -> String {
    format!("{}/feed", server.uri())
}

// ============================================================================
// Successful resolution
// ============================================================================

#[tokio::test]
async fn test_rss_feed() {
    let server = serve(200, &create_rss_xml("My Blog", "A blog about things")).await;

    let meta = resolver().resolve(&feed_url(&server)).await.unwrap();
    assert_eq!(
        meta,
        FeedMeta {
            title: "My Blog".to_string(),
            description: Some("A blog about things".to_string()),
        }
    );
}

#[tokio::test]
async fn test_atom_feed() {
    let server = serve(200, &create_atom_xml("My Atom Blog", "An Atom feed")).await;

    let meta = resolver().resolve(&feed_url(&server)).await.unwrap();
    assert_eq!(
        meta,
        FeedMeta {
            title: "My Atom Blog".to_string(),
            description: Some("An Atom feed".to_string()),
        }
    );
}

#[tokio::test]
async fn test_rss_without_description() {
    let body = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>  No Description Feed  </title>
  <link>https://example.com</link>
</channel></rss>"#;
    let server = serve(200, body).await;

    let meta = resolver().resolve(&feed_url(&server)).await.unwrap();
    assert_eq!(meta.title, "No Description Feed");
    assert_eq!(meta.description, None);
}

#[tokio::test]
async fn test_atom_without_subtitle() {
    let body = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Bare Atom</title></feed>"#;
    let server = serve(200, body).await;

    let meta = resolver().resolve(&feed_url(&server)).await.unwrap();
    assert_eq!(meta.title, "Bare Atom");
    assert_eq!(meta.description, None);
}

#[tokio::test]
async fn test_repeated_calls_are_identical() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(create_rss_xml("Stable", "Same twice")),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let resolver = resolver();
    let first = resolver.resolve(&mock_server.uri()).await.unwrap();
    let second = resolver.resolve(&mock_server.uri()).await.unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_ftp_scheme_rejected_without_request() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let url = format!("ftp://{}/feed", mock_server.address());
    let result = resolver().resolve(&url).await;
    let err = result.unwrap_err();
    assert!(matches!(err, ResolveError::InvalidScheme { .. }));
    assert_eq!(err.to_string(), "URL must use http or https protocol");
}

#[tokio::test]
async fn test_invalid_url_rejected() {
    let result = resolver().resolve("not a url").await;
    assert!(matches!(result, Err(ResolveError::InvalidUrl(_))));

    let result = resolver().resolve("/relative/feed.xml").await;
    assert!(matches!(result, Err(ResolveError::InvalidUrl(_))));
}

#[tokio::test]
async fn test_404_is_http_error() {
    let server = serve(404, "Not Found").await;

    let err = resolver().resolve(&feed_url(&server)).await.unwrap_err();
    match &err {
        ResolveError::Http { status: 404 } => {}
        e => panic!("Expected Http {{ status: 404 }}, got {:?}", e),
    }
    assert_eq!(err.to_string(), "Failed to fetch RSS feed: HTTP 404");
}

#[tokio::test]
async fn test_html_page_is_unrecognized() {
    let body = r#"<!DOCTYPE html>
<html lang="en">
  <body><h1>Welcome</h1><p>Nothing to syndicate here.</p></body>
</html>"#;
    let server = serve(200, body).await;

    let err = resolver().resolve(&feed_url(&server)).await.unwrap_err();
    assert!(matches!(err, ResolveError::UnrecognizedFeedFormat));
    assert_eq!(
        err.to_string(),
        "The URL does not point to a valid RSS or Atom feed"
    );
}

#[tokio::test]
async fn test_empty_body_is_unrecognized() {
    let server = serve(200, "").await;

    let result = resolver().resolve(&feed_url(&server)).await;
    assert!(matches!(result, Err(ResolveError::UnrecognizedFeedFormat)));
}

#[tokio::test]
async fn test_non_utf8_body_is_decoded_lossily() {
    let mut body = b"<rss><channel><title>Caf".to_vec();
    body.push(0xE9); // Latin-1 e-acute, invalid as UTF-8
    body.extend_from_slice(b"</title></channel></rss>");

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&mock_server)
        .await;

    let meta = resolver().resolve(&mock_server.uri()).await.unwrap();
    assert_eq!(meta.title, "Caf\u{FFFD}");
}
