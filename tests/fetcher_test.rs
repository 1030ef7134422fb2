//! Fetcher behavior against a local mock HTTP server

mod common;

use std::io::Write;

use singlepage::constants::CHROME_USER_AGENT;
use singlepage::{
    Embedding, FetchOutcome, Fetcher, InlineConfig, ResourceCategory, transform,
};

use common::init_logging;

#[tokio::test]
async fn test_browser_identifying_headers_and_referrer_are_sent() {
    init_logging();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/main.css")
        .match_header("user-agent", CHROME_USER_AGENT)
        .match_header("accept", "text/css,*/*;q=0.1")
        .match_header("accept-language", "en-US,en;q=0.9")
        .match_header("referer", "https://example.com/page")
        .with_header("content-type", "text/css")
        .with_body("body { margin: 0 }")
        .create_async()
        .await;

    let fetcher = Fetcher::new(InlineConfig::default());
    let outcome = fetcher
        .fetch(
            &format!("{}/main.css", server.url()),
            ResourceCategory::Stylesheet,
            "https://example.com/page",
        )
        .await;

    match outcome {
        FetchOutcome::Success(body) => {
            assert_eq!(body.bytes, b"body { margin: 0 }");
            assert_eq!(body.content_type.as_deref(), Some("text/css"));
        }
        FetchOutcome::Failure(failure) => panic!("unexpected failure: {}", failure.reason),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_success_status_is_normalized_to_a_failure_value() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/gone.js")
        .with_status(503)
        .create_async()
        .await;

    let fetcher = Fetcher::new(InlineConfig::default());
    let url = format!("{}/gone.js", server.url());
    let outcome = fetcher
        .fetch(&url, ResourceCategory::Script, "https://example.com/")
        .await;

    match outcome {
        FetchOutcome::Failure(failure) => {
            assert_eq!(failure.url, url);
            assert!(failure.reason.contains("status"));
        }
        FetchOutcome::Success(_) => panic!("503 must not be a success"),
    }
}

#[tokio::test]
async fn test_gzip_encoded_stylesheet_survives_transport() {
    let mut server = mockito::Server::new_async().await;
    let css = ".a { color: blue }";
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(css.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    let _mock = server
        .mock("GET", "/site.css")
        .with_header("content-type", "text/css")
        .with_header("content-encoding", "gzip")
        .with_body(compressed)
        .create_async()
        .await;

    let fetcher = Fetcher::new(InlineConfig::default());
    let url = format!("{}/site.css", server.url());
    let outcome = fetcher
        .fetch(&url, ResourceCategory::Stylesheet, "https://example.com/")
        .await;

    let FetchOutcome::Success(body) = outcome else {
        panic!("fetch must succeed");
    };
    assert_eq!(body.content_encoding.as_deref(), Some("gzip"));

    let embedding = transform(ResourceCategory::Stylesheet, &url, body, None).unwrap();
    match embedding {
        Embedding::StyleSheet(text) => assert_eq!(text, css),
        other => panic!("expected stylesheet embedding, got {other:?}"),
    }
}

#[tokio::test]
async fn test_data_url_is_never_sent_over_the_network() {
    let mut server = mockito::Server::new_async().await;
    let guard = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let fetcher = Fetcher::new(InlineConfig::default());
    let outcome = fetcher
        .fetch(
            "data:text/css,body%7Bmargin%3A0%7D",
            ResourceCategory::Stylesheet,
            &server.url(),
        )
        .await;

    let FetchOutcome::Success(body) = outcome else {
        panic!("data URL decode must succeed");
    };
    assert_eq!(body.bytes, b"body{margin:0}");
    guard.assert_async().await;
}

#[tokio::test]
async fn test_streamed_body_is_capped_mid_download() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/big.css")
        .with_header("content-type", "text/css")
        .with_body("x".repeat(1024))
        .create_async()
        .await;

    let config = InlineConfig {
        max_stylesheet_size: 100,
        ..InlineConfig::default()
    };
    let fetcher = Fetcher::new(config);
    let outcome = fetcher
        .fetch(
            &format!("{}/big.css", server.url()),
            ResourceCategory::Stylesheet,
            "https://example.com/",
        )
        .await;

    let FetchOutcome::Failure(failure) = outcome else {
        panic!("oversize body must fail");
    };
    assert!(failure.reason.contains("large") || failure.reason.contains("limit"));
}
