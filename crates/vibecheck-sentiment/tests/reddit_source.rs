//! Integration tests for `RedditThreadSource` using wiremock HTTP mocks.

use vibecheck_sentiment::{Platform, RedditThreadSource, SentimentError, TextSource};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_source(base_url: &str) -> RedditThreadSource {
    RedditThreadSource::with_base_url(5, "vibecheck-test/0.1", base_url)
        .expect("source construction should not fail")
}

#[tokio::test]
async fn thread_comments_are_returned() {
    let server = MockServer::start().await;

    let body = serde_json::json!([
        { "kind": "Listing", "data": { "children": [
            { "kind": "t3", "data": { "title": "Release day", "selftext": "" } }
        ]}},
        { "kind": "Listing", "data": { "children": [
            { "kind": "t1", "data": { "body": "This is fantastic work", "replies": "" } },
            { "kind": "t1", "data": { "body": "[removed]", "replies": "" } },
            { "kind": "t1", "data": { "body": "Not convinced at all", "replies": "" } }
        ]}}
    ]);

    Mock::given(method("GET"))
        .and(path("/r/rust/comments/abc123/release_day.json"))
        .and(query_param("limit", "100"))
        .and(query_param("raw_json", "1"))
        .and(header("user-agent", "vibecheck-test/0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let texts = test_source(&server.uri())
        .fetch_texts(
            "https://www.reddit.com/r/rust/comments/abc123/release_day/",
            Platform::Reddit,
        )
        .await
        .expect("should parse thread");
    assert_eq!(texts, vec!["This is fantastic work", "Not convinced at all"]);
}

#[tokio::test]
async fn subreddit_listing_keeps_time_filter() {
    let server = MockServer::start().await;

    let body = serde_json::json!({ "kind": "Listing", "data": { "children": [
        { "kind": "t3", "data": { "title": "Markets rally on earnings", "selftext": "" } }
    ]}});

    Mock::given(method("GET"))
        .and(path("/r/all/top.json"))
        .and(query_param("t", "day"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let texts = test_source(&server.uri())
        .fetch_texts("https://www.reddit.com/r/all/top/?t=day", Platform::Reddit)
        .await
        .expect("should parse listing");
    assert_eq!(texts, vec!["Markets rally on earnings"]);
}

#[tokio::test]
async fn error_status_is_extraction_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = test_source(&server.uri())
        .fetch_texts("https://www.reddit.com/r/private/hot/", Platform::Reddit)
        .await
        .unwrap_err();
    assert!(matches!(err, SentimentError::Extraction { .. }), "got {err:?}");
}

#[tokio::test]
async fn x_urls_are_rejected_without_a_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = test_source(&server.uri())
        .fetch_texts("https://x.com/someone/status/1", Platform::X)
        .await
        .unwrap_err();
    assert!(matches!(err, SentimentError::Extraction { .. }));
}
