use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xss_hunter::gather::{ArchiveFetcher, RetryPolicy};
use xss_hunter::http_client::create_client;

fn fast_retry() -> RetryPolicy {
    RetryPolicy { max_attempts: 3, base_delay: Duration::from_millis(1) }
}

fn fetcher(endpoints: Vec<String>) -> ArchiveFetcher {
    let client = create_client(Duration::from_secs(5), None).unwrap();
    ArchiveFetcher::new(client, endpoints, fast_retry())
}

#[tokio::test]
async fn merges_text_and_json_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cdx/txt"))
        .and(query_param("url", "example.com/*"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "http://example.com/a?x=1\nhttp://example.com/b\n",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cdx/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[["original"],["http://example.com/a?x=1"],["http://example.com/c?y=2"]]"#,
        ))
        .mount(&server)
        .await;

    let urls = fetcher(vec![
        format!("{}/cdx/txt?url={{domain}}/*", server.uri()),
        format!("{}/cdx/json?url={{domain}}/*&output=json", server.uri()),
    ])
    .fetch("example.com")
    .await;

    assert_eq!(
        urls,
        vec!["http://example.com/a?x=1", "http://example.com/b", "http://example.com/c?y=2"]
    );
}

#[tokio::test]
async fn failing_endpoint_is_retried_then_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/up"))
        .respond_with(ResponseTemplate::new(200).set_body_string("http://example.com/ok?q=1"))
        .expect(1)
        .mount(&server)
        .await;

    let urls = fetcher(vec![
        format!("{}/down?url={{domain}}", server.uri()),
        format!("{}/up?url={{domain}}", server.uri()),
    ])
    .fetch("example.com")
    .await;

    assert_eq!(urls, vec!["http://example.com/ok?q=1"]);
}

#[tokio::test]
async fn all_endpoints_failing_yields_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let urls = fetcher(vec![format!("{}/cdx?url={{domain}}", server.uri())])
        .fetch("example.com")
        .await;
    assert!(urls.is_empty());
}

#[tokio::test]
async fn garbage_json_contributes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[[\"original\"], [\"http://exa"))
        .expect(1)
        .mount(&server)
        .await;

    let urls = fetcher(vec![format!("{}/cdx?url={{domain}}", server.uri())])
        .fetch("example.com")
        .await;
    assert!(urls.is_empty());
}
