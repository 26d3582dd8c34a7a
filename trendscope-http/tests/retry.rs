//! Retry and decoding behaviour against a mock server.

use std::borrow::Cow;
use std::time::Duration;
use trendscope_http::{ClientOptions, HttpClient, HttpError, RequestOpts, decode_json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::with_options(
        &server.uri(),
        ClientOptions {
            backoff: Duration::from_millis(5),
            ..Default::default()
        },
    )
    .unwrap()
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .mount(&server)
        .await;

    let body = client_for(&server)
        .get_text("/flaky", RequestOpts::default())
        .await
        .expect("succeeds after retries");
    let got: serde_json::Value = decode_json(body.as_bytes()).unwrap();
    assert_eq!(got["ok"], true);
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_text("/missing", RequestOpts::default())
        .await
        .unwrap_err();
    match err {
        HttpError::Api {
            status, message, ..
        } => {
            assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
            assert_eq!(message, "gone");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn retry_budget_is_respected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_text(
            "/down",
            RequestOpts {
                retries: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Api { .. }));
}

#[tokio::test]
async fn query_params_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/echo"))
        .and(query_param("hl", "en-US"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hi"))
        .mount(&server)
        .await;

    let body = client_for(&server)
        .get_text(
            "/echo",
            RequestOpts {
                query: Some(vec![("hl", Cow::Borrowed("en-US"))]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(body, "hi");
}

#[tokio::test]
async fn invalid_json_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let body = client_for(&server)
        .get_text("/html", RequestOpts::default())
        .await
        .unwrap();
    let err = decode_json::<serde_json::Value>(body.as_bytes()).unwrap_err();
    match err {
        HttpError::Decode(_, snippet) => assert_eq!(snippet, "<html></html>"),
        other => panic!("expected decode error, got {other:?}"),
    }
}
