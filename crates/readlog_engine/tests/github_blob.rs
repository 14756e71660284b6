mod support;

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use pretty_assertions::assert_eq;
use readlog_engine::{BlobClient, BlobError, GitHubBlobClient, GitHubSettings, VersionToken};
use serde_json::json;
use support::{init_logging, locator};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTENTS_PATH: &str = "/repos/reader/blog/contents/data/reading.json";

fn client(server: &MockServer) -> GitHubBlobClient {
    GitHubBlobClient::new(GitHubSettings {
        api_base: server.uri(),
        token: "secret-token".to_string(),
        request_timeout: Duration::from_secs(5),
        ..GitHubSettings::default()
    })
    .unwrap()
}

#[tokio::test]
async fn missing_file_reads_as_absent() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;

    let snapshot = client(&server).get_blob(&locator()).await.unwrap();

    assert!(snapshot.is_absent());
    assert_eq!(snapshot.version, None);
}

#[tokio::test]
async fn wrapped_base64_content_is_decoded() {
    init_logging();
    let server = MockServer::start().await;
    let document = r#"{"entries": [{"url": "https://a.example/1", "title": "One"}]}"#;
    let encoded = STANDARD.encode(document);
    let (head, tail) = encoded.split_at(20);
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .and(header("authorization", "Bearer secret-token"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "abc123",
            "encoding": "base64",
            "content": format!("{head}\n{tail}\n"),
        })))
        .mount(&server)
        .await;

    let snapshot = client(&server).get_blob(&locator()).await.unwrap();

    assert_eq!(snapshot.content.as_deref(), Some(document.as_bytes()));
    assert_eq!(snapshot.version, Some(VersionToken::new("abc123")));
}

#[tokio::test]
async fn read_failure_carries_upstream_status() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})),
        )
        .mount(&server)
        .await;

    let err = client(&server).get_blob(&locator()).await.unwrap_err();

    match err {
        BlobError::Read { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Bad credentials");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn update_sends_version_and_branch() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(json!({
            "message": "Add reading entry: One (2024-06-01)",
            "content": STANDARD.encode("[]"),
            "branch": "main",
            "sha": "abc123",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": {"sha": "def456", "path": "data/reading.json"},
            "commit": {"sha": "0000"},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let version = client(&server)
        .put_blob(
            &locator(),
            b"[]",
            "Add reading entry: One (2024-06-01)",
            Some(&VersionToken::new("abc123")),
        )
        .await
        .unwrap();

    assert_eq!(version, VersionToken::new("def456"));
}

#[tokio::test]
async fn create_omits_version() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": {"sha": "first"},
        })))
        .mount(&server)
        .await;

    let version = client(&server)
        .put_blob(&locator(), b"{}", "create", None)
        .await
        .unwrap();
    assert_eq!(version.as_str(), "first");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("sha").is_none());
}

#[tokio::test]
async fn stale_version_is_a_conflict() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"message": "data/reading.json does not match abc123"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .put_blob(&locator(), b"[]", "m", Some(&VersionToken::new("abc123")))
        .await
        .unwrap_err();

    assert!(matches!(err, BlobError::Conflict { .. }));
    assert_eq!(err.status(), Some(409));
}

#[tokio::test]
async fn racing_create_is_a_conflict() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({"message": "Invalid request.\n\n\"sha\" wasn't supplied."})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .put_blob(&locator(), b"[]", "m", None)
        .await
        .unwrap_err();

    assert!(matches!(err, BlobError::Conflict { .. }));
}

#[tokio::test]
async fn unrelated_create_rejection_keeps_its_status() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"message": "Branch nope not found"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .put_blob(&locator(), b"[]", "m", None)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        BlobError::Write {
            status: 422,
            message: "Branch nope not found".to_string(),
        }
    );
}

#[tokio::test]
async fn other_write_failures_are_not_conflicts() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = client(&server)
        .put_blob(&locator(), b"[]", "m", Some(&VersionToken::new("abc123")))
        .await
        .unwrap_err();

    match err {
        BlobError::Write { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "500 Internal Server Error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
