//! Contract tests against a mock backend.

use httpmock::prelude::*;
use reconsole_api_client::{ApiClient, ApiError};
use serde_json::json;

fn client(server: &MockServer) -> ApiClient {
    ApiClient::with_base_url("test-token".into(), server.base_url())
}

#[test]
fn list_batches_parses_and_caches() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/batches")
            .header("authorization", "Bearer test-token");
        then.status(200)
            .json_body(json!([{"id": 1, "status": "COMPLETED"}, {"id": 2, "status": "PROCESSING"}]));
    });

    let client = client(&server);
    let first = client.list_batches().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0]["id"], 1);

    // Second read is served from the cache
    let second = client.list_batches().unwrap();
    assert_eq!(second.len(), 2);
    mock.assert_calls(1);
}

#[test]
fn invalidation_forces_a_refetch() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/batches");
        then.status(200).json_body(json!([{"id": 1}]));
    });

    let client = client(&server);
    client.list_batches().unwrap();
    client.invalidate_batch(1);
    client.list_batches().unwrap();
    mock.assert_calls(2);
}

#[test]
fn list_records_sends_filters() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/batches/7/records")
            .query_param("status", "MISMATCH")
            .query_param("resolved", "false");
        then.status(200).json_body(json!({"records": [{"id": 10}]}));
    });

    let client = client(&server);
    let records = client.list_records(7, Some("MISMATCH"), Some(false)).unwrap();
    assert_eq!(records.len(), 1);
    mock.assert();
}

#[test]
fn record_filters_are_distinct_cache_entries() {
    let server = MockServer::start();
    let all = server.mock(|when, then| {
        when.method(GET).path("/api/batches/7/records");
        then.status(200).json_body(json!([{"id": 1}, {"id": 2}]));
    });

    let client = client(&server);
    client.list_records(7, None, None).unwrap();
    client.list_records(7, Some("MISSING"), None).unwrap();
    client.list_records(7, None, None).unwrap(); // cached
    all.assert_calls(2);
}

#[test]
fn resolve_record_posts_comment_and_invalidates() {
    let server = MockServer::start();
    let records_mock = server.mock(|when, then| {
        when.method(GET).path("/api/batches/7/records");
        then.status(200).json_body(json!([]));
    });
    let resolve_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/records/42/resolve")
            .json_body(json!({"comment": "checked with ops", "resolve": true}));
        then.status(200).body("");
    });

    let client = client(&server);
    client.list_records(7, None, None).unwrap();
    client.resolve_record(42, "checked with ops", true).unwrap();
    // Record lists were invalidated by the mutation
    client.list_records(7, None, None).unwrap();

    resolve_mock.assert();
    records_mock.assert_calls(2);
}

#[test]
fn retry_batch_posts_and_invalidates_batch() {
    let server = MockServer::start();
    let batch_mock = server.mock(|when, then| {
        when.method(GET).path("/api/batches/9");
        then.status(200).json_body(json!({"id": 9, "status": "FAILED"}));
    });
    let retry_mock = server.mock(|when, then| {
        when.method(POST).path("/api/batches/9/retry");
        then.status(202).body("");
    });

    let client = client(&server);
    client.get_batch(9).unwrap();
    client.retry_batch(9).unwrap();
    client.get_batch(9).unwrap();

    retry_mock.assert();
    batch_mock.assert_calls(2);
}

#[test]
fn rate_limit_retries_then_fails() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/batches");
        then.status(429)
            .header("retry-after", "0")
            .json_body(json!({"error": "slow down"}));
    });

    let client = client(&server);
    let err = client.list_batches().unwrap_err();
    match err {
        ApiError::Http(429, _) => {}
        other => panic!("expected Http(429), got {other:?}"),
    }
    // 1 initial + 3 retries
    mock.assert_calls(4);
}

#[test]
fn validation_errors_are_not_retried() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api/records/1/resolve");
        then.status(422).body("comment is required");
    });

    let client = client(&server);
    let err = client.resolve_record(1, "", true).unwrap_err();
    match err {
        ApiError::Validation(msg) => assert!(msg.contains("comment is required")),
        other => panic!("expected Validation, got {other:?}"),
    }
    mock.assert_calls(1);
}

#[test]
fn login_exchanges_password_for_token() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/auth/login")
            .json_body(json!({"email": "ops@example.com", "password": "hunter2"}));
        then.status(200).json_body(json!({"token": "fresh-token"}));
    });

    let creds = ApiClient::login(&server.base_url(), "ops@example.com", "hunter2").unwrap();
    assert_eq!(creds.token, "fresh-token");
    assert_eq!(creds.email.as_deref(), Some("ops@example.com"));
}

#[test]
fn upload_batch_returns_new_id() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/batches");
        then.status(201).json_body(json!({"batchId": 31}));
    });

    let dir = tempfile::tempdir().unwrap();
    let bo = dir.path().join("ledger.csv");
    let vn = dir.path().join("vendor.csv");
    std::fs::write(&bo, "id,amount\n1,10.00\n").unwrap();
    std::fs::write(&vn, "ref,value\nA,10.00\n").unwrap();

    let client = client(&server);
    let batch_id = client.upload_batch(&bo, &vn, 3, 4).unwrap();
    assert_eq!(batch_id, 31);
}

#[test]
fn upload_missing_file_is_io_error() {
    let server = MockServer::start();
    let client = client(&server);
    let err = client
        .upload_batch(
            std::path::Path::new("/definitely/not/here.csv"),
            std::path::Path::new("/also/missing.csv"),
            1,
            2,
        )
        .unwrap_err();
    matches!(err, ApiError::Io(_));
}

#[test]
fn verify_token_returns_user_info() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/auth/me");
        then.status(200)
            .json_body(json!({"email": "ops@example.com", "roles": ["admin"]}));
    });

    let user = client(&server).verify_token().unwrap();
    assert_eq!(user.email, "ops@example.com");
    assert_eq!(user.roles, vec!["admin"]);
}
