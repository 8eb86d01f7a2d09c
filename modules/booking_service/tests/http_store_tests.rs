//! HTTP record store tests against a mock backend

use booking_service::config::{BackendConfig, Config};
use booking_service::contract::{RecordId, SubmissionOutcome, SubmissionStep};
use booking_service::domain::backend::{entity, BackendError, Query, RecordStore};
use booking_service::domain::{Filter, Service};
use booking_service::infra::crm::HttpRecordStore;
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

mod common;

fn backend(server: &MockServer) -> BackendConfig {
    BackendConfig {
        base_url: server.url("/civicrm/ajax"),
        api_version: "api4".to_string(),
        api_key: "user-key".to_string(),
        site_key: "site-key".to_string(),
    }
}

fn store(server: &MockServer) -> HttpRecordStore {
    HttpRecordStore::new(&backend(server), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_query_posts_filter_with_credentials() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/civicrm/ajax/api4/Event/get")
                .header("x-api-key", "user-key")
                .header("x-site-key", "site-key")
                .json_body(json!({
                    "select": ["id", "remaining_participants"],
                    "where": [["id", "IN", [7, 8]]]
                }));
            then.status(200).json_body(json!({
                "values": [
                    {"id": 7, "remaining_participants": 80},
                    {"id": 8, "remaining_participants": null}
                ]
            }));
        })
        .await;

    let query = Query::new(entity::RESOURCE)
        .select(&["id", "remaining_participants"])
        .filter(Filter::is_in("id", vec![json!(7), json!(8)]));
    let records = store(&server).query(&query).await.unwrap();

    mock.assert_async().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["remaining_participants"], json!(80));
}

#[tokio::test]
async fn test_create_returns_new_id() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/civicrm/ajax/api4/Contact/create")
                .json_body(json!({"values": {"first_name": "Anna"}}));
            then.status(200)
                .json_body(json!({"values": [{"id": 812, "first_name": "Anna"}]}));
        })
        .await;

    let mut fields = serde_json::Map::new();
    fields.insert("first_name".to_string(), json!("Anna"));
    let id = store(&server).create(entity::PERSON, fields).await.unwrap();

    mock.assert_async().await;
    assert_eq!(id, RecordId(812));
}

#[tokio::test]
async fn test_duplicate_signals() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/civicrm/ajax/api4/Organization/create");
            then.status(409).body("conflict");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/civicrm/ajax/api4/Contact/create");
            then.status(200).json_body(json!({
                "error_code": "already_exists",
                "error_message": "Contact with this email exists"
            }));
        })
        .await;

    let store = store(&server);
    let by_status = store
        .create(entity::ORGANISATION, serde_json::Map::new())
        .await;
    assert!(matches!(by_status, Err(BackendError::Duplicate { .. })));

    let by_code = store.create(entity::PERSON, serde_json::Map::new()).await;
    assert_eq!(
        by_code,
        Err(BackendError::Duplicate {
            message: "Contact with this email exists".to_string()
        })
    );
}

#[tokio::test]
async fn test_non_json_response_is_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/civicrm/ajax/api4/Event/get");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let result = store(&server).query(&Query::new(entity::RESOURCE)).await;
    assert!(matches!(result, Err(BackendError::Decode(_))));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/civicrm/ajax/api4/Event/get");
            then.status(200)
                .delay(Duration::from_millis(500))
                .json_body(json!({"values": []}));
        })
        .await;

    let store = HttpRecordStore::new(&backend(&server), Duration::from_millis(50)).unwrap();
    let result = store.query(&Query::new(entity::RESOURCE)).await;
    assert_eq!(result, Err(BackendError::Timeout));
}

#[tokio::test]
async fn test_submission_over_http_duplicate_school() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/civicrm/ajax/api4/Event/get");
            then.status(200)
                .json_body(json!({"values": [{"id": common::RESOURCE_ID, "remaining_participants": 50}]}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/civicrm/ajax/api4/Organization/create");
            then.status(500)
                .json_body(json!({"error_message": "DB Error: already exists"}));
        })
        .await;
    let person = server
        .mock_async(|when, then| {
            when.method(POST).path("/civicrm/ajax/api4/Contact/create");
            then.status(200).json_body(json!({"values": [{"id": 1}]}));
        })
        .await;

    let config = Config {
        backend: backend(&server),
        ..common::config()
    };
    let store = Arc::new(HttpRecordStore::new(&config.backend, config.request_timeout).unwrap());
    let service = Service::new(store, &config);

    let outcome = service.submit(&common::new_school_form()).await.unwrap();
    assert!(matches!(
        outcome,
        SubmissionOutcome::Failed {
            step: Some(SubmissionStep::CreateOrganisation),
            ..
        }
    ));
    person.assert_hits_async(0).await;
}
