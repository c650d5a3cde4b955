//! ResourcesStore against a mocked host resource API.

use reqwest::Client;
use skpush_core::SubscriberRecord;
use skpush_storage::{ResourcesStore, StoreError, SubscriberStore};
use url::Url;
use wiremock::matchers::{bearer_token, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> ResourcesStore {
    ResourcesStore::new(
        Client::new(),
        Url::parse(&server.uri()).unwrap(),
        "push-notifier",
        "resources-provider",
        "test-token",
    )
}

#[tokio::test]
async fn list_returns_keyed_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/signalk/v2/api/resources/push-notifier"))
        .and(query_param("provider", "resources-provider"))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "a@b.com": {},
            "abcdefgh": {
                "subscription": {
                    "endpoint": "https://push.example/send/abcdefgh",
                    "keys": { "p256dh": "p", "auth": "s" }
                },
                "sendFailureCount": 2
            }
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let all = store.list().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all["abcdefgh"].send_failure_count, 2);
    assert!(all["a@b.com"].subscription.is_none());
}

#[tokio::test]
async fn list_of_missing_collection_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/signalk/v2/api/resources/push-notifier"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = store_for(&server);
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn set_puts_record_under_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/signalk/v2/api/resources/push-notifier/a@b.com"))
        .and(bearer_token("test-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    store
        .set("a@b.com", &SubscriberRecord::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_maps_404_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/signalk/v2/api/resources/push-notifier/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store.delete("ghost").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn server_error_is_reported_as_connection_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/signalk/v2/api/resources/push-notifier"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let err = store.list().await.unwrap_err();
    assert!(matches!(err, StoreError::Connection { .. }));
}
