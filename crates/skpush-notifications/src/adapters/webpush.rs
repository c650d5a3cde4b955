use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::{Client, StatusCode};
use skpush_config::WebpushServiceConfig;
use skpush_core::{Channel, PushMessage};
use tracing::debug;

use super::{DeliveryOutcome, PushAdapter, PushTarget};

/// Web-push adapter posting the message JSON to each subscription
/// endpoint.
///
/// Transport-level authorization (VAPID signing) is the push service
/// client's concern and sits behind this adapter seam; the engine only
/// sees per-recipient outcomes.
pub struct HttpPushAdapter {
    client: Client,
    ttl_seconds: u32,
}

impl HttpPushAdapter {
    #[must_use]
    pub fn from_config(config: &WebpushServiceConfig) -> Self {
        Self::new(Client::new(), config.ttl_seconds)
    }

    #[must_use]
    pub fn new(client: Client, ttl_seconds: u32) -> Self {
        Self {
            client,
            ttl_seconds,
        }
    }

    async fn send_one(&self, message: &PushMessage, target: &PushTarget) -> DeliveryOutcome {
        let result = self
            .client
            .post(&target.subscription.endpoint)
            .header("TTL", self.ttl_seconds)
            .json(message)
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::CREATED => {
                DeliveryOutcome::delivered(&target.id, Channel::Push)
            }
            Ok(response) => {
                debug!(
                    subscriber = %target.id,
                    endpoint_tag = %target.subscription.tag(),
                    status = %response.status(),
                    "push rejected"
                );
                DeliveryOutcome::failed(
                    &target.id,
                    Channel::Push,
                    format!("push service returned {}", response.status()),
                )
            }
            Err(e) => {
                debug!(
                    subscriber = %target.id,
                    endpoint_tag = %target.subscription.tag(),
                    error = %e,
                    "push failed"
                );
                DeliveryOutcome::failed(&target.id, Channel::Push, e.to_string())
            }
        }
    }
}

#[async_trait]
impl PushAdapter for HttpPushAdapter {
    /// One POST per target, run concurrently; a failing recipient never
    /// aborts delivery to the others.
    async fn send(&self, message: &PushMessage, targets: &[PushTarget]) -> Vec<DeliveryOutcome> {
        join_all(targets.iter().map(|t| self.send_one(message, t))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skpush_core::{Notification, NotificationState, PushSubscription, PushSubscriptionKeys};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target(id: &str, endpoint: String) -> PushTarget {
        PushTarget {
            id: id.to_string(),
            subscription: PushSubscription {
                endpoint,
                expiration_time: None,
                keys: PushSubscriptionKeys {
                    p256dh: "p".into(),
                    auth: "a".into(),
                },
            },
        }
    }

    fn message() -> PushMessage {
        PushMessage::from_notification(
            &Notification::new(NotificationState::Alarm, "hot"),
            Some("engines.overTemp"),
        )
    }

    #[tokio::test]
    async fn test_created_status_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send/ok"))
            .and(header("TTL", "10000"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let adapter = HttpPushAdapter::new(Client::new(), 10_000);
        let outcomes = adapter
            .send(&message(), &[target("ok", format!("{}/send/ok", server.uri()))])
            .await;

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].success);
        assert_eq!(outcomes[0].subscriber_id, "ok");
    }

    #[tokio::test]
    async fn test_non_created_status_is_failure_with_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send/gone"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;

        let adapter = HttpPushAdapter::new(Client::new(), 10_000);
        let outcomes = adapter
            .send(
                &message(),
                &[target("gone", format!("{}/send/gone", server.uri()))],
            )
            .await;

        assert!(!outcomes[0].success);
        assert!(outcomes[0].error.as_deref().unwrap().contains("410"));
    }

    #[tokio::test]
    async fn test_one_failure_never_aborts_the_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send/ok"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/send/bad"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let adapter = HttpPushAdapter::new(Client::new(), 10_000);
        let outcomes = adapter
            .send(
                &message(),
                &[
                    target("bad", format!("{}/send/bad", server.uri())),
                    target("ok", format!("{}/send/ok", server.uri())),
                ],
            )
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].success);
        assert!(outcomes[1].success);
    }
}
