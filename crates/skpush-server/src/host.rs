//! Signal K host integration: login, remote watch-list expansion and the
//! polling notification watchers feeding the dispatch engine.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use skpush_core::Notification;
use skpush_notifications::{ExpandError, PathExpander};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// How often each watched notification path is polled.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum HostError {
    #[error("host base URL is invalid: {0}")]
    BadUrl(String),

    #[error("host authentication service denied login attempt by user '{username}'")]
    LoginDenied { username: String },

    #[error("cannot contact host authentication service: {0}")]
    Unreachable(String),

    #[error("authentication server response could not be parsed: {0}")]
    BadLoginResponse(String),

    #[error("host response could not be parsed: {0}")]
    BadResponse(String),

    #[error("cannot build http client: {0}")]
    ClientBuild(String),
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// An authenticated session against the Signal K host.
///
/// Hosts commonly run with self-signed certificates, so the client
/// accepts invalid certs.
pub struct HostSession {
    client: Client,
    base_url: Url,
    token: String,
}

impl std::fmt::Debug for HostSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostSession")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

impl HostSession {
    /// A client suitable for talking to a self-signed host.
    pub fn client() -> Result<Client, HostError> {
        Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| HostError::ClientBuild(e.to_string()))
    }

    /// Log into the host, obtaining the bearer token used by every
    /// subsequent call.
    pub async fn login(
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, HostError> {
        let base_url = Url::parse(base_url).map_err(|e| HostError::BadUrl(e.to_string()))?;
        let login_url = base_url
            .join("signalk/v1/auth/login")
            .map_err(|e| HostError::BadUrl(e.to_string()))?;

        let client = Self::client()?;
        let response = client
            .post(login_url)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|e| HostError::Unreachable(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(HostError::LoginDenied {
                username: username.to_string(),
            });
        }
        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| HostError::BadLoginResponse(e.to_string()))?;

        info!(user = %username, "authenticated with host");
        Ok(Self {
            client,
            base_url,
            token: body.token,
        })
    }

    pub fn client_handle(&self) -> Client {
        self.client.clone()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// REST URL of a notification path (`a.b.c` ->
    /// `.../vessels/self/notifications/a/b/c`).
    fn notification_url(&self, path: &str) -> Result<Url, HostError> {
        self.base_url
            .join(&format!(
                "signalk/v1/api/vessels/self/notifications/{}",
                path.replace('.', "/")
            ))
            .map_err(|e| HostError::BadUrl(e.to_string()))
    }

    /// Read the current notification on a path. `Ok(None)` when the path
    /// carries no notification.
    async fn read_notification(&self, path: &str) -> Result<Option<Notification>, HostError> {
        let url = self.notification_url(path)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| HostError::Unreachable(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let notification = response
                    .json::<Notification>()
                    .await
                    .map_err(|e| HostError::BadResponse(e.to_string()))?;
                Ok(Some(notification))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(HostError::Unreachable(format!(
                "notification read returned {status}"
            ))),
        }
    }
}

#[async_trait]
impl PathExpander for HostSession {
    async fn expand(&self, url: &str) -> Result<Vec<String>, ExpandError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ExpandError::Http(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<Vec<String>>()
                .await
                .map_err(|e| ExpandError::Malformed(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ExpandError::Unauthorized),
            status => Err(ExpandError::Http(format!("fetch returned {status}"))),
        }
    }
}

/// Expander used before (or without) a host session; remote entries fail
/// softly and literal paths still resolve.
pub struct OfflineExpander;

#[async_trait]
impl PathExpander for OfflineExpander {
    async fn expand(&self, _url: &str) -> Result<Vec<String>, ExpandError> {
        Err(ExpandError::Http("no host session".into()))
    }
}

fn state_fingerprint(notification: &Notification) -> String {
    format!(
        "{}|{}",
        notification.state,
        notification
            .timestamp
            .map(|t| t.unix_timestamp_nanos())
            .unwrap_or_default()
    )
}

/// Spawn one polling task per watched path, emitting each state change
/// into the engine's event channel.
pub fn spawn_notification_watchers(
    session: std::sync::Arc<HostSession>,
    paths: &BTreeSet<String>,
    poll_interval: Duration,
    events: mpsc::Sender<(String, Notification)>,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    paths
        .iter()
        .map(|path| {
            let session = session.clone();
            let path = path.clone();
            let events = events.clone();
            let mut shutdown = shutdown.clone();
            tokio::spawn(async move {
                let mut last: Option<String> = None;
                let mut ticker = tokio::time::interval(poll_interval);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        _ = shutdown.changed() => {
                            debug!(path = %path, "notification watcher stopped");
                            return;
                        }
                    }
                    match session.read_notification(&path).await {
                        Ok(Some(notification)) => {
                            let fingerprint = state_fingerprint(&notification);
                            if last.as_deref() != Some(fingerprint.as_str()) {
                                last = Some(fingerprint);
                                if events.send((path.clone(), notification)).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Ok(None) => {
                            last = None;
                        }
                        Err(e) => {
                            debug!(path = %path, error = %e, "notification poll failed");
                        }
                    }
                }
            })
        })
        .collect()
}

/// Spawn one polling task per restart directive path; any state change
/// signals a full engine restart.
pub fn spawn_restart_watchers(
    session: std::sync::Arc<HostSession>,
    paths: &BTreeSet<String>,
    poll_interval: Duration,
    restart: mpsc::Sender<String>,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    paths
        .iter()
        .map(|path| {
            let session = session.clone();
            let path = path.clone();
            let restart = restart.clone();
            let mut shutdown = shutdown.clone();
            info!(path = %path, "registering restart listener");
            tokio::spawn(async move {
                // The first observation only seeds the baseline; a restart
                // fires on change, not on startup.
                let mut last: Option<String> = None;
                let mut seeded = false;
                let mut ticker = tokio::time::interval(poll_interval);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        _ = shutdown.changed() => return,
                    }
                    match session.read_notification(&path).await {
                        Ok(current) => {
                            let fingerprint = current.as_ref().map(state_fingerprint);
                            if seeded && fingerprint != last {
                                warn!(path = %path, "restarting because of restart rule");
                                let _ = restart.send(path.clone()).await;
                                return;
                            }
                            last = fingerprint;
                            seeded = true;
                        }
                        Err(e) => {
                            debug!(path = %path, error = %e, "restart poll failed");
                        }
                    }
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use skpush_core::NotificationState;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_login_obtains_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signalk/v1/auth/login"))
            .and(body_json(serde_json::json!({
                "username": "push-notifier",
                "password": "secret"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "tok-1"})),
            )
            .mount(&server)
            .await;

        let session = HostSession::login(&server.uri(), "push-notifier", "secret")
            .await
            .unwrap();
        assert_eq!(session.token(), "tok-1");

        // The session shows up in logs and error reports; the token must not.
        let rendered = format!("{session:?}");
        assert!(rendered.contains("HostSession"));
        assert!(!rendered.contains("tok-1"));
    }

    #[tokio::test]
    async fn test_client_construction_reports_builder_errors() {
        // The self-signed-friendly client either builds or surfaces the
        // builder failure; it never falls back to a stock client.
        let client = HostSession::client();
        assert!(matches!(client, Ok(_) | Err(HostError::ClientBuild(_))));
    }

    #[tokio::test]
    async fn test_login_rejection_is_denied() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signalk/v1/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = HostSession::login(&server.uri(), "push-notifier", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::LoginDenied { .. }));
    }

    #[tokio::test]
    async fn test_expand_forwards_bearer_and_parses_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signalk/v1/auth/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "tok-2"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/watchlist"))
            .and(header("authorization", "Bearer tok-2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!(["a.b", "c.d"])),
            )
            .mount(&server)
            .await;

        let session = HostSession::login(&server.uri(), "u", "p").await.unwrap();
        let paths = session
            .expand(&format!("{}/watchlist", server.uri()))
            .await
            .unwrap();
        assert_eq!(paths, vec!["a.b".to_string(), "c.d".to_string()]);
    }

    #[tokio::test]
    async fn test_expand_forbidden_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signalk/v1/auth/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "t"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/watchlist"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let session = HostSession::login(&server.uri(), "u", "p").await.unwrap();
        let err = session
            .expand(&format!("{}/watchlist", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err, ExpandError::Unauthorized);
    }

    #[tokio::test]
    async fn test_notification_read_maps_absence_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signalk/v1/auth/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "t"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/signalk/v1/api/vessels/self/notifications/engines/overTemp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "state": "alarm",
                "method": ["visual"],
                "message": "hot"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/signalk/v1/api/vessels/self/notifications/tanks/fuel"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let session = HostSession::login(&server.uri(), "u", "p").await.unwrap();
        let present = session
            .read_notification("engines.overTemp")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(present.state, NotificationState::Alarm);
        assert!(session.read_notification("tanks.fuel").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_notification_read_rejects_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signalk/v1/auth/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "t"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/signalk/v1/api/vessels/self/notifications/engines/overTemp"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"state": 42})),
            )
            .mount(&server)
            .await;

        let session = HostSession::login(&server.uri(), "u", "p").await.unwrap();
        let err = session
            .read_notification("engines.overTemp")
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::BadResponse(_)));
    }
}
