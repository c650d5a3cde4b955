//! The dispatch orchestrator.
//!
//! Each notification is handled statelessly: read the current subscriber
//! set, partition it, filter per channel, fan out concurrently. The only
//! mutable state the engine touches is the push failure counter (via the
//! tracker) and a mail connection indicator used for status reporting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use skpush_core::{MailMessage, Notification, PushMessage, Subscriber};
use skpush_storage::SubscriberStore;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::adapters::{DeliveryOutcome, MailAdapter, PushAdapter, PushTarget};
use crate::error::NotificationError;
use crate::failures::{FailureAction, FailureTracker};
use crate::filter::ChannelFilter;
use crate::partition::partition;

/// Mail transport connectivity, as reported by the periodic check and by
/// send outcomes. Only used for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Up,
    Down,
    Unknown,
}

/// The configured mail channel: adapter plus trigger-state filter.
pub struct MailChannel {
    pub adapter: Arc<dyn MailAdapter>,
    pub filter: ChannelFilter,
}

/// The configured push channel: adapter, trigger-state filter and the
/// failure budget before eviction.
pub struct PushChannel {
    pub adapter: Arc<dyn PushAdapter>,
    pub filter: ChannelFilter,
    pub failure_limit: u32,
}

pub struct DispatchEngine {
    store: Arc<dyn SubscriberStore>,
    mail: Option<MailChannel>,
    push: Option<PushChannel>,
    tracker: Option<FailureTracker>,
    connection: watch::Sender<ConnectionState>,
    stopped: AtomicBool,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<dyn SubscriberStore>,
        mail: Option<MailChannel>,
        push: Option<PushChannel>,
    ) -> Self {
        let tracker = push
            .as_ref()
            .map(|p| FailureTracker::new(store.clone(), p.failure_limit));
        let (connection, _) = watch::channel(ConnectionState::Unknown);
        Self {
            store,
            mail,
            push,
            tracker,
            connection,
            stopped: AtomicBool::new(false),
        }
    }

    /// Names of the channels this engine can deliver on.
    #[must_use]
    pub fn services(&self) -> Vec<&'static str> {
        let mut services = Vec::new();
        if self.mail.is_some() {
            services.push("email");
        }
        if self.push.is_some() {
            services.push("webpush");
        }
        services
    }

    #[must_use]
    pub fn has_channels(&self) -> bool {
        self.mail.is_some() || self.push.is_some()
    }

    #[must_use]
    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn set_connection(&self, state: ConnectionState) {
        let previous = *self.connection.borrow();
        if previous == state {
            return;
        }
        // send_replace stores the value even while nobody subscribes;
        // receivers only appear when a status request comes in.
        self.connection.send_replace(state);
        match state {
            ConnectionState::Up => info!("mail network connection has come up"),
            ConnectionState::Down => warn!("mail network connection has gone down"),
            ConnectionState::Unknown => {}
        }
    }

    /// Probe the mail transport now, updating the connection indicator.
    /// Returns `None` when no mail channel is configured.
    pub async fn verify_mail(&self) -> Option<Result<(), NotificationError>> {
        let mail = self.mail.as_ref()?;
        let result = mail.adapter.verify().await;
        self.set_connection(match result {
            Ok(()) => ConnectionState::Up,
            Err(_) => ConnectionState::Down,
        });
        Some(result)
    }

    /// Handle one notification on a watched path.
    ///
    /// Failures never escalate: a store read failure drops this event, a
    /// channel failure never blocks the other channel, and push outcomes
    /// are folded into the failure tracker afterwards.
    pub async fn handle(&self, path: &str, notification: &Notification) {
        if self.is_stopped() {
            return;
        }
        if !notification.has_method() {
            debug!(path = %path, "notification without method marker dropped");
            return;
        }

        let subscribers = match self.store.list().await {
            Ok(s) => s,
            Err(e) => {
                error!(path = %path, error = %e, "cannot read subscribers; dropping notification");
                return;
            }
        };
        let groups = partition(&subscribers);

        let (_, outcomes) = tokio::join!(
            self.send_mail(path, notification, &groups.mail),
            self.send_push(path, notification, &groups.push),
        );

        if self.is_stopped() {
            debug!(path = %path, "engine stopped; discarding push outcomes");
            return;
        }
        if let Some(tracker) = &self.tracker {
            for outcome in &outcomes {
                match tracker.record(outcome).await {
                    Ok(Some(FailureAction::Evicted)) => {
                        info!(subscriber = %outcome.subscriber_id, "push subscriber evicted");
                    }
                    Ok(Some(FailureAction::Incremented(count))) => {
                        debug!(subscriber = %outcome.subscriber_id, failures = count, "push failure recorded");
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(subscriber = %outcome.subscriber_id, error = %e, "failure bookkeeping skipped");
                    }
                }
            }
        }
    }

    async fn send_mail(&self, path: &str, notification: &Notification, recipients: &[String]) {
        let Some(mail) = &self.mail else { return };
        if recipients.is_empty() || !mail.filter.admits(notification.state) {
            return;
        }

        debug!(path = %path, recipients = recipients.len(), "sending message to email subscribers");
        let message = MailMessage::from_notification(notification, Some(path));
        match mail.adapter.send(&message, recipients).await {
            Ok(()) => self.set_connection(ConnectionState::Up),
            Err(e) => {
                warn!(path = %path, error = %e, "mail send failed");
                self.set_connection(ConnectionState::Down);
            }
        }
    }

    async fn send_push(
        &self,
        path: &str,
        notification: &Notification,
        targets: &[PushTarget],
    ) -> Vec<DeliveryOutcome> {
        let Some(push) = &self.push else {
            return Vec::new();
        };
        if targets.is_empty() || !push.filter.admits(notification.state) {
            return Vec::new();
        }

        debug!(path = %path, recipients = targets.len(), "sending notification to web-push subscribers");
        let message = PushMessage::from_notification(notification, Some(path));
        push.adapter.send(&message, targets).await
    }

    /// Targeted single-subscriber delivery, used by the test/probe
    /// endpoint. Channel selection follows the subscriber id shape; no
    /// trigger-state filtering applies.
    pub async fn send_to_subscriber(
        &self,
        subscriber_id: &str,
        notification: &Notification,
    ) -> Result<(), NotificationError> {
        let subscribers = self.store.list().await?;
        let record = subscribers
            .get(subscriber_id)
            .ok_or_else(|| NotificationError::subscriber_not_found(subscriber_id))?;

        match Subscriber::classify(subscriber_id, record) {
            Ok(Subscriber::Mail { address }) => {
                let mail = self.mail.as_ref().ok_or_else(|| {
                    NotificationError::invalid_config("email service is not configured")
                })?;
                let message = MailMessage::from_notification(notification, None);
                mail.adapter.send(&message, std::slice::from_ref(&address)).await
            }
            Ok(Subscriber::Push {
                id, subscription, ..
            }) => {
                let push = self.push.as_ref().ok_or_else(|| {
                    NotificationError::invalid_config("webpush service is not configured")
                })?;
                let message = PushMessage::from_notification(notification, None);
                let outcomes = push
                    .adapter
                    .send(&message, &[PushTarget { id, subscription }])
                    .await;
                match outcomes.into_iter().next() {
                    Some(outcome) if outcome.success => Ok(()),
                    Some(outcome) => Err(NotificationError::send_failed(
                        outcome.error.unwrap_or_else(|| "unknown error".to_string()),
                    )),
                    None => Err(NotificationError::send_failed("no delivery outcome")),
                }
            }
            Err(e) => Err(NotificationError::InvalidRecord(e.to_string())),
        }
    }

    /// Spawn the event loop and, when an interval is given, the periodic
    /// mail connectivity check. Both stop through the returned runner.
    pub fn start(
        self: &Arc<Self>,
        events: mpsc::Receiver<(String, Notification)>,
        connection_check: Option<Duration>,
    ) -> EngineRunner {
        let (shutdown, _) = watch::channel(false);
        let mut tasks = Vec::new();

        {
            let engine = Arc::clone(self);
            let mut shutdown_rx = shutdown.subscribe();
            let mut events = events;
            tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        received = events.recv() => match received {
                            Some((path, notification)) => {
                                // Paths deliver concurrently; each event
                                // gets its own task.
                                let engine = Arc::clone(&engine);
                                tokio::spawn(async move {
                                    engine.handle(&path, &notification).await;
                                });
                            }
                            None => break,
                        },
                        _ = shutdown_rx.changed() => break,
                    }
                }
                debug!("dispatch loop stopped");
            }));
        }

        if let Some(interval) = connection_check {
            if self.mail.is_some() {
                let engine = Arc::clone(self);
                let mut shutdown_rx = shutdown.subscribe();
                tasks.push(tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(interval);
                    loop {
                        tokio::select! {
                            _ = ticker.tick() => {
                                engine.verify_mail().await;
                            }
                            _ = shutdown_rx.changed() => break,
                        }
                    }
                    debug!("connection check stopped");
                }));
            }
        }

        EngineRunner {
            engine: Arc::clone(self),
            shutdown,
            tasks,
        }
    }
}

/// Handle to a running engine: owns its background tasks and the
/// shutdown signal.
pub struct EngineRunner {
    engine: Arc<DispatchEngine>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl EngineRunner {
    /// Stop the event loop and the connectivity timer. In-flight sends
    /// are left to finish naturally; outcomes observed after this point
    /// are discarded rather than applied.
    pub async fn stop(self) {
        self.engine.stopped.store(true, Ordering::SeqCst);
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}
