use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use skpush_config::{AppConfig, load_config};
use skpush_notifications::{
    ChannelFilter, DispatchEngine, EngineRunner, HttpPushAdapter, MailChannel, PushChannel,
    ResolveError, SmtpMailAdapter, resolve,
};
use skpush_server::host::{
    DEFAULT_POLL_INTERVAL, HostSession, OfflineExpander, spawn_notification_watchers,
    spawn_restart_watchers,
};
use skpush_server::{AppState, ServerBuilder};
use skpush_storage::{MemoryStore, ResourcesStore, SubscriberStore};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From SKPUSH_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (skpush.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (SKPUSH_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// A running dispatch instance, torn down on shutdown or restart.
struct Runtime {
    state: AppState,
    runner: Option<EngineRunner>,
    restart: mpsc::Receiver<String>,
    watcher_shutdown: watch::Sender<bool>,
    watcher_tasks: Vec<JoinHandle<()>>,
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // Initialize tracing early with the default level
    skpush_server::observability::init_tracing();

    // Parse config path from CLI, environment, or use default
    let (config_path, source) = resolve_config_path();

    let cfg = match load_config(Some(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing::info!(
        path = %config_path,
        source = %source,
        "Configuration loaded"
    );
    skpush_server::observability::apply_logging_level(&cfg.logging.level);

    // A restart directive tears the runtime down and rebuilds it from
    // configuration; Ctrl+C ends the process.
    loop {
        let Runtime {
            state,
            runner,
            mut restart,
            watcher_shutdown,
            watcher_tasks,
        } = bootstrap(&cfg).await;
        let server = ServerBuilder::new(state).build();

        let restarting = Arc::new(AtomicBool::new(false));
        let shutdown = {
            let restarting = restarting.clone();
            async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("shutdown signal received");
                    }
                    Some(path) = restart.recv() => {
                        tracing::info!(path = %path, "restart requested");
                        restarting.store(true, Ordering::SeqCst);
                    }
                }
            }
        };

        let result = server.run_until(shutdown).await;

        let _ = watcher_shutdown.send(true);
        for task in watcher_tasks {
            task.abort();
        }
        if let Some(runner) = runner {
            runner.stop().await;
        }

        if let Err(err) = result {
            eprintln!("Server error: {err}");
            break;
        }
        if !restarting.load(Ordering::SeqCst) {
            break;
        }
        info!("restarting dispatch runtime");
    }
}

/// Build the dispatch runtime from configuration.
///
/// Host login failure, an authorization-rejected watch-list fetch or an
/// empty channel set leave the runtime inert: the HTTP surface still
/// serves, nothing is dispatched.
async fn bootstrap(cfg: &AppConfig) -> Runtime {
    let (watcher_shutdown, shutdown_rx) = watch::channel(false);
    let (restart_tx, restart_rx) = mpsc::channel(4);

    let inert = |reason: &str| {
        warn!(reason, "dispatch disabled; serving inert");
        Runtime {
            state: AppState::new(
                cfg.clone(),
                Arc::new(MemoryStore::new()),
                None,
                Arc::new(OfflineExpander),
            ),
            runner: None,
            restart: mpsc::channel(1).1,
            watcher_shutdown: watch::channel(false).0,
            watcher_tasks: Vec::new(),
        }
    };

    // Credentials were validated at load time.
    let Ok((username, password)) = cfg.host.split_credentials() else {
        return inert("host credentials are malformed");
    };
    let session = match HostSession::login(&cfg.host.base_url, username, password).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!(error = %e, "host login failed");
            return inert("host login failed");
        }
    };

    let store: Arc<dyn SubscriberStore> = Arc::new(ResourcesStore::new(
        session.client_handle(),
        session.base_url().clone(),
        cfg.subscriber_database.resource_type.clone(),
        cfg.subscriber_database.resource_provider_id.clone(),
        session.token(),
    ));

    let mail = cfg.services.email.as_ref().and_then(|email| {
        match SmtpMailAdapter::from_config(email) {
            Ok(adapter) => {
                info!("email service configured");
                Some(MailChannel {
                    adapter: Arc::new(adapter),
                    filter: ChannelFilter::new(email.states.clone()),
                })
            }
            Err(e) => {
                warn!(error = %e, "error configuring email transport");
                None
            }
        }
    });
    let push = cfg.services.webpush.as_ref().map(|webpush| {
        info!("web-push service configured");
        PushChannel {
            adapter: Arc::new(HttpPushAdapter::from_config(webpush)),
            filter: ChannelFilter::new(webpush.states.clone()),
            failure_limit: webpush.send_failure_limit,
        }
    });
    if mail.is_none() && push.is_none() {
        return inert("no services have been initialised");
    }

    let resolved = match resolve(&cfg.paths, session.as_ref()).await {
        Ok(r) => r,
        Err(ResolveError::Unauthorized { url }) => {
            error!(url = %url, "watch-list fetch refused authorization");
            return inert("watch-list resolution was refused");
        }
    };
    for warning in &resolved.warnings {
        warn!(warning = %warning, "watch-list entry skipped");
    }
    info!(
        paths = resolved.watch.len(),
        "listening for notifications"
    );

    let connection_check = cfg
        .services
        .email
        .as_ref()
        .and_then(|e| e.connection_check_interval_minutes)
        .filter(|m| *m > 0)
        .map(|m| Duration::from_secs(m * 60));

    let engine = Arc::new(DispatchEngine::new(store.clone(), mail, push));
    let (events_tx, events_rx) = mpsc::channel(64);
    let runner = engine.start(events_rx, connection_check);

    let mut watcher_tasks = spawn_notification_watchers(
        session.clone(),
        &resolved.watch,
        DEFAULT_POLL_INTERVAL,
        events_tx,
        shutdown_rx.clone(),
    );
    watcher_tasks.extend(spawn_restart_watchers(
        session.clone(),
        &resolved.restart,
        DEFAULT_POLL_INTERVAL,
        restart_tx,
        shutdown_rx,
    ));

    Runtime {
        state: AppState::new(cfg.clone(), store, Some(engine), session),
        runner: Some(runner),
        restart: restart_rx,
        watcher_shutdown,
        watcher_tasks,
    }
}

/// Resolve the configuration file path.
///
/// Priority order:
/// 1. CLI argument: --config <path>
/// 2. Environment variable: SKPUSH_CONFIG
/// 3. Default: skpush.toml
fn resolve_config_path() -> (String, ConfigSource) {
    // 1. Check CLI: --config <path>
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (path, ConfigSource::CliArgument);
            }
        }
    }

    // 2. Check environment variable
    if let Ok(path) = env::var("SKPUSH_CONFIG") {
        if !path.is_empty() {
            return (path, ConfigSource::EnvironmentVariable);
        }
    }

    // 3. Default to skpush.toml
    ("skpush.toml".to_string(), ConfigSource::Default)
}
