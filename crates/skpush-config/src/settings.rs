use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use skpush_core::NotificationState;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// The Signal K host this server authenticates against and watches.
    #[serde(default)]
    pub host: HostConfig,
    /// Mixed watch-list entries: literal notification paths, remote
    /// watch-list URLs and `restart:` directives.
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub subscriber_database: SubscriberDatabaseConfig,
    #[serde(default)]
    pub services: ServicesConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        self.host
            .split_credentials()
            .map_err(|e| format!("host.credentials: {e}"))?;
        if self.subscriber_database.resource_type.is_empty() {
            return Err("subscriber_database.resource_type must not be empty".into());
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8085
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Base URL of the Signal K server.
    #[serde(default = "default_host_base_url")]
    pub base_url: String,
    /// `user:pass` pair used for host login.
    #[serde(default = "default_credentials")]
    pub credentials: String,
}

fn default_host_base_url() -> String {
    "https://localhost:3443".into()
}
fn default_credentials() -> String {
    "push-notifier:".into()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_url: default_host_base_url(),
            credentials: default_credentials(),
        }
    }
}

impl HostConfig {
    /// Split `user:pass` credentials; the password may be empty but the
    /// separator is required.
    pub fn split_credentials(&self) -> Result<(&str, &str), String> {
        self.credentials
            .split_once(':')
            .ok_or_else(|| "expected 'user:pass'".to_string())
    }
}

/// Where subscriber records live on the host's resource CRUD API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberDatabaseConfig {
    #[serde(default = "default_resource_type")]
    pub resource_type: String,
    #[serde(default = "default_resource_provider_id")]
    pub resource_provider_id: String,
}

fn default_resource_type() -> String {
    "push-notifier".into()
}
fn default_resource_provider_id() -> String {
    "resources-provider".into()
}

impl Default for SubscriberDatabaseConfig {
    fn default() -> Self {
        Self {
            resource_type: default_resource_type(),
            resource_provider_id: default_resource_provider_id(),
        }
    }
}

/// Per-channel service sections. A missing section disables the channel.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServicesConfig {
    #[serde(default)]
    pub email: Option<EmailServiceConfig>,
    #[serde(default)]
    pub webpush: Option<WebpushServiceConfig>,
}

fn default_trigger_states() -> Vec<NotificationState> {
    vec![NotificationState::Alarm, NotificationState::Emergency]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailServiceConfig {
    /// Notification states that trigger a mail send.
    #[serde(default = "default_trigger_states")]
    pub states: Vec<NotificationState>,
    pub transport: SmtpTransportConfig,
    pub message: MailMessageOptions,
    /// Minutes between SMTP connectivity probes; absent or zero disables
    /// the periodic check.
    #[serde(default)]
    pub connection_check_interval_minutes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpTransportConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailMessageOptions {
    /// Sender address placed on every outbound message.
    pub from: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebpushServiceConfig {
    /// Notification states that trigger a push send.
    #[serde(default = "default_trigger_states")]
    pub states: Vec<NotificationState>,
    /// Send failures tolerated before a subscriber is evicted.
    #[serde(default = "default_send_failure_limit")]
    pub send_failure_limit: u32,
    #[serde(default = "default_push_ttl")]
    pub ttl_seconds: u32,
    /// VAPID key material; filled from VAPID_* environment variables when
    /// absent.
    #[serde(default)]
    pub vapid: Option<VapidConfig>,
}

fn default_send_failure_limit() -> u32 {
    5
}
fn default_push_ttl() -> u32 {
    10_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VapidConfig {
    pub public_key: String,
    pub private_key: String,
    pub subject: String,
}
