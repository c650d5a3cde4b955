//! Configuration for skpush: one immutable tree built at startup and
//! handed to every component, loaded from a TOML file with environment
//! overrides.

pub mod loader;
pub mod settings;

pub use loader::load_config;
pub use settings::{
    AppConfig, EmailServiceConfig, HostConfig, LoggingConfig, MailMessageOptions, ServerConfig,
    ServicesConfig, SmtpTransportConfig, SubscriberDatabaseConfig, VapidConfig,
    WebpushServiceConfig,
};

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
