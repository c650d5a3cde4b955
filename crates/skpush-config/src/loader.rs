use std::env;
use std::path::PathBuf;

use config::{Config, Environment, File};

use crate::settings::{AppConfig, VapidConfig};
use crate::{ConfigError, Result};

/// Load configuration from an optional TOML file plus environment
/// overrides (e.g. `SKPUSH__SERVER__PORT=9090`), then validate.
pub fn load_config(path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();
    match path {
        Some(p) => {
            let pathbuf = PathBuf::from(p);
            if pathbuf.exists() {
                builder = builder.add_source(File::from(pathbuf));
            }
        }
        None => {
            let default_path = PathBuf::from("skpush.toml");
            if default_path.exists() {
                builder = builder.add_source(File::from(default_path));
            }
        }
    }
    builder = builder.add_source(
        Environment::with_prefix("SKPUSH")
            .try_parsing(true)
            .separator("__"),
    );
    let cfg = builder
        .build()
        .map_err(|e| ConfigError::parse(format!("config build error: {e}")))?;
    let mut merged: AppConfig = cfg
        .try_deserialize()
        .map_err(|e| ConfigError::parse(format!("config deserialize error: {e}")))?;

    apply_vapid_env(&mut merged);

    merged.validate().map_err(ConfigError::validation)?;
    Ok(merged)
}

/// VAPID keys are commonly provisioned through the process environment;
/// fall back to it when the config file carries no
/// `services.webpush.vapid` table.
fn apply_vapid_env(cfg: &mut AppConfig) {
    let Some(webpush) = cfg.services.webpush.as_mut() else {
        return;
    };
    if webpush.vapid.is_some() {
        return;
    }
    if let (Ok(public_key), Ok(private_key), Ok(subject)) = (
        env::var("VAPID_PUBLIC_KEY"),
        env::var("VAPID_PRIVATE_KEY"),
        env::var("VAPID_SUBJECT"),
    ) {
        webpush.vapid = Some(VapidConfig {
            public_key,
            private_key,
            subject,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_without_file_uses_defaults() {
        let cfg = load_config(Some("/definitely/not/here/skpush.toml")).unwrap();
        assert_eq!(cfg.server.port, 8085);
        assert!(cfg.paths.is_empty());
    }
}
