//! Process configuration for the sync client.
//!
//! Read once at startup. `SHOWCASE_CONFIG` names an optional TOML file used
//! as the base; the individual variables below override it.
//!
//! | Variable | Meaning |
//! |---|---|
//! | `SHOWCASE_TRANSPORT` | `local` or `remote-table` |
//! | `SHOWCASE_LOCAL_ENDPOINT` | local proxy URL |
//! | `SHOWCASE_REMOTE_URL` | remote project URL |
//! | `SHOWCASE_REMOTE_KEY` | remote API key |
//! | `SHOWCASE_PHOTOS_TABLE` | remote photo table name |
//! | `SHOWCASE_PHOTOS_ORDER` | column photos are ordered by |
//! | `SHOWCASE_REALTIME_URL` | change stream URL |
//! | `SHOWCASE_POLL_INTERVAL_SECS` | fallback poll period |

use crate::shared::config::{ConfigError, RemoteConfig, SyncConfig};

/// Load configuration from the process environment
pub fn load_config() -> Result<SyncConfig, ConfigError> {
    load_from(|key| std::env::var(key).ok())
}

/// Load configuration through an arbitrary variable lookup
pub fn load_from<F>(lookup: F) -> Result<SyncConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let mut config = match var("SHOWCASE_CONFIG") {
        Some(path) => {
            let source = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::Parse(format!("{}: {}", path, e)))?;
            SyncConfig::from_toml_str(&source)?
        }
        None => SyncConfig::default(),
    };

    if let Some(mode) = var("SHOWCASE_TRANSPORT") {
        config.mode = mode.parse()?;
    }
    if let Some(endpoint) = var("SHOWCASE_LOCAL_ENDPOINT") {
        config.local_endpoint = endpoint;
    }

    let remote_overrides = [
        "SHOWCASE_REMOTE_URL",
        "SHOWCASE_REMOTE_KEY",
        "SHOWCASE_PHOTOS_TABLE",
        "SHOWCASE_PHOTOS_ORDER",
    ];
    if remote_overrides.iter().any(|key| var(key).is_some()) {
        let mut remote = config.remote.take().unwrap_or_default();
        if let Some(url) = var("SHOWCASE_REMOTE_URL") {
            remote.url = url;
        }
        if let Some(key) = var("SHOWCASE_REMOTE_KEY") {
            remote.api_key = Some(key);
        }
        if let Some(table) = var("SHOWCASE_PHOTOS_TABLE") {
            remote.photos_table = table;
        }
        if let Some(column) = var("SHOWCASE_PHOTOS_ORDER") {
            remote.photos_order_column = column;
        }
        config.remote = Some(remote);
    }

    if let Some(url) = var("SHOWCASE_REALTIME_URL") {
        config.realtime_url = Some(url);
    }
    if let Some(secs) = var("SHOWCASE_POLL_INTERVAL_SECS") {
        let secs: u64 = secs.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: "SHOWCASE_POLL_INTERVAL_SECS",
            value: secs.clone(),
        })?;
        config.poll_interval_ms = secs.saturating_mul(1000);
    }

    config.validate()?;
    tracing::info!("[Sync] Configured for {} transport", config.mode);
    Ok(config)
}
