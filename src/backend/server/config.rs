/**
 * Server Configuration
 *
 * Loaded from environment variables with defaults suited to local
 * development:
 *
 * - `SERVER_PORT` (default 4000)
 * - `SHOWCASE_DATA_PATH` - snapshot file (default `data.json`)
 * - `SHOWCASE_CACHE_TTL_SECS` - read endpoint cache lifetime (default 10)
 * - `SHOWCASE_GALLERY_PAGE_SIZE` - default gallery page size (default 12)
 *
 * Unparseable values are logged and replaced by the default rather than
 * preventing startup.
 */

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_DATA_PATH: &str = "data.json";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 10;
pub const DEFAULT_GALLERY_PAGE_SIZE: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub cache_ttl: Duration,
    pub gallery_page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            gallery_page_size: DEFAULT_GALLERY_PAGE_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let port = parse_or(&lookup, "SERVER_PORT", defaults.port);
        let data_path = lookup("SHOWCASE_DATA_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);
        let ttl_secs = parse_or(&lookup, "SHOWCASE_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS);
        let gallery_page_size =
            parse_or(&lookup, "SHOWCASE_GALLERY_PAGE_SIZE", defaults.gallery_page_size).max(1);

        Self {
            port,
            data_path,
            cache_ttl: Duration::from_secs(ttl_secs),
            gallery_page_size,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{}='{}' is invalid, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
