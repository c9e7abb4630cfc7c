use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};

use gallery_catalog::DEFAULT_PAGE_SIZE;
use gallery_catalog::unsplash::DEFAULT_API_URL;

const PLACEHOLDER_APP_ID: &str = "your_sync_app_id";

pub struct Config {
    pub host: String,
    pub port: u16,
    /// Local user state (identity)
    pub state_path: PathBuf,
    pub sync_app_id: Option<String>,
    pub sync_db_dir: PathBuf,
    pub unsplash_access_key: Option<String>,
    pub unsplash_api_url: String,
    pub page_size: u32,
    pub mock_latency: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let sync_app_id = env::var("GALLERY_SYNC_APP_ID")
            .ok()
            .filter(|id| !id.trim().is_empty() && id != PLACEHOLDER_APP_ID);
        if sync_app_id.is_none() {
            error!("GALLERY_SYNC_APP_ID is missing; interactions will not be shared or kept");
        }

        Ok(Self {
            host: env_or("GALLERY_HOST", "127.0.0.1"),
            port: parse_env("GALLERY_PORT", 3000)?,
            state_path: env_or("GALLERY_STATE_PATH", "gallery-local.db").into(),
            sync_app_id,
            sync_db_dir: env_or("GALLERY_SYNC_DB_DIR", ".").into(),
            unsplash_access_key: env::var("UNSPLASH_ACCESS_KEY").ok(),
            unsplash_api_url: env_or("UNSPLASH_API_URL", DEFAULT_API_URL),
            page_size: parse_env("GALLERY_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            mock_latency: Duration::from_millis(parse_env("GALLERY_MOCK_LATENCY_MS", 0)?),
        })
    }

    /// File backing the shared interaction store, or `None` to run in memory.
    pub fn sync_db_path(&self) -> Option<PathBuf> {
        sync_store_path(self.sync_app_id.as_deref(), &self.sync_db_dir)
    }
}

fn sync_store_path(app_id: Option<&str>, dir: &Path) -> Option<PathBuf> {
    app_id.map(|id| dir.join(format!("{}.db", id)))
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid {key} value {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_file_is_named_after_the_app() {
        assert_eq!(
            sync_store_path(Some("gallery-prod"), Path::new("/var/lib/gallery")),
            Some(PathBuf::from("/var/lib/gallery/gallery-prod.db"))
        );
        assert_eq!(sync_store_path(None, Path::new(".")), None);
    }
}
