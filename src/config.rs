use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::{providers, ratelimit};
use crate::models::SortOrder;
use crate::tier::TierLimits;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub cache: CacheConfig,

    pub taddy: TaddyConfig,

    pub listen_notes: ListenNotesConfig,

    pub youtube: YouTubeConfig,

    pub rate_limits: RateLimitConfig,

    pub sponsored: SponsoredConfig,

    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            cache: CacheConfig::default(),
            taddy: TaddyConfig::default(),
            listen_notes: ListenNotesConfig::default(),
            youtube: YouTubeConfig::default(),
            rate_limits: RateLimitConfig::default(),
            sponsored: SponsoredConfig::default(),
            tiers: default_tiers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Timeout for every provider call; a hung provider is an error, not a
    /// stall.
    pub request_timeout_seconds: u64,

    /// 0 = tokio default.
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:castarr.db".to_string(),
            log_level: "info".to_string(),
            request_timeout_seconds: 15,
            worker_threads: 0,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// `auto`, `shared`, or `persistent`. `auto` probes once at startup.
    pub backend: String,

    /// Logical group for the shared backend's keyspace.
    pub group: String,

    /// Whether the shared backend may flush its group. When false,
    /// `clear-cache` on the shared backend is a no-op returning 0.
    pub group_flush: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: "auto".to_string(),
            group: "castarr".to_string(),
            group_flush: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaddyConfig {
    pub api_key: String,

    pub user_id: String,

    pub endpoint: String,
}

impl Default for TaddyConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            user_id: String::new(),
            endpoint: providers::TADDY_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenNotesConfig {
    pub api_key: String,

    pub endpoint: String,
}

impl Default for ListenNotesConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: providers::LISTEN_NOTES_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeConfig {
    pub api_key: String,

    pub endpoint: String,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: providers::YOUTUBE_ENDPOINT.to_string(),
        }
    }
}

/// Sliding-window sizes per provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub taddy: WindowSettings,

    pub listen_notes: WindowSettings,

    pub youtube: WindowSettings,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            taddy: WindowSettings {
                max_requests: 10,
                window_seconds: 60,
            },
            listen_notes: WindowSettings {
                max_requests: 20,
                window_seconds: 60,
            },
            youtube: WindowSettings {
                max_requests: 50,
                window_seconds: 60,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub max_requests: usize,

    pub window_seconds: u64,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            max_requests: ratelimit::DEFAULT_CAPACITY,
            window_seconds: ratelimit::DEFAULT_WINDOW_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SponsoredConfig {
    /// Most listings a single match call may return.
    pub max_slots: usize,
}

impl Default for SponsoredConfig {
    fn default() -> Self {
        Self {
            max_slots: crate::constants::limits::DEFAULT_SPONSORED_SLOTS,
        }
    }
}

/// One membership tier as configured by the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    pub name: String,
    pub max_pages: u32,
    pub max_page_size: u32,
    pub provider_max_results: u32,
    pub language_filter: bool,
    pub country_filter: bool,
    pub genre_filter: bool,
    pub date_filter: bool,
    pub allowed_sorts: Vec<String>,
    pub safe_mode_forced: bool,
}

impl TierConfig {
    #[must_use]
    pub fn to_limits(&self) -> TierLimits {
        let mut allowed_sorts: Vec<SortOrder> = self
            .allowed_sorts
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        if allowed_sorts.is_empty() {
            allowed_sorts.push(SortOrder::BestMatch);
        }

        TierLimits {
            max_pages: self.max_pages.max(1),
            max_page_size: self.max_page_size.max(1),
            provider_max_results: self.provider_max_results.max(1),
            language_filter: self.language_filter,
            country_filter: self.country_filter,
            genre_filter: self.genre_filter,
            date_filter: self.date_filter,
            allowed_sorts,
            safe_mode_forced: self.safe_mode_forced,
        }
    }
}

fn default_tiers() -> Vec<TierConfig> {
    vec![
        TierConfig {
            name: "free".to_string(),
            max_pages: 2,
            max_page_size: 5,
            provider_max_results: 10,
            language_filter: false,
            country_filter: false,
            genre_filter: false,
            date_filter: false,
            allowed_sorts: vec!["best-match".to_string()],
            safe_mode_forced: true,
        },
        TierConfig {
            name: "plus".to_string(),
            max_pages: 5,
            max_page_size: 10,
            provider_max_results: 25,
            language_filter: true,
            country_filter: false,
            genre_filter: true,
            date_filter: false,
            allowed_sorts: vec!["best-match".to_string(), "latest".to_string()],
            safe_mode_forced: true,
        },
        TierConfig {
            name: "pro".to_string(),
            max_pages: 10,
            max_page_size: 25,
            provider_max_results: 50,
            language_filter: true,
            country_filter: true,
            genre_filter: true,
            date_filter: true,
            allowed_sorts: vec![
                "best-match".to_string(),
                "latest".to_string(),
                "oldest".to_string(),
            ],
            safe_mode_forced: false,
        },
    ]
}

impl Config {
    pub fn load() -> Result<Self> {
        // Credentials may live in a .env next to the binary.
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CASTARR_TADDY_API_KEY") {
            self.taddy.api_key = v;
        }
        if let Ok(v) = std::env::var("CASTARR_TADDY_USER_ID") {
            self.taddy.user_id = v;
        }
        if let Ok(v) = std::env::var("CASTARR_LISTEN_API_KEY") {
            self.listen_notes.api_key = v;
        }
        if let Ok(v) = std::env::var("CASTARR_YOUTUBE_API_KEY") {
            self.youtube.api_key = v;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("castarr.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("castarr").join("config.toml"));
        }
        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.request_timeout_seconds == 0 {
            anyhow::bail!("general.request_timeout_seconds must be > 0");
        }
        if !matches!(self.cache.backend.as_str(), "auto" | "shared" | "persistent") {
            anyhow::bail!(
                "cache.backend must be one of auto/shared/persistent, got '{}'",
                self.cache.backend
            );
        }
        if self.tiers.is_empty() {
            anyhow::bail!("at least one tier must be configured");
        }
        for tier in &self.tiers {
            if tier.name.trim().is_empty() {
                anyhow::bail!("tier names must not be empty");
            }
        }
        Ok(())
    }
}
