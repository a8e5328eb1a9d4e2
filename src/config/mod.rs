//! Configuration management for tripsearch
//!
//! Loads the TOML configuration, applies profile and environment overrides,
//! and validates the result before any component is constructed.

use crate::error::{Result, TripError};
use crate::model::Category;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Durable session store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
    pub pool_size: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("~/.tripsearch"),
            database_file: "sessions.sqlite".to_string(),
            pool_size: 8,
        }
    }
}

/// Session cache and pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle time after which a session is evicted from the in-memory cache
    pub cache_ttl_minutes: i64,
    /// Maximum number of sessions held in memory
    pub cache_capacity: usize,
    pub page_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: 30,
            cache_capacity: 1024,
            page_size: 50,
        }
    }
}

/// Query parsing and lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub default_currency: String,
    pub default_flex_days: u32,
    pub autocomplete_limit: usize,
    pub trending_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            default_currency: "USD".to_string(),
            default_flex_days: 3,
            autocomplete_limit: 8,
            trending_limit: 10,
        }
    }
}

/// Ranking component weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    pub price_weight: f64,
    pub quality_weight: f64,
    pub relevance_weight: f64,
    pub personalization_weight: f64,
    pub freshness_weight: f64,
    /// Window over which the freshness score decays from 100 to 50
    pub freshness_window_secs: i64,
}

impl RankingConfig {
    pub fn weight_sum(&self) -> f64 {
        self.price_weight
            + self.quality_weight
            + self.relevance_weight
            + self.personalization_weight
            + self.freshness_weight
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            price_weight: 0.30,
            quality_weight: 0.25,
            relevance_weight: 0.20,
            personalization_weight: 0.15,
            freshness_weight: 0.10,
            freshness_window_secs: 300,
        }
    }
}

/// Per-category similarity thresholds (0 to 1) for cross-provider merging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    pub flights: f64,
    pub hotels: f64,
    pub cars: f64,
    pub experiences: f64,
}

impl DedupConfig {
    pub fn threshold(&self, category: Category) -> f64 {
        match category {
            Category::Flights => self.flights,
            Category::Hotels => self.hotels,
            Category::Cars => self.cars,
            Category::Experiences => self.experiences,
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            flights: 0.85,
            hotels: 0.80,
            cars: 0.75,
            experiences: 0.70,
        }
    }
}

/// Destination catalog source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// TOML file with destination entries; the bundled catalog is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destinations_file: Option<PathBuf>,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_ttl_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TripError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| TripError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Load the file at `path` if given, the default location otherwise,
    /// falling back to built-in defaults when no file exists
    pub fn load_or_default(path: Option<&Path>, profile: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        let mut config = match Self::load(&path) {
            Ok(config) => config,
            Err(TripError::ConfigNotFound { .. }) => {
                tracing::debug!("No config at {:?}, using defaults", path);
                let mut config = Config::default();
                config.apply_env_overrides();
                ConfigValidator::validate(&config)?;
                config
            }
            Err(e) => return Err(e),
        };

        if let Some(profile) = profile {
            config.apply_profile(profile)?;
            ConfigValidator::validate(&config)?;
        }

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TripError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", parent),
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| TripError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| TripError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(currency) = overrides.default_currency {
            self.search.default_currency = currency;
        }
        if let Some(ttl) = overrides.cache_ttl_minutes {
            self.session.cache_ttl_minutes = ttl;
        }
        if let Some(page_size) = overrides.page_size {
            self.session.page_size = page_size;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: TRIPSEARCH_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("TRIPSEARCH_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "STORAGE__DATA_DIR" => {
                self.storage.data_dir = PathBuf::from(value);
            }
            "SEARCH__DEFAULT_CURRENCY" => {
                self.search.default_currency = value.to_uppercase();
            }
            "SESSION__CACHE_TTL_MINUTES" => {
                self.session.cache_ttl_minutes =
                    value.parse().map_err(|_| TripError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as integer", value),
                    })?;
            }
            "SESSION__PAGE_SIZE" => {
                self.session.page_size =
                    value.parse().map_err(|_| TripError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as integer", value),
                    })?;
            }
            "CATALOG__DESTINATIONS_FILE" => {
                self.catalog.destinations_file = Some(PathBuf::from(value));
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Path of the SQLite session database, with `~/` expanded
    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(expand_path(&self.storage.data_dir)?.join(&self.storage.database_file))
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TripError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("tripsearch").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            storage: StorageConfig::default(),
            session: SessionConfig::default(),
            search: SearchConfig::default(),
            ranking: RankingConfig::default(),
            dedup: DedupConfig::default(),
            catalog: CatalogConfig::default(),
            profiles: HashMap::new(),
        }
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| TripError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| TripError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
