use crate::model::Category;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the search engine
#[derive(Error, Debug)]
pub enum TripError {
    /// Request validation failed (e.g. missing destination)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Session token unknown to both cache and store
    #[error("Session not found: {token}")]
    SessionNotFound { token: String },

    /// Operation needs stored results that the category does not have
    #[error("No results for category: {category}")]
    NoResults { category: Category },

    /// Provider call failed
    #[error("Provider error ({category}): {message}")]
    Provider { category: Category, message: String },

    /// Destination catalog or preference lookup failed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Blocking task failed to complete
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TripError {
    /// Stable error code reported in failure responses
    pub fn code(&self) -> &'static str {
        match self {
            TripError::Validation(_) => "VALIDATION_ERROR",
            TripError::SessionNotFound { .. } => "SESSION_NOT_FOUND",
            TripError::NoResults { .. } => "NO_RESULTS",
            TripError::Provider { .. } => "PROVIDER_ERROR",
            TripError::Catalog(_) => "CATALOG_ERROR",
            TripError::Config(_)
            | TripError::ConfigValidation { .. }
            | TripError::ConfigNotFound { .. }
            | TripError::InvalidConfigValue { .. } => "CONFIG_ERROR",
            TripError::Database(_) | TripError::Pool(_) => "STORAGE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    pub(crate) fn json(source: serde_json::Error, context: impl Into<String>) -> Self {
        TripError::Json {
            source,
            context: context.into(),
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, TripError>;
