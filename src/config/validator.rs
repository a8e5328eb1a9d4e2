use crate::config::Config;
use crate::error::{Result, TripError, ValidationError};
use regex::Regex;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every problem found
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_storage(config, &mut errors);
        Self::validate_session(config, &mut errors);
        Self::validate_search(config, &mut errors);
        Self::validate_ranking(config, &mut errors);
        Self::validate_dedup(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TripError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_storage(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.storage.data_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "storage.data_dir",
                "Data directory cannot be empty",
            ));
        }

        if config.storage.database_file.is_empty() {
            errors.push(ValidationError::new(
                "storage.database_file",
                "Database file name cannot be empty",
            ));
        }

        if config.storage.pool_size == 0 {
            errors.push(ValidationError::new(
                "storage.pool_size",
                "Pool size must be greater than 0",
            ));
        }
    }

    fn validate_session(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.session.cache_ttl_minutes <= 0 {
            errors.push(ValidationError::new(
                "session.cache_ttl_minutes",
                "Cache TTL must be greater than 0",
            ));
        }

        if config.session.cache_capacity == 0 {
            errors.push(ValidationError::new(
                "session.cache_capacity",
                "Cache capacity must be greater than 0",
            ));
        }

        if config.session.page_size == 0 {
            errors.push(ValidationError::new(
                "session.page_size",
                "Page size must be greater than 0",
            ));
        }
    }

    fn validate_search(config: &Config, errors: &mut Vec<ValidationError>) {
        if !Self::is_valid_currency(&config.search.default_currency) {
            errors.push(ValidationError::new(
                "search.default_currency",
                format!(
                    "Currency must be a 3-letter ISO code, got '{}'",
                    config.search.default_currency
                ),
            ));
        }

        if config.search.default_limit == 0 {
            errors.push(ValidationError::new(
                "search.default_limit",
                "Default limit must be greater than 0",
            ));
        }

        if config.search.autocomplete_limit == 0 {
            errors.push(ValidationError::new(
                "search.autocomplete_limit",
                "Autocomplete limit must be greater than 0",
            ));
        }
    }

    fn validate_ranking(config: &Config, errors: &mut Vec<ValidationError>) {
        let ranking = &config.ranking;
        let weights = [
            ("ranking.price_weight", ranking.price_weight),
            ("ranking.quality_weight", ranking.quality_weight),
            ("ranking.relevance_weight", ranking.relevance_weight),
            ("ranking.personalization_weight", ranking.personalization_weight),
            ("ranking.freshness_weight", ranking.freshness_weight),
        ];

        for (path, weight) in weights {
            if !(0.0..=1.0).contains(&weight) {
                errors.push(ValidationError::new(
                    path,
                    format!("Weight must be between 0.0 and 1.0, got {}", weight),
                ));
            }
        }

        let sum = ranking.weight_sum();
        if (sum - 1.0).abs() > 1e-6 {
            errors.push(ValidationError::new(
                "ranking",
                format!("Ranking weights must sum to 1.0, got {:.3}", sum),
            ));
        }

        if ranking.freshness_window_secs <= 0 {
            errors.push(ValidationError::new(
                "ranking.freshness_window_secs",
                "Freshness window must be greater than 0",
            ));
        }
    }

    fn validate_dedup(config: &Config, errors: &mut Vec<ValidationError>) {
        let dedup = &config.dedup;
        let thresholds = [
            ("dedup.flights", dedup.flights),
            ("dedup.hotels", dedup.hotels),
            ("dedup.cars", dedup.cars),
            ("dedup.experiences", dedup.experiences),
        ];

        for (path, threshold) in thresholds {
            if threshold <= 0.0 || threshold > 1.0 {
                errors.push(ValidationError::new(
                    path,
                    format!("Threshold must be in (0.0, 1.0], got {}", threshold),
                ));
            }
        }
    }

    fn is_valid_currency(code: &str) -> bool {
        Regex::new(r"^[A-Z]{3}$")
            .map(|re| re.is_match(code))
            .unwrap_or(false)
    }
}
