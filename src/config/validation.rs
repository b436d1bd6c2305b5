use crate::config::types::{Config, FetcherConfig, QueueConfig, StoreConfig, WorkerConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_store_config(&config.store)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_queue_config(&config.queue)?;
    validate_worker_config(&config.worker)?;
    Ok(())
}

/// Validates store configuration
fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if let Some(key) = &config.api_key {
        if key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "api_key cannot be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates queue configuration
fn validate_queue_config(config: &QueueConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.retry_base_delay_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "retry_base_delay_ms must be >= 1, got {}",
            config.retry_base_delay_ms
        )));
    }

    if config.retry_multiplier < 1.0 {
        return Err(ConfigError::Validation(format!(
            "retry_multiplier must be >= 1.0, got {}",
            config.retry_multiplier
        )));
    }

    Ok(())
}

/// Validates worker configuration
fn validate_worker_config(config: &WorkerConfig) -> Result<(), ConfigError> {
    if config.count < 1 || config.count > 64 {
        return Err(ConfigError::Validation(format!(
            "worker count must be between 1 and 64, got {}",
            config.count
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_store_config() {
        let valid = StoreConfig {
            database_path: "./inkdrop.db".to_string(),
        };
        assert!(validate_store_config(&valid).is_ok());

        let empty = StoreConfig {
            database_path: String::new(),
        };
        assert!(validate_store_config(&empty).is_err());
    }

    #[test]
    fn test_validate_fetcher_config() {
        assert!(validate_fetcher_config(&FetcherConfig::default()).is_ok());

        let config = FetcherConfig {
            base_url: "not a url".to_string(),
            ..FetcherConfig::default()
        };
        assert!(validate_fetcher_config(&config).is_err());

        let config = FetcherConfig {
            base_url: "ftp://reader.example.com".to_string(),
            ..FetcherConfig::default()
        };
        assert!(validate_fetcher_config(&config).is_err());

        let config = FetcherConfig {
            request_timeout_secs: 0,
            ..FetcherConfig::default()
        };
        assert!(validate_fetcher_config(&config).is_err());

        let config = FetcherConfig {
            api_key: Some("  ".to_string()),
            ..FetcherConfig::default()
        };
        assert!(validate_fetcher_config(&config).is_err());

        let config = FetcherConfig {
            api_key: Some("real-key".to_string()),
            ..FetcherConfig::default()
        };
        assert!(validate_fetcher_config(&config).is_ok());
    }

    #[test]
    fn test_validate_queue_config() {
        assert!(validate_queue_config(&QueueConfig::default()).is_ok());

        let config = QueueConfig {
            max_attempts: 0,
            ..QueueConfig::default()
        };
        assert!(validate_queue_config(&config).is_err());

        let config = QueueConfig {
            max_attempts: 11,
            ..QueueConfig::default()
        };
        assert!(validate_queue_config(&config).is_err());

        let config = QueueConfig {
            retry_base_delay_ms: 0,
            ..QueueConfig::default()
        };
        assert!(validate_queue_config(&config).is_err());

        let config = QueueConfig {
            retry_multiplier: 0.5,
            ..QueueConfig::default()
        };
        assert!(validate_queue_config(&config).is_err());
    }

    #[test]
    fn test_validate_worker_config() {
        assert!(validate_worker_config(&WorkerConfig::default()).is_ok());
        assert!(validate_worker_config(&WorkerConfig { count: 0 }).is_err());
        assert!(validate_worker_config(&WorkerConfig { count: 65 }).is_err());
        assert!(validate_worker_config(&WorkerConfig { count: 64 }).is_ok());
    }
}
