use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub data_dir: String,
    pub pagination: PaginationConfig,
    /// Enables dangerous operations like purge. Must never be true in production.
    pub test_mode: bool,
}

#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// Page size used when a listing request does not ask for one
    pub default_page_size: u32,
    /// Largest page size a caller may request
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let defaults = PaginationConfig::default();
        let default_page_size = std::env::var("DEFAULT_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.default_page_size);
        let max_page_size = std::env::var("MAX_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_page_size);

        let test_mode = std::env::var("TEST_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let config = Config {
            bind_address,
            data_dir,
            pagination: PaginationConfig {
                default_page_size,
                max_page_size,
            },
            test_mode,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "DATA_DIR cannot be empty".to_string(),
            ));
        }

        if self.pagination.default_page_size == 0 {
            return Err(ConfigError::ValidationError(
                "DEFAULT_PAGE_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.pagination.max_page_size < self.pagination.default_page_size {
            return Err(ConfigError::ValidationError(
                "MAX_PAGE_SIZE cannot be smaller than DEFAULT_PAGE_SIZE".to_string(),
            ));
        }

        if self.test_mode {
            tracing::warn!("TEST_MODE is enabled. Do not run this configuration in production.");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: "./data".to_string(),
            pagination: PaginationConfig::default(),
            test_mode: false,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut config = config();
        config.pagination.default_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_below_default_rejected() {
        let mut config = config();
        config.pagination.max_page_size = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_data_dir_rejected() {
        let mut config = config();
        config.data_dir = " ".to_string();
        assert!(config.validate().is_err());
    }
}
