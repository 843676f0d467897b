use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const ENDPOINT_ENV: &str = "VISION_SENSOR_URL";
pub const TIMEOUT_ENV: &str = "VISION_SENSOR_TIMEOUT_MS";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("Invalid timeout '{value}': {reason}")]
    InvalidTimeout { value: String, reason: String },
}

/// Where the sensor lives and how long to wait for each reply
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub endpoint: Url,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Configuration for `endpoint` with the default 5000ms reply timeout
    pub fn new(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: Self::parse_endpoint(endpoint)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                value: format!("{:?}", timeout),
                reason: "timeout must be greater than zero".to_string(),
            });
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn with_timeout_ms(self, timeout_ms: u64) -> Result<Self, ConfigError> {
        self.with_timeout(Duration::from_millis(timeout_ms))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists (for development)
        dotenvy::dotenv().ok();

        let endpoint =
            env::var(ENDPOINT_ENV).map_err(|_| ConfigError::MissingEnvVar(ENDPOINT_ENV.to_string()))?;
        let config = Self::new(&endpoint)?;

        match env::var(TIMEOUT_ENV) {
            Ok(value) => {
                let timeout_ms = Self::parse_timeout_ms(&value)?;
                config.with_timeout_ms(timeout_ms)
            }
            Err(_) => Ok(config),
        }
    }

    fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let url = Url::parse(endpoint.trim()).map_err(|e| invalid(e.to_string()))?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(invalid(format!(
                "scheme must be ws or wss, got '{}'",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(invalid("endpoint has no host".to_string()));
        }

        Ok(url)
    }

    fn parse_timeout_ms(value: &str) -> Result<u64, ConfigError> {
        value
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidTimeout {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Load configuration with helpful error messages for development
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    match ClientConfig::from_env() {
        Ok(config) => {
            log::info!(
                "Loaded sensor configuration: {} (timeout {}ms)",
                config.endpoint,
                config.timeout.as_millis()
            );
            Ok(config)
        }
        Err(ConfigError::MissingEnvVar(var)) => {
            log::error!("Missing required environment variable: {}", var);
            log::error!("Create a .env file in the project root with:");
            log::error!("{}=ws://10.42.0.118:50000", var);
            Err(ConfigError::MissingEnvVar(var))
        }
        Err(e) => {
            log::error!("Configuration error: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_endpoint_validation() {
        assert!(ClientConfig::new("ws://10.42.0.118:50000").is_ok());
        assert!(ClientConfig::new("wss://sensor.local:443").is_ok());

        assert!(ClientConfig::new("http://10.42.0.118:50000").is_err());
        assert!(ClientConfig::new("10.42.0.118:50000").is_err());
        assert!(ClientConfig::new("").is_err());
    }

    #[test]
    fn test_default_timeout() {
        let config = ClientConfig::new("ws://127.0.0.1:50000").unwrap();
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert_eq!(config.endpoint.port(), Some(50000));
    }

    #[test]
    fn test_timeout_validation() {
        let config = ClientConfig::new("ws://127.0.0.1:50000").unwrap();
        assert!(config.clone().with_timeout_ms(0).is_err());

        let config = config.with_timeout_ms(200).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(200));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var(ENDPOINT_ENV, "ws://192.168.1.20:50000");
        env::set_var(TIMEOUT_ENV, "750");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.endpoint.host_str(), Some("192.168.1.20"));
        assert_eq!(config.timeout, Duration::from_millis(750));

        env::set_var(TIMEOUT_ENV, "soon");
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::InvalidTimeout { .. })
        ));

        env::remove_var(TIMEOUT_ENV);
        env::remove_var(ENDPOINT_ENV);
    }

    #[test]
    #[serial]
    fn test_from_env_missing_endpoint() {
        env::remove_var(ENDPOINT_ENV);
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }
}
