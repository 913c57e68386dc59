use crate::application::services::DEFAULT_MAX_VERSIONS;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub otel_exporter_endpoint: Option<String>,
    pub service_name: String,
    pub metrics_port: u16,
    pub max_template_versions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://traidenis.db?mode=rwc".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            otel_exporter_endpoint: None,
            service_name: "traidenis".to_string(),
            metrics_port: 9000,
            max_template_versions: DEFAULT_MAX_VERSIONS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);

        let server_host = env::var("SERVER_HOST").unwrap_or(defaults.server_host);

        let server_port = match env::var("SERVER_PORT") {
            Ok(port) => port.parse().map_err(|_| ConfigError::InvalidPort)?,
            Err(_) => defaults.server_port,
        };

        let otel_exporter_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();

        let service_name = env::var("SERVICE_NAME").unwrap_or(defaults.service_name);

        let metrics_port = env::var("METRICS_PORT")
            .ok()
            .and_then(|port| port.parse().ok())
            .unwrap_or(defaults.metrics_port);

        let max_template_versions = match env::var("TEMPLATE_MAX_VERSIONS") {
            Ok(value) => parse_version_limit(&value)?,
            Err(_) => defaults.max_template_versions,
        };

        Ok(Config {
            database_url,
            server_host,
            server_port,
            otel_exporter_endpoint,
            service_name,
            metrics_port,
            max_template_versions,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_version_limit(value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(ConfigError::InvalidVersionLimit(value.to_string())),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid TEMPLATE_MAX_VERSIONS value: {0}")]
    InvalidVersionLimit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_template_versions, 30);
        assert_eq!(config.server_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_parse_version_limit() {
        assert_eq!(parse_version_limit("30").unwrap(), 30);
        assert_eq!(parse_version_limit(" 5 ").unwrap(), 5);
        assert!(matches!(
            parse_version_limit("0"),
            Err(ConfigError::InvalidVersionLimit(_))
        ));
        assert!(parse_version_limit("many").is_err());
    }
}
