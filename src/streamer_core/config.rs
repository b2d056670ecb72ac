use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CHANNEL_BUFFER: usize = 100;
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub stream_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub channel_buffer: usize,
    pub max_line_bytes: usize,
    pub connect_timeout: Duration,
    pub shutdown_timeout: Duration,
    pub rust_log: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let stream_url = lookup("STREAM_URL")
            .ok_or_else(|| ConfigError::MissingVariable("STREAM_URL".to_string()))?;

        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let server_port = match lookup("SERVER_PORT") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                ConfigError::InvalidValue(format!("SERVER_PORT must be a number, got '{}'", raw))
            })?,
            None => 8080,
        };
        if !(1..=65535).contains(&server_port) {
            return Err(ConfigError::InvalidValue(format!(
                "invalid server port, must be between 1 and 65535, got {}",
                server_port
            )));
        }

        let channel_buffer = parse_or(&lookup, "STREAM_CHANNEL_BUFFER", DEFAULT_CHANNEL_BUFFER)?;
        let max_line_bytes = parse_or(&lookup, "STREAM_MAX_LINE_BYTES", DEFAULT_MAX_LINE_BYTES)?;
        let connect_timeout_secs = parse_or(
            &lookup,
            "STREAM_CONNECT_TIMEOUT_SECS",
            DEFAULT_CONNECT_TIMEOUT.as_secs(),
        )?;
        let shutdown_timeout_secs = parse_or(&lookup, "SHUTDOWN_TIMEOUT_SECS", 3u64)?;

        let rust_log = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let config = Self {
            stream_url,
            server_host,
            server_port: server_port as u16,
            channel_buffer,
            max_line_bytes,
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            shutdown_timeout: Duration::from_secs(shutdown_timeout_secs),
            rust_log,
        };
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.stream_url.starts_with("http://") && !self.stream_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "STREAM_URL must start with http:// or https://".to_string(),
            ));
        }

        if self.server_host.trim().is_empty() {
            return Err(ConfigError::InvalidValue("server host is empty".to_string()));
        }

        if self.server_port == 0 {
            return Err(ConfigError::InvalidValue(
                "invalid server port, must be between 1 and 65535, got 0".to_string(),
            ));
        }

        // tokio::sync::mpsc panics on a zero-capacity channel
        if self.channel_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "STREAM_CHANNEL_BUFFER must be at least 1".to_string(),
            ));
        }

        if self.max_line_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "STREAM_MAX_LINE_BYTES must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// `host:port` the HTTP server binds to
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(format!("{} has an invalid value: '{}'", key, raw))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<RuntimeConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RuntimeConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config_from(&[("STREAM_URL", "https://stream.example.com/stream")]).unwrap();

        assert_eq!(config.stream_url, "https://stream.example.com/stream");
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.channel_buffer, 100);
        assert_eq!(config.max_line_bytes, 65_536);
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(3));
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.server_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_custom_config() {
        let config = config_from(&[
            ("STREAM_URL", "http://localhost:9000/stream"),
            ("SERVER_HOST", "0.0.0.0"),
            ("SERVER_PORT", "3000"),
            ("STREAM_CHANNEL_BUFFER", "10"),
            ("STREAM_MAX_LINE_BYTES", "1024"),
            ("STREAM_CONNECT_TIMEOUT_SECS", "2"),
            ("SHUTDOWN_TIMEOUT_SECS", "5"),
            ("RUST_LOG", "debug"),
        ])
        .unwrap();

        assert_eq!(config.server_address(), "0.0.0.0:3000");
        assert_eq!(config.channel_buffer, 10);
        assert_eq!(config.max_line_bytes, 1024);
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.rust_log, "debug");
    }

    #[test]
    fn test_missing_stream_url() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVariable(ref v) if v == "STREAM_URL"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(config_from(&[("STREAM_URL", "ftp://example.com")]).is_err());
        assert!(config_from(&[("STREAM_URL", "http://x"), ("SERVER_PORT", "0")]).is_err());
        assert!(config_from(&[("STREAM_URL", "http://x"), ("SERVER_PORT", "70000")]).is_err());
        assert!(config_from(&[("STREAM_URL", "http://x"), ("SERVER_PORT", "abc")]).is_err());
        assert!(config_from(&[("STREAM_URL", "http://x"), ("SERVER_HOST", " ")]).is_err());
        assert!(config_from(&[("STREAM_URL", "http://x"), ("STREAM_CHANNEL_BUFFER", "0")]).is_err());
        assert!(config_from(&[("STREAM_URL", "http://x"), ("STREAM_MAX_LINE_BYTES", "-1")]).is_err());
    }

    #[test]
    fn test_from_env_reads_dotenv_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "POSTFLOW_TEST_ONLY_URL=http://dotenv.example/stream").unwrap();
        dotenv::from_path(file.path()).unwrap();

        let config = RuntimeConfig::from_lookup(|key| match key {
            "STREAM_URL" => env::var("POSTFLOW_TEST_ONLY_URL").ok(),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.stream_url, "http://dotenv.example/stream");
    }
}
