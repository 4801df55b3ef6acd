use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
    pub model: ModelConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let join_timeout_seconds = parse_env_u32("ENGINE_JOIN_TIMEOUT_SECONDS", 15)?;
        let engine = EngineConfig {
            technical_cutoff: parse_env_f64("ENGINE_TECHNICAL_CUTOFF", 70.0)?,
            min_round_answers: parse_env_u32("ENGINE_MIN_ROUND_ANSWERS", 3)? as usize,
            technical_time_fraction: parse_env_f64("ENGINE_TECHNICAL_TIME_FRACTION", 0.6)?,
            default_duration_minutes: parse_env_u32("ENGINE_DEFAULT_DURATION_MINUTES", 30)?,
            join_timeout: Duration::from_secs(u64::from(join_timeout_seconds)),
        };

        let model = ModelConfig {
            base_url: env::var("MODEL_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model_name: env::var("MODEL_NAME").unwrap_or_else(|_| "llama3".to_string()),
            request_timeout: Duration::from_secs(parse_env_u32(
                "MODEL_REQUEST_TIMEOUT_SECONDS",
                120,
            )? as u64),
            connect_timeout: Duration::from_secs(parse_env_u32(
                "MODEL_CONNECT_TIMEOUT_SECONDS",
                10,
            )? as u64),
            max_connections: parse_env_u32("MODEL_MAX_CONNECTIONS", 10)? as usize,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            engine,
            model,
        })
    }
}

fn parse_env_u32(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

fn parse_env_f64(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Session-engine thresholds governing round transitions and the bounded join.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub technical_cutoff: f64,
    pub min_round_answers: usize,
    pub technical_time_fraction: f64,
    pub default_duration_minutes: u32,
    pub join_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            technical_cutoff: 70.0,
            min_round_answers: 3,
            technical_time_fraction: 0.6,
            default_duration_minutes: 30,
            join_timeout: Duration::from_secs(15),
        }
    }
}

/// Connection settings for the language-model backend.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub model_name: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_connections: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model_name: "llama3".to_string(),
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            max_connections: 10,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must parse to a non-negative number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("ENGINE_TECHNICAL_CUTOFF");
        env::remove_var("ENGINE_JOIN_TIMEOUT_SECONDS");
        env::remove_var("MODEL_BASE_URL");
        env::remove_var("MODEL_MAX_CONNECTIONS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.engine.technical_cutoff, 70.0);
        assert_eq!(config.engine.min_round_answers, 3);
        assert_eq!(config.engine.join_timeout, Duration::from_secs(15));
        assert_eq!(config.model.base_url, "http://localhost:11434");
        assert_eq!(config.model.max_connections, 10);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn rejects_malformed_engine_numbers() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ENGINE_JOIN_TIMEOUT_SECONDS", "soon");
        let result = AppConfig::load();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber {
                key: "ENGINE_JOIN_TIMEOUT_SECONDS"
            })
        ));
        env::remove_var("ENGINE_JOIN_TIMEOUT_SECONDS");
    }
}
