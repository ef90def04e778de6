use chrono::Weekday;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::workflows::performance::ReportSettings;

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
    pub reports: ReportConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            reports: ReportConfig::from_env()?,
        })
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Report generation limits and the organization's week boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub max_concurrency: usize,
    pub timeout: Duration,
    pub top_performers: usize,
    pub week_start: Weekday,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let settings = ReportSettings::default();
        Self {
            max_concurrency: settings.max_concurrency,
            timeout: settings.timeout,
            top_performers: settings.top_performers,
            week_start: settings.week_start,
        }
    }
}

impl ReportConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let max_concurrency = positive_var("REPORT_MAX_CONCURRENCY", defaults.max_concurrency)?;
        let timeout_secs =
            positive_var("REPORT_TIMEOUT_SECS", defaults.timeout.as_secs() as usize)?;
        let top_performers = positive_var("REPORT_TOP_PERFORMERS", defaults.top_performers)?;
        let week_start = match env::var("REPORT_WEEK_START") {
            Ok(value) => value
                .trim()
                .parse::<Weekday>()
                .map_err(|_| ConfigError::InvalidWeekday { value })?,
            Err(_) => defaults.week_start,
        };

        Ok(Self {
            max_concurrency,
            timeout: Duration::from_secs(timeout_secs as u64),
            top_performers,
            week_start,
        })
    }

    /// Generator settings with the configured limits and default issue thresholds.
    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            top_performers: self.top_performers,
            max_concurrency: self.max_concurrency,
            timeout: self.timeout,
            week_start: self.week_start,
            ..ReportSettings::default()
        }
    }
}

fn positive_var(key: &'static str, default: usize) -> Result<usize, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber { key, value: raw }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
    InvalidWeekday { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive integer (got '{value}')")
            }
            ConfigError::InvalidWeekday { value } => {
                write!(f, "REPORT_WEEK_START must name a weekday (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidWeekday { .. } => None,
        }
    }
}
