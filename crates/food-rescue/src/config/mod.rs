use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::allocation::{IntakeConfig, RecommendationConfig};

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
    pub allocation: AllocationConfig,
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
            allocation: AllocationConfig::from_env()?,
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

/// Tunables for the recommendation passes and donation intake.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationConfig {
    pub recommendation: RecommendationConfig,
    pub intake: IntakeConfig,
}

impl AllocationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let recommendation = RecommendationConfig {
            expiry_window_days: day_window(
                "MATCH_EXPIRY_WINDOW_DAYS",
                defaults.recommendation.expiry_window_days,
            )?,
            max_candidates: env_or(
                "MATCH_MAX_CANDIDATES",
                defaults.recommendation.max_candidates,
            )?,
            abundance_threshold: env_or(
                "MATCH_ABUNDANCE_THRESHOLD",
                defaults.recommendation.abundance_threshold,
            )?,
            abundance_cap: env_or("MATCH_ABUNDANCE_CAP", defaults.recommendation.abundance_cap)?,
        };

        let intake = IntakeConfig {
            default_shelf_life_days: day_window(
                "INTAKE_DEFAULT_SHELF_LIFE_DAYS",
                defaults.intake.default_shelf_life_days,
            )?,
            low_stock_threshold: env_or("LOW_STOCK_THRESHOLD", defaults.intake.low_stock_threshold)?,
        };

        Ok(Self {
            recommendation,
            intake,
        })
    }
}

/// Longest expiry window or shelf life accepted from the environment.
pub const MAX_DAY_WINDOW: i64 = 36_500;

fn day_window(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    let days = env_or(key, default)?;
    if days < 0 {
        return Err(ConfigError::InvalidNumber { key });
    }
    if days > MAX_DAY_WINDOW {
        return Err(ConfigError::DayWindowTooLong {
            key,
            max: MAX_DAY_WINDOW,
        });
    }
    Ok(days)
}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
    DayWindowTooLong { key: &'static str, max: i64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
            ConfigError::DayWindowTooLong { key, max } => {
                write!(f, "{key} must be at most {max} days")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::DayWindowTooLong { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
