use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::reports::admission::{AdmissionPolicy, DayBoundary};

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
    pub reporting: ReportingConfig,
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

        let reporting = ReportingConfig::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            reporting,
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

/// Knobs for the submission admission policy.
///
/// The day boundary is an explicit choice because the cap is computed against
/// calendar days, not a rolling window: `local` matches the behavior of a
/// single-region deployment with local midnight resets, `utc` pins the reset
/// to a fixed instant worldwide.
#[derive(Debug, Clone)]
pub struct ReportingConfig {
    pub daily_cap: u32,
    pub cooldown_hours: i64,
    pub day_boundary: DayBoundary,
}

impl ReportingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let daily_cap = env::var("REPORT_DAILY_CAP")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidDailyCap)?;

        let cooldown_hours = env::var("REPORT_COOLDOWN_HOURS")
            .unwrap_or_else(|_| "8".to_string())
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidCooldown)?;
        if cooldown_hours < 0 {
            return Err(ConfigError::InvalidCooldown);
        }

        let day_boundary = match env::var("REPORT_DAY_BOUNDARY")
            .unwrap_or_else(|_| "local".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "local" => DayBoundary::Local,
            "utc" => DayBoundary::Utc,
            other => {
                return Err(ConfigError::InvalidDayBoundary {
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            daily_cap,
            cooldown_hours,
            day_boundary,
        })
    }

    pub fn admission_policy(&self) -> AdmissionPolicy {
        AdmissionPolicy::new(
            self.daily_cap,
            chrono::Duration::hours(self.cooldown_hours),
            self.day_boundary,
        )
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDailyCap,
    InvalidCooldown,
    InvalidDayBoundary { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDailyCap => {
                write!(f, "REPORT_DAILY_CAP must be a non-negative integer")
            }
            ConfigError::InvalidCooldown => {
                write!(f, "REPORT_COOLDOWN_HOURS must be a non-negative integer")
            }
            ConfigError::InvalidDayBoundary { value } => {
                write!(f, "REPORT_DAY_BOUNDARY must be 'local' or 'utc', got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
