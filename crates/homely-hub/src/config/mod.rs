use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const MAX_SERVICE_FEE_BPS: u32 = 10_000;

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
    pub booking: BookingPolicyConfig,
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
            booking: BookingPolicyConfig::from_env()?,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Operator-tunable booking rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingPolicyConfig {
    /// New requests land in `confirmed` instead of waiting for the host.
    pub auto_confirm: bool,
    /// Guests and hosts may only cancel a confirmed stay before check-in.
    pub enforce_cancellation_cutoff: bool,
    /// Service fee in basis points of the nightly subtotal.
    pub service_fee_bps: u32,
    pub completion_sweep_interval: Duration,
}

impl Default for BookingPolicyConfig {
    fn default() -> Self {
        Self {
            auto_confirm: false,
            enforce_cancellation_cutoff: true,
            service_fee_bps: 1_000,
            completion_sweep_interval: Duration::from_secs(3_600),
        }
    }
}

impl BookingPolicyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let auto_confirm = read_flag("BOOKING_AUTO_CONFIRM", defaults.auto_confirm)?;
        let enforce_cancellation_cutoff = read_flag(
            "BOOKING_CANCELLATION_CUTOFF",
            defaults.enforce_cancellation_cutoff,
        )?;

        let service_fee_bps = match env::var("BOOKING_SERVICE_FEE_BPS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|bps| *bps <= MAX_SERVICE_FEE_BPS)
                .ok_or(ConfigError::InvalidNumber {
                    variable: "BOOKING_SERVICE_FEE_BPS",
                })?,
            Err(_) => defaults.service_fee_bps,
        };

        let completion_sweep_interval = match env::var("BOOKING_SWEEP_INTERVAL_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidNumber {
                    variable: "BOOKING_SWEEP_INTERVAL_SECS",
                })?,
            Err(_) => defaults.completion_sweep_interval,
        };

        Ok(Self {
            auto_confirm,
            enforce_cancellation_cutoff,
            service_fee_bps,
            completion_sweep_interval,
        })
    }
}

fn read_flag(variable: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = env::var(variable) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { variable }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { variable: &'static str },
    InvalidNumber { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { variable } => {
                write!(f, "{variable} must be one of true/false/1/0/yes/no/on/off")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} is not a valid number for this setting")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InvalidNumber { .. } => None,
        }
    }
}
