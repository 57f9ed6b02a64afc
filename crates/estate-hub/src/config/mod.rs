use crate::i18n::{BatchMode, Locale, ResolutionVerbosity, RetryPolicy};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
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
    pub i18n: I18nConfig,
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
            telemetry: TelemetryConfig {
                log_level,
                include_targets: environment == AppEnvironment::Development,
            },
            i18n: I18nConfig::from_env(environment)?,
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
    pub include_targets: bool,
}

/// Message catalog location and translator behavior.
#[derive(Debug, Clone)]
pub struct I18nConfig {
    pub locales_dir: PathBuf,
    pub default_locale: Locale,
    pub verbosity: ResolutionVerbosity,
    /// `None` disables missing-translation reporting.
    pub missing_reports: Option<MissingReportConfig>,
}

impl I18nConfig {
    fn from_env(environment: AppEnvironment) -> Result<Self, ConfigError> {
        let locales_dir =
            PathBuf::from(env::var("I18N_LOCALES_DIR").unwrap_or_else(|_| "locales".to_string()));

        let raw_locale = env::var("I18N_DEFAULT_LOCALE").unwrap_or_else(|_| "en".to_string());
        let default_locale = raw_locale
            .parse::<Locale>()
            .map_err(|_| ConfigError::InvalidLocale(raw_locale.clone()))?;

        let verbose = match env::var("I18N_VERBOSE") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                name: "I18N_VERBOSE",
                value: raw,
            })?,
            Err(_) => environment == AppEnvironment::Development,
        };
        let verbosity = if verbose {
            ResolutionVerbosity::Verbose
        } else {
            ResolutionVerbosity::Quiet
        };

        let missing_reports = match env::var("I18N_MISSING_ENDPOINT") {
            Ok(endpoint) if !endpoint.trim().is_empty() => {
                Some(MissingReportConfig::from_env(endpoint.trim().to_string())?)
            }
            _ => None,
        };

        Ok(Self {
            locales_dir,
            default_locale,
            verbosity,
            missing_reports,
        })
    }
}

/// Delivery settings for the missing-translation reporter.
#[derive(Debug, Clone)]
pub struct MissingReportConfig {
    pub endpoint: String,
    pub retry: RetryPolicy,
    pub mode: BatchMode,
}

impl MissingReportConfig {
    fn from_env(endpoint: String) -> Result<Self, ConfigError> {
        let defaults = RetryPolicy::default();

        let max_attempts = match env::var("I18N_MISSING_MAX_ATTEMPTS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|attempts| *attempts > 0)
                .ok_or(ConfigError::InvalidNumber {
                    name: "I18N_MISSING_MAX_ATTEMPTS",
                    value: raw,
                })?,
            Err(_) => defaults.max_attempts,
        };

        let base_delay = match env::var("I18N_MISSING_BASE_DELAY_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidNumber {
                    name: "I18N_MISSING_BASE_DELAY_MS",
                    value: raw,
                })?,
            Err(_) => defaults.base_delay,
        };

        let mode = match env::var("I18N_MISSING_BATCH_MODE") {
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "cumulative" | "full" => BatchMode::Cumulative,
                "delta" => BatchMode::Delta,
                _ => return Err(ConfigError::InvalidBatchMode(raw)),
            },
            Err(_) => BatchMode::default(),
        };

        Ok(Self {
            endpoint,
            retry: RetryPolicy {
                max_attempts,
                base_delay,
            },
            mode,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidLocale(String),
    InvalidFlag { name: &'static str, value: String },
    InvalidNumber { name: &'static str, value: String },
    InvalidBatchMode(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidLocale(value) => write!(
                f,
                "I18N_DEFAULT_LOCALE '{value}' is not one of the supported locales"
            ),
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be a boolean flag, found '{value}'")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a positive integer, found '{value}'")
            }
            ConfigError::InvalidBatchMode(value) => write!(
                f,
                "I18N_MISSING_BATCH_MODE must be 'cumulative' or 'delta', found '{value}'"
            ),
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
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "I18N_LOCALES_DIR",
            "I18N_DEFAULT_LOCALE",
            "I18N_VERBOSE",
            "I18N_MISSING_ENDPOINT",
            "I18N_MISSING_MAX_ATTEMPTS",
            "I18N_MISSING_BASE_DELAY_MS",
            "I18N_MISSING_BATCH_MODE",
        ] {
            env::remove_var(name);
        }
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
        assert_eq!(config.i18n.locales_dir, PathBuf::from("locales"));
        assert_eq!(config.i18n.default_locale, Locale::En);
        assert_eq!(config.i18n.verbosity, ResolutionVerbosity::Verbose);
        assert!(config.i18n.missing_reports.is_none());
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
    fn production_is_quiet_unless_overridden() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.i18n.verbosity, ResolutionVerbosity::Quiet);

        env::set_var("I18N_VERBOSE", "on");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.i18n.verbosity, ResolutionVerbosity::Verbose);
        reset_env();
    }

    #[test]
    fn missing_report_settings_are_parsed() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var(
            "I18N_MISSING_ENDPOINT",
            "http://127.0.0.1:3000/api/translations/missing/",
        );
        env::set_var("I18N_MISSING_BASE_DELAY_MS", "250");
        env::set_var("I18N_MISSING_BATCH_MODE", "delta");
        let config = AppConfig::load().expect("config loads");
        let reports = config.i18n.missing_reports.expect("reporting enabled");
        assert_eq!(reports.retry.max_attempts, 3);
        assert_eq!(reports.retry.base_delay, Duration::from_millis(250));
        assert_eq!(reports.mode, BatchMode::Delta);
        reset_env();
    }

    #[test]
    fn rejects_unknown_default_locale() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("I18N_DEFAULT_LOCALE", "klingon");
        match AppConfig::load() {
            Err(ConfigError::InvalidLocale(value)) => assert_eq!(value, "klingon"),
            other => panic!("expected invalid locale, got {other:?}"),
        }
        reset_env();
    }
}
