//! Runtime configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default path to webhook TLS certificate
pub const WEBHOOK_CERT_PATH: &str = "/etc/webhook/certs/tls.crt";
/// Default path to webhook TLS private key
pub const WEBHOOK_KEY_PATH: &str = "/etc/webhook/certs/tls.key";
/// Default webhook server port
pub const WEBHOOK_PORT: u16 = 9443;
/// Default health server port
pub const HEALTH_PORT: u16 = 8080;
/// Default bound on a single object store read
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
/// Default `timeoutSeconds` the API server applies to a webhook call.
///
/// A fetch timeout at or above this never reaches the caller: the API server
/// gives up first and applies the webhook's failurePolicy instead.
pub const API_SERVER_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while reading configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Webhook configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Port for the TLS admission endpoint
    pub webhook_port: u16,
    /// Port for probes and metrics
    pub health_port: u16,
    /// TLS certificate (PEM)
    pub cert_path: PathBuf,
    /// TLS private key (PEM)
    pub key_path: PathBuf,
    /// Bound on each object store read made while evaluating a request
    pub fetch_timeout: Duration,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            webhook_port: WEBHOOK_PORT,
            health_port: HEALTH_PORT,
            cert_path: PathBuf::from(WEBHOOK_CERT_PATH),
            key_path: PathBuf::from(WEBHOOK_KEY_PATH),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl WebhookConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for unset variables.
    ///
    /// Recognized variables: `WEBHOOK_PORT`, `HEALTH_PORT`, `WEBHOOK_CERT_PATH`,
    /// `WEBHOOK_KEY_PATH`, `FETCH_TIMEOUT`. The timeout takes a duration
    /// such as `5s` or `750ms`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let webhook_port = match lookup("WEBHOOK_PORT") {
            Some(v) => parse_port("WEBHOOK_PORT", v)?,
            None => defaults.webhook_port,
        };
        let health_port = match lookup("HEALTH_PORT") {
            Some(v) => parse_port("HEALTH_PORT", v)?,
            None => defaults.health_port,
        };
        let fetch_timeout = match lookup("FETCH_TIMEOUT") {
            Some(v) => parse_timeout("FETCH_TIMEOUT", v)?,
            None => defaults.fetch_timeout,
        };

        Ok(Self {
            webhook_port,
            health_port,
            cert_path: lookup("WEBHOOK_CERT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.cert_path),
            key_path: lookup("WEBHOOK_KEY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.key_path),
            fetch_timeout,
        })
    }
}

fn parse_port(name: &'static str, value: String) -> Result<u16, ConfigError> {
    match value.trim().parse::<u16>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            name,
            value,
            reason: "port must be non-zero".to_string(),
        }),
        Ok(port) => Ok(port),
        Err(e) => Err(ConfigError::InvalidValue {
            name,
            value,
            reason: e.to_string(),
        }),
    }
}

fn parse_timeout(name: &'static str, value: String) -> Result<Duration, ConfigError> {
    match humantime::parse_duration(value.trim()) {
        Ok(timeout) if timeout.is_zero() => Err(ConfigError::InvalidValue {
            name,
            value,
            reason: "timeout must be non-zero".to_string(),
        }),
        Ok(timeout) => Ok(timeout),
        Err(e) => Err(ConfigError::InvalidValue {
            name,
            value,
            reason: e.to_string(),
        }),
    }
}
