/*
 * Responsibility
 * - Load settings from the environment (.env is honoured in development)
 * - Validate them; a missing signing secret aborts startup
 * - Hand the auth part over as an immutable SigningConfig
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use base64::{Engine as _, engine::general_purpose::STANDARD};

pub const DEFAULT_ISSUER: &str = "AuctionApi";
pub const DEFAULT_AUDIENCE: &str = "AuctionClient";
pub const DEFAULT_EXPIRY_MINUTES: u64 = 60;

const MIN_RECOMMENDED_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(std::env::var("APP_ENV").ok().as_deref())
    }

    fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Process-wide token settings. Built once at startup and only read afterwards.
#[derive(Clone)]
pub struct SigningConfig {
    secret: Vec<u8>,
    pub issuer: String,
    pub audience: String,
    pub expiry_minutes: u64,
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print the secret
        f.debug_struct("SigningConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiry_minutes", &self.expiry_minutes)
            .finish()
    }
}

impl SigningConfig {
    /// Build from raw values, applying the documented fallbacks.
    ///
    /// Only the secret is mandatory. Blank issuer/audience and unset,
    /// unparsable or zero expiry fall back to their defaults.
    pub fn from_parts(
        secret: Option<&str>,
        issuer: Option<&str>,
        audience: Option<&str>,
        expiry_minutes: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let secret = secret
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("AUTH_SIGNING_SECRET"))?;

        let secret = match secret.strip_prefix("base64:") {
            Some(encoded) => STANDARD
                .decode(encoded.trim())
                .map_err(|_| ConfigError::Invalid("AUTH_SIGNING_SECRET"))?,
            None => secret.as_bytes().to_vec(),
        };
        if secret.is_empty() {
            return Err(ConfigError::Invalid("AUTH_SIGNING_SECRET"));
        }
        if secret.len() < MIN_RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                len = secret.len(),
                "AUTH_SIGNING_SECRET is shorter than {MIN_RECOMMENDED_SECRET_LEN} bytes"
            );
        }

        let non_blank_or = |value: Option<&str>, default: &str| {
            value
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        let expiry_minutes = expiry_minutes
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|m| *m > 0)
            .unwrap_or(DEFAULT_EXPIRY_MINUTES);

        Ok(Self {
            secret,
            issuer: non_blank_or(issuer, DEFAULT_ISSUER),
            audience: non_blank_or(audience, DEFAULT_AUDIENCE),
            expiry_minutes,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let var = |key: &str| std::env::var(key).ok();
        Self::from_parts(
            var("AUTH_SIGNING_SECRET").as_deref(),
            var("AUTH_ISSUER").as_deref(),
            var("AUTH_AUDIENCE").as_deref(),
            var("AUTH_TOKEN_EXPIRY_MINUTES").as_deref(),
        )
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub signing: SigningConfig,
    pub request_body_limit_bytes: usize,

    pub sqids_min_length: usize,
    pub sqids_alphabet: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let signing = SigningConfig::from_env()?;

        let request_body_limit_bytes = std::env::var("REQUEST_BODY_LIMIT_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        let sqids_min_length = std::env::var("SQIDS_MIN_LENGTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(10);

        let sqids_alphabet = std::env::var("SQIDS_ALPHABET").unwrap_or_else(|_| {
            "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".to_string()
        });

        Ok(Self {
            addr,
            app_env,
            signing,
            request_body_limit_bytes,
            sqids_min_length,
            sqids_alphabet,
        })
    }
}
