//! Signing key provider.
//!
//! Turns the startup `SigningConfig` into the two things the token code needs:
//! - signing credentials (HMAC-SHA-256 over the shared secret) for the issuer
//! - a validation bundle (key + iss/aud/lifetime rules) for the validator
//!
//! Everything here is built once and shared read-only behind an `Arc`.

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};

use crate::config::SigningConfig;

pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Key + algorithm used to sign new tokens.
pub struct SigningCredentials<'a> {
    pub key: &'a EncodingKey,
    pub algorithm: Algorithm,
}

/// Key + rules used to accept or reject a presented token.
pub struct ValidationParameters<'a> {
    pub key: &'a DecodingKey,
    pub validation: &'a Validation,
}

pub struct SigningKeys {
    config: SigningConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("SigningKeys")
            .field("config", &self.config)
            .field("validation", &self.validation)
            .finish()
    }
}

impl SigningKeys {
    pub fn new(config: SigningConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret());
        let decoding_key = DecodingKey::from_secret(config.secret());

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // zero clock-skew tolerance
        validation.leeway = 0;

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    pub fn audience(&self) -> &str {
        &self.config.audience
    }

    pub fn expiry_minutes(&self) -> u64 {
        self.config.expiry_minutes
    }

    pub fn expiry(&self) -> Duration {
        let minutes = i64::try_from(self.config.expiry_minutes)
            .unwrap_or(i64::MAX)
            .min(Duration::MAX.num_minutes());
        Duration::minutes(minutes)
    }

    pub fn signing_credentials(&self) -> SigningCredentials<'_> {
        SigningCredentials {
            key: &self.encoding_key,
            algorithm: SIGNING_ALGORITHM,
        }
    }

    pub fn validation_parameters(&self) -> ValidationParameters<'_> {
        ValidationParameters {
            key: &self.decoding_key,
            validation: &self.validation,
        }
    }
}
