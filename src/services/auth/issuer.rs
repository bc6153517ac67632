use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::Header;
use tracing::{debug, error};

use crate::services::auth::claims::TokenClaims;
use crate::services::auth::identity::PermissionSet;
use crate::services::auth::signing::SigningKeys;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Issues signed bearer tokens. Stateless: nothing is persisted.
#[derive(Clone, Debug)]
pub struct TokenIssuer {
    keys: Arc<SigningKeys>,
}

impl TokenIssuer {
    pub fn new(keys: Arc<SigningKeys>) -> Self {
        Self { keys }
    }

    /// Issue a token valid from now until now + the configured expiry.
    ///
    /// - `email` is only embedded when non-blank
    /// - `permissions` are trimmed and deduplicated case-insensitively
    pub fn issue<I, S>(
        &self,
        user_id: i64,
        name: &str,
        email: Option<&str>,
        permissions: I,
    ) -> Result<String, TokenError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.issue_at(Utc::now(), user_id, name, email, permissions)
    }

    /// Same as [`issue`](Self::issue) with an explicit issuance time.
    pub fn issue_at<I, S>(
        &self,
        issued_at: DateTime<Utc>,
        user_id: i64,
        name: &str,
        email: Option<&str>,
        permissions: I,
    ) -> Result<String, TokenError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let permissions: PermissionSet = permissions.into_iter().collect();
        let now = issued_at.timestamp();
        let exp = issued_at
            .checked_add_signed(self.keys.expiry())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .timestamp();

        let claims = TokenClaims {
            sub: user_id.to_string(),
            name: name.to_string(),
            email: email
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            permission: permissions.iter().map(str::to_string).collect(),
            iss: self.keys.issuer().to_string(),
            aud: self.keys.audience().to_string(),
            iat: now,
            nbf: now,
            exp,
        };

        debug!(
            user_id,
            permissions = claims.permission.len(),
            exp,
            "Issuing access token"
        );

        let credentials = self.keys.signing_credentials();
        let header = Header::new(credentials.algorithm);
        jsonwebtoken::encode(&header, &claims, credentials.key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            TokenError::Signing(e)
        })
    }

    pub fn expiry_minutes(&self) -> u64 {
        self.keys.expiry_minutes()
    }
}
