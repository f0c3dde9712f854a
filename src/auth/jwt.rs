use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{auth::claims::Claims, config::JwtConfig, state::AppState};

#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature checks out but `exp` has passed.
    #[error("token expired")]
    Expired,
    /// Bad signature, wrong algorithm, malformed structure or missing claims.
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Signs and verifies stateless HS256 session tokens.
///
/// Keys are derived once from the configured secret; cloning is cheap enough
/// to hand one to every handler through `FromRef`.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        let minutes = cfg.ttl_minutes.max(1) as u64;
        Self::new(&cfg.secret, Duration::from_secs(minutes * 60))
    }

    pub fn issue(&self, user_id: i64, email: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, email, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        user_id: i64,
        email: &str,
        now: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            id: user_id,
            email: email.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Expiry is checked here against `now` rather than by `jsonwebtoken`,
    /// so the expired/invalid split does not depend on the library's leeway.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(TokenError::Invalid)?;

        if now.unix_timestamp() >= data.claims.exp {
            debug!(user_id = data.claims.id, "jwt expired");
            return Err(TokenError::Expired);
        }
        debug!(user_id = data.claims.id, "jwt verified");
        Ok(data.claims)
    }
}
