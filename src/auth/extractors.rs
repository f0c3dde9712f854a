use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::{debug, warn};

use super::jwt::{TokenError, TokenService};
use crate::error::ApiError;

pub const NO_TOKEN: &str = "Access denied. No token provided.";
pub const INVALID_TOKEN: &str = "Invalid token. Please login again.";
pub const EXPIRED_TOKEN: &str = "Token has expired. Please login again.";

/// Identity taken from a verified session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

/// Optional variant: `None` for anonymous callers and for bad tokens alike.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

/// Token from `Authorization: Bearer <token>`, if there is one.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// The gate both extractors share: identity, or the rejection to send.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<AuthUser, ApiError> {
    let token =
        bearer_token(headers).ok_or_else(|| ApiError::Unauthorized(NO_TOKEN.into()))?;

    match tokens.verify(token) {
        Ok(claims) => Ok(AuthUser {
            id: claims.id,
            email: claims.email,
        }),
        Err(TokenError::Expired) => {
            warn!("expired token");
            Err(ApiError::Unauthorized(EXPIRED_TOKEN.into()))
        }
        Err(e) => {
            warn!(error = %e, "invalid token");
            Err(ApiError::Unauthorized(INVALID_TOKEN.into()))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenService::from_ref(state);
        authenticate(&parts.headers, &tokens)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = TokenService::from_ref(state);
        match authenticate(&parts.headers, &tokens) {
            Ok(user) => Ok(MaybeAuthUser(Some(user))),
            Err(e) => {
                debug!(reason = %e, "optional auth: continuing anonymously");
                Ok(MaybeAuthUser(None))
            }
        }
    }
}
