use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use super::{claims::TokenKind, jwt::JwtKeys};
use crate::{error::ApiError, state::AppState};

/// Extracts and validates the access token, returning the user ID. Rejects
/// the request when the header is missing or the token is not valid.
pub struct AuthUser(pub Uuid);

/// Same, but a missing Authorization header means an anonymous caller
/// instead of a rejection. A header that is present but invalid is still
/// rejected so clients notice expired tokens.
pub struct MaybeAuthUser(pub Option<Uuid>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
}

fn verify_access(keys: &JwtKeys, token: &str) -> Result<Uuid, ApiError> {
    let claims = keys.verify(token).map_err(|_| ApiError::Unauthorized)?;
    if claims.kind != TokenKind::Access {
        return Err(ApiError::Unauthorized);
    }
    Ok(claims.sub)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;
        let keys = JwtKeys::from_ref(state);
        Ok(AuthUser(verify_access(&keys, token)?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            None => Ok(MaybeAuthUser(None)),
            Some(token) => {
                let keys = JwtKeys::from_ref(state);
                Ok(MaybeAuthUser(Some(verify_access(&keys, token)?)))
            }
        }
    }
}
