use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
};
use tracing::warn;
use uuid::Uuid;

use super::claims::verify_access_token;
use crate::state::AppState;

/// Requires a valid bearer token; yields the user ID.
pub struct AuthUser(pub Uuid);

/// Anonymous when no Authorization header is sent; a bad token is still
/// rejected.
pub struct MaybeAuthUser(pub Option<Uuid>);

fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, (StatusCode, String)> {
    let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let auth = auth
        .to_str()
        .map_err(|_| (StatusCode::UNAUTHORIZED, "invalid Authorization header".to_string()))?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .map(Some)
        .ok_or((StatusCode::UNAUTHORIZED, "invalid auth scheme".to_string()))
}

fn user_from_headers(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<Option<Uuid>, (StatusCode, String)> {
    let Some(token) = bearer_token(headers)? else {
        return Ok(None);
    };
    match verify_access_token(&state.config.jwt, token) {
        Ok(claims) => Ok(Some(claims.sub)),
        Err(e) => {
            warn!(error = %e, "invalid or expired token");
            Err((
                StatusCode::UNAUTHORIZED,
                "invalid or expired token".to_string(),
            ))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_from_headers(&parts.headers, state)?
            .map(AuthUser)
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "missing Authorization header".to_string(),
            ))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_from_headers(&parts.headers, state).map(MaybeAuthUser)
    }
}
