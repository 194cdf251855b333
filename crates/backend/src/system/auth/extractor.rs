use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use contracts::system::auth::TokenClaims;

use super::jwt;

/// Extractor for getting current user from JWT token
/// Usage in handlers: `async fn handler(CurrentUser(claims): CurrentUser) -> Response`
///
/// Claims are taken from request extensions (set by `require_auth`), otherwise
/// the `Authorization: Bearer` header is validated directly. This lets public
/// and authenticated methods share one route.
pub struct CurrentUser(pub TokenClaims);

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<TokenClaims>() {
            return Ok(CurrentUser(claims.clone()));
        }

        let token = bearer_token(parts).ok_or(StatusCode::UNAUTHORIZED)?;
        let claims = jwt::validate_token(&token)
            .await
            .map_err(|_| StatusCode::UNAUTHORIZED)?;
        parts.extensions.insert(claims.clone());
        Ok(CurrentUser(claims))
    }
}
