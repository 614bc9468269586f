//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

/// Header carrying the authenticated user's id, set by the upstream auth layer.
pub const USER_ID_HEADER: &str = "X-User-ID";

/// The user performing a mutating request.
///
/// The id is opaque here; authentication happens before the request
/// reaches this service. Checkout records it as the cashier, purchases
/// as the creator.
#[derive(Debug, Clone)]
pub struct ActingUser(pub String);

impl ActingUser {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthorized(format!("Missing {USER_ID_HEADER} header")))?;

        tracing::Span::current().record("user_id", user_id);

        Ok(ActingUser(user_id.to_string()))
    }
}
