//! Bearer-token session auth.
//!
//! Handlers opt in by taking a `Session` parameter; routes without one
//! (health, webhook intake) skip session auth entirely.

use crate::api_error::ApiError;
use crate::server::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use desk_common::{DeskError, Role};
use std::sync::Arc;

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: String,
    pub role: Role,
}

impl Session {
    /// 403 unless the caller holds one of `roles`.
    pub fn require_any(&self, roles: &[Role]) -> Result<(), DeskError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(DeskError::Forbidden(format!(
                "role {:?} lacks permission",
                self.role
            )))
        }
    }
}

/// Pull the bearer token out of the Authorization header.
///
/// Accepts `Bearer <token>` and, for older callers, a bare token.
pub fn extract_bearer(parts: &Parts) -> Option<String> {
    let header = parts.headers.get("authorization")?;
    let value = header.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(parts).ok_or(ApiError(DeskError::Unauthorized))?;
        let api_token = state
            .config
            .resolve_token(&token)
            .ok_or(ApiError(DeskError::Unauthorized))?;
        Ok(Session {
            user: api_token.user.clone(),
            role: api_token.role,
        })
    }
}
