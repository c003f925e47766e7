use axum::{extract::FromRequestParts, http::request::Parts};
use common::Role;

use crate::error::AppError;
use crate::records::Caller;
use crate::state::AppState;
use crate::utils::jwt::{self, TokenKind};

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
/// Permission checks happen via `require_permission()` in the handler body.
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: String,
    pub permissions: Vec<String>,
}

impl AuthUser {
    /// Returns `Ok(())` if the user has the given permission, `Err(PermissionDenied)` otherwise.
    pub fn require_permission(&self, permission: &str) -> Result<(), AppError> {
        if self.permissions.iter().any(|p| p == permission) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// The caller's role. Role names outside the known set are denied.
    pub fn role(&self) -> Result<Role, AppError> {
        self.role.parse().map_err(|e| {
            tracing::warn!(user_id = self.user_id, "{e}");
            AppError::PermissionDenied
        })
    }

    /// Identity handed to the record service.
    pub fn caller(&self) -> Result<Caller, AppError> {
        Ok(Caller {
            user_id: self.user_id,
            role: self.role()?,
        })
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        if claims.kind != TokenKind::Access {
            return Err(AppError::TokenInvalid);
        }

        Ok(AuthUser {
            user_id: claims.uid,
            username: claims.sub,
            role: claims.role,
            permissions: claims.permissions,
        })
    }
}
