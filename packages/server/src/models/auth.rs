use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Username of the account to log into.
    #[schema(example = "alice_wonder")]
    pub username: String,
    /// Account password.
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Access token for the `Authorization: Bearer` header.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    /// Token accepted only by `/auth/refresh`.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,
    #[schema(example = "alice_wonder")]
    pub username: String,
    /// One of `student`, `advisor`, `admin`.
    #[schema(example = "student")]
    pub role: String,
    #[schema(example = json!(["achievement:create", "achievement:read"]))]
    pub permissions: Vec<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RefreshResponse {
    /// Fresh access token.
    pub token: String,
    /// Replacement refresh token.
    pub refresh_token: String,
}

/// Current authenticated user's identity, as carried by the token.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProfileResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = "student")]
    pub role: String,
    #[schema(example = json!(["achievement:create", "achievement:read"]))]
    pub permissions: Vec<String>,
}
