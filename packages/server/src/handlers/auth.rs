use axum::http::StatusCode;
use axum::{Json, extract::State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{role_permission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, LoginResponse, ProfileResponse, RefreshRequest, RefreshResponse,
    validate_login_request,
};
use crate::state::AppState;
use crate::utils::jwt::{self, TokenKind, TokenSubject};
use crate::utils::hash;

async fn permissions_of(db: &DatabaseConnection, role: &str) -> Result<Vec<String>, DbErr> {
    let rows = role_permission::Entity::find()
        .filter(role_permission::Column::Role.eq(role))
        .order_by_asc(role_permission::Column::Permission)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|rp| rp.permission).collect())
}

/// Sign an access token and a refresh token for `user`.
fn issue_tokens(
    state: &AppState,
    user: &user::Model,
    permissions: &[String],
) -> Result<(String, String), AppError> {
    let subject = TokenSubject {
        user_id: user.id,
        username: &user.username,
        role: &user.role,
        permissions,
    };
    let auth = &state.config.auth;
    let sign = |kind, ttl| {
        jwt::sign(&subject, kind, &auth.jwt_secret, ttl)
            .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))
    };
    Ok((
        sign(TokenKind::Access, auth.access_ttl_hours)?,
        sign(TokenKind::Refresh, auth.refresh_ttl_hours)?,
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in with username and password",
    description = "Returns an access token, a refresh token, and the caller's role and permissions. Inactive accounts cannot log in.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let username = payload.username.trim();

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid || !user.is_active {
        return Err(AppError::InvalidCredentials);
    }

    let permissions = permissions_of(&state.db, &user.role).await?;
    let (token, refresh_token) = issue_tokens(&state, &user, &permissions)?;

    Ok(Json(LoginResponse {
        token,
        refresh_token,
        username: user.username,
        role: user.role,
        permissions,
    }))
}

#[utoipa::path(
    post,
    path = "/refresh",
    tag = "Auth",
    operation_id = "refreshToken",
    summary = "Exchange a refresh token for new tokens",
    description = "Role and permissions are re-read from the database, so changes take effect on refresh.",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens refreshed", body = RefreshResponse),
        (status = 401, description = "Invalid refresh token (TOKEN_INVALID)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let claims = jwt::verify(&payload.refresh_token, &state.config.auth.jwt_secret)
        .map_err(|_| AppError::TokenInvalid)?;
    if claims.kind != TokenKind::Refresh {
        return Err(AppError::TokenInvalid);
    }

    let user = user::Entity::find_by_id(claims.uid)
        .one(&state.db)
        .await?
        .filter(|u| u.is_active)
        .ok_or(AppError::TokenInvalid)?;

    let permissions = permissions_of(&state.db, &user.role).await?;
    let (token, refresh_token) = issue_tokens(&state, &user, &permissions)?;

    Ok(Json(RefreshResponse {
        token,
        refresh_token,
    }))
}

#[utoipa::path(
    get,
    path = "/profile",
    tag = "Auth",
    operation_id = "getProfile",
    summary = "Get current user info",
    responses(
        (status = 200, description = "Current user", body = ProfileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user), fields(user_id = auth_user.user_id))]
pub async fn profile(auth_user: AuthUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        id: auth_user.user_id,
        username: auth_user.username,
        role: auth_user.role,
        permissions: auth_user.permissions,
    })
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Log out",
    description = "Tokens are stateless and stay valid until they expire; the client discards them. Always succeeds for an authenticated caller.",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user), fields(user_id = auth_user.user_id))]
pub async fn logout(auth_user: AuthUser) -> StatusCode {
    tracing::info!(user_id = auth_user.user_id, "User logged out");
    StatusCode::NO_CONTENT
}
