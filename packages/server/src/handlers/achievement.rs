use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::achievement::*;
use crate::records::ListQuery;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Achievements",
    operation_id = "createAchievement",
    summary = "Create a draft achievement",
    description = "Stores the content in the document store, then a `draft` reference owned by the caller's student profile. Requires `achievement:create` permission.",
    request_body = CreateAchievementRequest,
    responses(
        (status = 201, description = "Achievement created", body = AchievementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Caller has no student profile (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Store unavailable (STORE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateAchievementRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("achievement:create")?;
    let caller = auth_user.caller()?;

    let created = state.records.create(&caller, payload.into()).await?;

    Ok((StatusCode::CREATED, Json(AchievementResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Achievements",
    operation_id = "listAchievements",
    summary = "List achievements in the caller's scope",
    description = "Students see their own achievements, advisors those of their advisees, admins all. Newest first. Requires `achievement:read` permission.",
    params(AchievementListQuery),
    responses(
        (status = 200, description = "Page of achievements", body = AchievementListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 503, description = "Store unavailable (STORE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_achievements(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AchievementListQuery>,
) -> Result<Json<AchievementListResponse>, AppError> {
    auth_user.require_permission("achievement:read")?;
    let caller = auth_user.caller()?;

    let page = state
        .records
        .list(
            &caller,
            ListQuery {
                status: query.status,
                page: query.page,
                page_size: query.page_size,
            },
        )
        .await?;

    Ok(Json(page.into()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Achievements",
    operation_id = "getAchievement",
    summary = "Get an achievement by ID",
    description = "Requires `achievement:read` permission and the owner to be in the caller's scope.",
    params(("id" = i32, Path, description = "Achievement ID")),
    responses(
        (status = 200, description = "Achievement", body = AchievementResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Out of scope (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Content missing (DATA_INTEGRITY)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AchievementResponse>, AppError> {
    auth_user.require_permission("achievement:read")?;
    let caller = auth_user.caller()?;

    let achievement = state.records.get(&caller, id).await?;
    Ok(Json(achievement.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Achievements",
    operation_id = "updateAchievement",
    summary = "Update achievement content",
    description = "Owner only, while `draft` or `rejected`. The achievement type cannot change. Requires `achievement:update` permission.",
    params(("id" = i32, Path, description = "Achievement ID")),
    request_body = UpdateAchievementRequest,
    responses(
        (status = 200, description = "Updated achievement", body = AchievementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Status does not allow editing (INVALID_STATE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateAchievementRequest>,
) -> Result<Json<AchievementResponse>, AppError> {
    auth_user.require_permission("achievement:update")?;
    let caller = auth_user.caller()?;

    let updated = state.records.update(&caller, id, payload.into()).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Achievements",
    operation_id = "deleteAchievement",
    summary = "Delete a draft achievement",
    description = "Owner only, `draft` only. Removes the content, then the reference. Requires `achievement:delete` permission.",
    params(("id" = i32, Path, description = "Achievement ID")),
    responses(
        (status = 204, description = "Achievement deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Not a draft (INVALID_STATE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_permission("achievement:delete")?;
    let caller = auth_user.caller()?;

    state.records.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/submit",
    tag = "Achievements",
    operation_id = "submitAchievement",
    summary = "Submit an achievement for review",
    description = "Owner only, from `draft` or `rejected`. Clears any earlier verifier and rejection note. Requires `achievement:update` permission.",
    params(("id" = i32, Path, description = "Achievement ID")),
    responses(
        (status = 200, description = "Submitted", body = ReferenceResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Status does not allow submission (INVALID_STATE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn submit_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ReferenceResponse>, AppError> {
    auth_user.require_permission("achievement:update")?;
    let caller = auth_user.caller()?;

    let reference = state.records.submit(&caller, id).await?;
    Ok(Json(reference.into()))
}

#[utoipa::path(
    post,
    path = "/{id}/verify",
    tag = "Achievements",
    operation_id = "verifyAchievement",
    summary = "Verify or reject a submitted achievement",
    description = "Advisors may review their advisees' achievements, admins any. Only from `submitted`. Requires `achievement:verify` permission.",
    params(("id" = i32, Path, description = "Achievement ID")),
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Reviewed", body = ReferenceResponse),
        (status = 400, description = "Unknown action (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Out of scope (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Not submitted (INVALID_STATE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, action = %payload.action))]
pub async fn verify_achievement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<VerifyRequest>,
) -> Result<Json<ReferenceResponse>, AppError> {
    auth_user.require_permission("achievement:verify")?;
    let caller = auth_user.caller()?;

    let reference = state
        .records
        .verify(&caller, id, &payload.action, payload.note)
        .await?;
    Ok(Json(reference.into()))
}

#[utoipa::path(
    post,
    path = "/{id}/attachments",
    tag = "Achievements",
    operation_id = "addAttachment",
    summary = "Attach a file descriptor",
    description = "Owner only, while `draft` or `rejected`. The upload time is stamped by the server. Requires `achievement:update` permission.",
    params(("id" = i32, Path, description = "Achievement ID")),
    request_body = AttachmentRequest,
    responses(
        (status = 201, description = "Attachment added", body = AttachmentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Status does not allow editing (INVALID_STATE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn add_attachment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<AttachmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("achievement:update")?;
    let caller = auth_user.caller()?;

    let attachment = state.records.attach(&caller, id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(AttachmentResponse::from(attachment))))
}
