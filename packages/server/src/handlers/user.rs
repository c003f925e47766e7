use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::Role;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{lecturer, student, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::shared::Pagination;
use crate::models::user::*;
use crate::state::AppState;
use crate::utils::hash;

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

async fn ensure_lecturer_exists<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    lecturer::Entity::find_by_id(id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("Lecturer {id} not found")))
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

/// Student and lecturer profile ids, keyed by user id.
async fn profiles_of<C: ConnectionTrait>(
    db: &C,
    user_ids: &[i32],
) -> Result<(HashMap<i32, i32>, HashMap<i32, i32>), DbErr> {
    let students: Vec<(i32, i32)> = student::Entity::find()
        .select_only()
        .column(student::Column::UserId)
        .column(student::Column::Id)
        .filter(student::Column::UserId.is_in(user_ids.to_vec()))
        .into_tuple()
        .all(db)
        .await?;
    let lecturers: Vec<(i32, i32)> = lecturer::Entity::find()
        .select_only()
        .column(lecturer::Column::UserId)
        .column(lecturer::Column::Id)
        .filter(lecturer::Column::UserId.is_in(user_ids.to_vec()))
        .into_tuple()
        .all(db)
        .await?;
    Ok((
        students.into_iter().collect(),
        lecturers.into_iter().collect(),
    ))
}

async fn user_response<C: ConnectionTrait>(
    db: &C,
    user: user::Model,
) -> Result<UserResponse, AppError> {
    let (students, lecturers) = profiles_of(db, &[user.id]).await?;
    let (student_id, lecturer_id) = (
        students.get(&user.id).copied(),
        lecturers.get(&user.id).copied(),
    );
    Ok(UserResponse::new(user, student_id, lecturer_id))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create a user with its role profile",
    description = "Creates the account and, for `student` and `advisor` roles, the matching student or lecturer profile in one transaction. Requires `user:manage` permission.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Advisor lecturer not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Username or email taken (USERNAME_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(username = %payload.username, role = %payload.role))]
pub async fn create_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("user:manage")?;
    validate_create_user(&payload)?;

    let password = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let txn = state.db.begin().await?;
    let now = chrono::Utc::now();

    let new_user = user::ActiveModel {
        username: Set(payload.username.trim().to_string()),
        email: Set(payload.email.trim().to_string()),
        password: Set(password),
        full_name: Set(payload.full_name.trim().to_string()),
        role: Set(payload.role.as_str().to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let user = new_user.insert(&txn).await.map_err(|e| {
        if is_unique_violation(&e) {
            AppError::UsernameTaken
        } else {
            AppError::from(e)
        }
    })?;

    let (mut student_id, mut lecturer_id) = (None, None);
    match payload.role {
        Role::Student => {
            if let Some(advisor_id) = payload.advisor_id {
                ensure_lecturer_exists(&txn, advisor_id).await?;
            }
            let profile = student::ActiveModel {
                user_id: Set(user.id),
                student_number: Set(trimmed(payload.student_number).unwrap_or_default()),
                program_study: Set(trimmed(payload.program_study)),
                academic_year: Set(trimmed(payload.academic_year)),
                advisor_id: Set(payload.advisor_id),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Validation("Student number is already registered".into())
                } else {
                    AppError::from(e)
                }
            })?;
            student_id = Some(profile.id);
        }
        Role::Advisor => {
            let profile = lecturer::ActiveModel {
                user_id: Set(user.id),
                lecturer_number: Set(trimmed(payload.lecturer_number).unwrap_or_default()),
                department: Set(trimmed(payload.department)),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Validation("Lecturer number is already registered".into())
                } else {
                    AppError::from(e)
                }
            })?;
            lecturer_id = Some(profile.id);
        }
        Role::Admin => {}
    }

    txn.commit().await?;
    tracing::info!(user_id = user.id, "Created user");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::new(user, student_id, lecturer_id)),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users",
    description = "Newest first, inactive accounts included. Requires `user:manage` permission.",
    params(UserListQuery),
    responses(
        (status = 200, description = "Page of users", body = UserListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    auth_user.require_permission("user:manage")?;

    let limits = &state.config.records;
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let page_size = query
        .page_size
        .unwrap_or(limits.default_page_size)
        .clamp(1, Ord::max(limits.max_page_size, 1));

    let total_items = user::Entity::find().count(&state.db).await?;
    let users = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .offset(Some((page - 1).saturating_mul(page_size)))
        .limit(Some(page_size))
        .all(&state.db)
        .await?;

    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    let (students, lecturers) = profiles_of(&state.db, &ids).await?;
    let data = users
        .into_iter()
        .map(|u| {
            let (student_id, lecturer_id) =
                (students.get(&u.id).copied(), lecturers.get(&u.id).copied());
            UserResponse::new(u, student_id, lecturer_id)
        })
        .collect();

    Ok(Json(UserListResponse {
        data,
        pagination: Pagination {
            page,
            page_size,
            total_items,
            total_pages: total_items.div_ceil(page_size),
        },
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user by ID",
    description = "Requires `user:manage` permission.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_permission("user:manage")?;

    let user = find_user(&state.db, id).await?;
    Ok(Json(user_response(&state.db, user).await?))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user",
    description = "Changes email, full name, or the active flag. Username, password, and role are fixed. Requires `user:manage` permission.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Email taken (USERNAME_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, is_active = ?payload.is_active))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_permission("user:manage")?;
    validate_update_user(&payload)?;

    if payload == UpdateUserRequest::default() {
        let existing = find_user(&state.db, id).await?;
        return Ok(Json(user_response(&state.db, existing).await?));
    }
    if payload.is_active == Some(false) && id == auth_user.user_id {
        return Err(AppError::Validation(
            "You cannot deactivate your own account".into(),
        ));
    }

    let txn = state.db.begin().await?;

    let existing = find_user(&txn, id).await?;
    let mut active: user::ActiveModel = existing.into();
    if let Some(email) = &payload.email {
        active.email = Set(email.trim().to_string());
    }
    if let Some(full_name) = &payload.full_name {
        active.full_name = Set(full_name.trim().to_string());
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await.map_err(|e| {
        if is_unique_violation(&e) {
            AppError::UsernameTaken
        } else {
            AppError::from(e)
        }
    })?;
    let response = user_response(&txn, model).await?;
    txn.commit().await?;

    tracing::info!(user_id = id, "Updated user");
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    operation_id = "deactivateUser",
    summary = "Deactivate a user",
    description = "Soft delete: the account and its profile stay, but `is_active` becomes false so it can no longer log in or refresh tokens. Repeating the call is harmless. Requires `user:manage` permission.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 400, description = "Cannot deactivate yourself (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_permission("user:manage")?;
    if id == auth_user.user_id {
        return Err(AppError::Validation(
            "You cannot deactivate your own account".into(),
        ));
    }

    let result = user::Entity::update_many()
        .col_expr(user::Column::IsActive, Expr::value(false))
        .col_expr(user::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(user::Column::Id.eq(id))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("User {id} not found")));
    }

    tracing::info!(user_id = id, "Deactivated user");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{id}/advisor",
    tag = "Users",
    operation_id = "setStudentAdvisor",
    summary = "Set or clear a student's advisor",
    description = "Changes which lecturer may review this student's achievements. Requires `user:manage` permission.",
    params(("id" = i32, Path, description = "Student profile ID")),
    request_body = SetAdvisorRequest,
    responses(
        (status = 200, description = "Advisor updated", body = StudentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Student or lecturer not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, advisor_id = ?payload.advisor_id))]
pub async fn set_advisor(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SetAdvisorRequest>,
) -> Result<Json<StudentResponse>, AppError> {
    auth_user.require_permission("user:manage")?;

    let txn = state.db.begin().await?;

    let existing = student::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student {id} not found")))?;

    if let Some(advisor_id) = payload.advisor_id {
        ensure_lecturer_exists(&txn, advisor_id).await?;
    }

    let mut active: student::ActiveModel = existing.into();
    active.advisor_id = Set(payload.advisor_id);
    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}
