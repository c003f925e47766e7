use chrono::{DateTime, Utc};
use common::Role;
use serde::{Deserialize, Serialize};

use crate::entity::{student, user};
use crate::error::AppError;
use crate::models::shared::Pagination;

/// Request body for creating a user together with its role profile.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    /// Unique username (1-32 chars, alphanumeric and underscores).
    #[schema(example = "alice_wonder")]
    pub username: String,
    #[schema(example = "alice@campus.example.edu")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    #[schema(example = "Alice Wonder")]
    pub full_name: String,
    pub role: Role,
    /// Required for `student`.
    #[schema(example = "2021001234")]
    pub student_number: Option<String>,
    pub program_study: Option<String>,
    pub academic_year: Option<String>,
    /// Lecturer profile id of the student's advisor.
    pub advisor_id: Option<i32>,
    /// Required for `advisor`.
    pub lecturer_number: Option<String>,
    pub department: Option<String>,
}

fn required(value: &Option<String>, what: &str) -> Result<(), AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(AppError::Validation(format!("{what} is required for this role"))),
    }
}

pub fn validate_create_user(payload: &CreateUserRequest) -> Result<(), AppError> {
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > 32 {
        return Err(AppError::Validation(
            "Username must be 1-32 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username must contain only letters, digits, and underscores".into(),
        ));
    }
    if !payload.email.contains('@') {
        return Err(AppError::Validation("Email is not valid".into()));
    }
    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    if payload.full_name.trim().is_empty() {
        return Err(AppError::Validation("Full name must not be empty".into()));
    }
    match payload.role {
        Role::Student => required(&payload.student_number, "Student number"),
        Role::Advisor => required(&payload.lecturer_number, "Lecturer number"),
        Role::Admin => Ok(()),
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    /// Student profile id, for students.
    pub student_id: Option<i32>,
    /// Lecturer profile id, for advisors.
    pub lecturer_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn new(user: user::Model, student_id: Option<i32>, lecturer_id: Option<i32>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            is_active: user.is_active,
            student_id,
            lecturer_id,
            created_at: user.created_at,
        }
    }
}

/// Partial update of an account. Absent fields are left unchanged.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    #[schema(example = "alice@campus.example.edu")]
    pub email: Option<String>,
    pub full_name: Option<String>,
    /// `false` blocks login and token refresh; `true` re-enables the account.
    pub is_active: Option<bool>,
}

pub fn validate_update_user(payload: &UpdateUserRequest) -> Result<(), AppError> {
    if let Some(email) = &payload.email
        && !email.trim().contains('@')
    {
        return Err(AppError::Validation("Email is not valid".into()));
    }
    if let Some(full_name) = &payload.full_name
        && full_name.trim().is_empty()
    {
        return Err(AppError::Validation("Full name must not be empty".into()));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Page number, 1-based. Default: 1.
    pub page: Option<u64>,
    /// Items per page. Default: 10, max: 100.
    pub page_size: Option<u64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub data: Vec<UserResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetAdvisorRequest {
    /// Lecturer profile id, or `null` to clear.
    #[schema(example = 3)]
    pub advisor_id: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentResponse {
    pub id: i32,
    pub user_id: i32,
    pub student_number: String,
    pub program_study: Option<String>,
    pub academic_year: Option<String>,
    pub advisor_id: Option<i32>,
}

impl From<student::Model> for StudentResponse {
    fn from(s: student::Model) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            student_number: s.student_number,
            program_study: s.program_study,
            academic_year: s.academic_year,
            advisor_id: s.advisor_id,
        }
    }
}
