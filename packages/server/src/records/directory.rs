use async_trait::async_trait;
use sea_orm::DbErr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StudentProfile {
    pub id: i32,
    pub user_id: i32,
    pub advisor_id: Option<i32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LecturerProfile {
    pub id: i32,
    pub user_id: i32,
}

/// Lookup of the student and lecturer profiles attached to user accounts.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn find_student_by_user(&self, user_id: i32) -> Result<Option<StudentProfile>, DbErr>;

    async fn find_lecturer_by_user(&self, user_id: i32)
    -> Result<Option<LecturerProfile>, DbErr>;

    /// Ids of the students whose advisor is `lecturer_id`.
    async fn find_students_by_advisor(&self, lecturer_id: i32) -> Result<Vec<i32>, DbErr>;
}
