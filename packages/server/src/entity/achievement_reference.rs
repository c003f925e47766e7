use common::AchievementStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Workflow record of one achievement. Authority for lifecycle and ownership;
/// the substantive data lives in the document store under `content_id`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievement_reference")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub student_id: i32,
    #[sea_orm(belongs_to, from = "student_id", to = "id")]
    pub student: HasOne<super::student::Entity>,

    /// Document-store id. Not unique-constrained; 1:1 is kept by the record service.
    pub content_id: String,

    #[sea_orm(indexed)]
    pub status: AchievementStatus,

    pub submitted_at: Option<DateTimeUtc>,
    pub verified_at: Option<DateTimeUtc>,
    /// User id of the advisor or admin who verified or rejected.
    pub verified_by: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_note: Option<String>,

    #[sea_orm(indexed)]
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
