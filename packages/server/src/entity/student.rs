use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student profile. Owns achievements; optionally advised by a lecturer.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    /// Institutional student number.
    #[sea_orm(unique)]
    pub student_number: String,
    pub program_study: Option<String>,
    pub academic_year: Option<String>,

    #[sea_orm(indexed)]
    pub advisor_id: Option<i32>,
    #[sea_orm(belongs_to, from = "advisor_id", to = "id")]
    pub advisor: HasOne<super::lecturer::Entity>,

    #[sea_orm(has_many)]
    pub achievements: HasMany<super::achievement_reference::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
