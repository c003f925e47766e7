use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role")]
pub struct Model {
    /// One of the `common::Role` names: `admin`, `student`, `advisor`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub description: String,

    #[sea_orm(has_many)]
    pub users: HasMany<super::user::Entity>,

    #[sea_orm(has_many)]
    pub permissions: HasMany<super::role_permission::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
