use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Grants one permission string (e.g. `achievement:verify`) to a role.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role_permission")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub role: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub permission: String,
    #[sea_orm(belongs_to, from = "role", to = "name")]
    pub role_ref: HasOne<super::role::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
