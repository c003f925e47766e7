use common::Role;
use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{achievement_reference, role, role_permission};

/// Roles seeded on startup, with their descriptions.
const DEFAULT_ROLES: &[(Role, &str)] = &[
    (Role::Admin, "Full access to achievements, users and reports"),
    (Role::Student, "Records and submits their own achievements"),
    (Role::Advisor, "Reviews achievements of assigned students"),
];

/// Role-permission mappings seeded on startup.
pub const DEFAULT_MAPPINGS: &[(Role, &str)] = &[
    (Role::Admin, "achievement:create"),
    (Role::Admin, "achievement:read"),
    (Role::Admin, "achievement:update"),
    (Role::Admin, "achievement:delete"),
    (Role::Admin, "achievement:verify"),
    (Role::Admin, "report:view"),
    (Role::Admin, "user:manage"),
    (Role::Student, "achievement:create"),
    (Role::Student, "achievement:read"),
    (Role::Student, "achievement:update"),
    (Role::Student, "achievement:delete"),
    (Role::Advisor, "achievement:read"),
    (Role::Advisor, "achievement:verify"),
    (Role::Advisor, "report:view"),
];

/// Seed the `role` and `role_permission` tables. Existing rows are left alone.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut roles_inserted = 0u32;
    for &(name, description) in DEFAULT_ROLES {
        let model = role::ActiveModel {
            name: Set(name.as_str().to_string()),
            description: Set(description.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(OnConflict::column(role::Column::Name).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => roles_inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    let mut perms_inserted = 0u32;
    for &(role, permission) in DEFAULT_MAPPINGS {
        let model = role_permission::ActiveModel {
            role: Set(role.as_str().to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => perms_inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

/// Ensure composite indexes that schema-sync does not create.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Scoped listing: WHERE student_id IN (..) ORDER BY created_at DESC
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_achievement_reference_student_created")
        .table(achievement_reference::Entity)
        .col(achievement_reference::Column::StudentId)
        .col(achievement_reference::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_achievement_reference_student_created exists"),
        Err(e) => tracing::warn!(
            "Failed to create index idx_achievement_reference_student_created: {}",
            e
        ),
    }

    Ok(())
}
