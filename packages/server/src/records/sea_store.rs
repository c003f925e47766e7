//! Relational adapters backed by SeaORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AchievementStatus;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

use super::directory::{LecturerProfile, ProfileDirectory, StudentProfile};
use super::reference::{
    AchievementReference, Guarded, NewReference, ReferenceFilter, ReferenceStore, Transition,
};
use crate::entity::{achievement_reference, lecturer, student};

#[derive(Clone)]
pub struct SeaOrmReferenceStore {
    db: DatabaseConnection,
}

impl SeaOrmReferenceStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn filtered(filter: &ReferenceFilter) -> Select<achievement_reference::Entity> {
        let mut query = achievement_reference::Entity::find();
        if let Some(owners) = &filter.owners {
            query = query.filter(achievement_reference::Column::StudentId.is_in(owners.clone()));
        }
        if let Some(status) = filter.status {
            query = query.filter(achievement_reference::Column::Status.eq(status));
        }
        query
    }

    fn owned_by(owners: Option<&[i32]>) -> Select<achievement_reference::Entity> {
        Self::filtered(&ReferenceFilter {
            owners: owners.map(<[i32]>::to_vec),
            status: None,
        })
    }

    /// One `(status, count)` row per status present, grouped in the database.
    fn status_counts(owners: Option<&[i32]>) -> Select<achievement_reference::Entity> {
        Self::owned_by(owners)
            .select_only()
            .column(achievement_reference::Column::Status)
            .column_as(achievement_reference::Column::Id.count(), "count")
            .group_by(achievement_reference::Column::Status)
            .order_by_asc(achievement_reference::Column::Status)
    }

    /// Tell a missing row from one whose status moved on.
    async fn miss<T>(&self, id: i32) -> Result<Guarded<T>, DbErr> {
        Ok(match achievement_reference::Entity::find_by_id(id).one(&self.db).await? {
            Some(current) => Guarded::Stale(current.status),
            None => Guarded::Missing,
        })
    }
}

#[async_trait]
impl ReferenceStore for SeaOrmReferenceStore {
    async fn insert(&self, new: NewReference) -> Result<AchievementReference, DbErr> {
        let now = Utc::now();
        let model = achievement_reference::ActiveModel {
            student_id: Set(new.student_id),
            content_id: Set(new.content_id),
            status: Set(AchievementStatus::Draft),
            submitted_at: Set(None),
            verified_at: Set(None),
            verified_by: Set(None),
            rejection_note: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(model.insert(&self.db).await?.into())
    }

    async fn get(&self, id: i32) -> Result<Option<AchievementReference>, DbErr> {
        Ok(achievement_reference::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Into::into))
    }

    async fn list(
        &self,
        filter: &ReferenceFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<AchievementReference>, DbErr> {
        let rows = Self::filtered(filter)
            .order_by_desc(achievement_reference::Column::CreatedAt)
            .order_by_desc(achievement_reference::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &ReferenceFilter) -> Result<u64, DbErr> {
        Self::filtered(filter).count(&self.db).await
    }

    async fn counts_by_status(
        &self,
        owners: Option<&[i32]>,
    ) -> Result<Vec<(AchievementStatus, u64)>, DbErr> {
        let rows: Vec<(AchievementStatus, i64)> = Self::status_counts(owners)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(status, count)| (status, count.max(0) as u64))
            .collect())
    }

    async fn content_ids(&self, owners: Option<&[i32]>) -> Result<Vec<String>, DbErr> {
        Self::owned_by(owners)
            .select_only()
            .column(achievement_reference::Column::ContentId)
            .into_tuple::<String>()
            .all(&self.db)
            .await
    }

    async fn transition(
        &self,
        id: i32,
        transition: &Transition,
    ) -> Result<Guarded<AchievementReference>, DbErr> {
        use achievement_reference::Column;

        let update = achievement_reference::Entity::update_many()
            .col_expr(Column::Status, Expr::value(transition.target()))
            .col_expr(Column::UpdatedAt, Expr::value(transition.at()));

        let update = match transition {
            Transition::Submit { at } => update
                .col_expr(Column::SubmittedAt, Expr::value(Some(*at)))
                .col_expr(Column::VerifiedAt, Expr::value(None::<DateTime<Utc>>))
                .col_expr(Column::VerifiedBy, Expr::value(None::<i32>))
                .col_expr(Column::RejectionNote, Expr::value(None::<String>)),
            Transition::Verify { by, at } => update
                .col_expr(Column::VerifiedAt, Expr::value(Some(*at)))
                .col_expr(Column::VerifiedBy, Expr::value(Some(*by)))
                .col_expr(Column::RejectionNote, Expr::value(None::<String>)),
            Transition::Reject { by, note, .. } => update
                .col_expr(Column::VerifiedBy, Expr::value(Some(*by)))
                .col_expr(Column::RejectionNote, Expr::value(note.clone())),
        };

        let result = update
            .filter(Column::Id.eq(id))
            .filter(Column::Status.is_in(transition.allowed_from().iter().copied()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return self.miss(id).await;
        }

        match self.get(id).await? {
            Some(updated) => Ok(Guarded::Applied(updated)),
            None => Ok(Guarded::Missing),
        }
    }

    async fn delete_if(&self, id: i32, status: AchievementStatus) -> Result<Guarded<()>, DbErr> {
        let result = achievement_reference::Entity::delete_many()
            .filter(achievement_reference::Column::Id.eq(id))
            .filter(achievement_reference::Column::Status.eq(status))
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            Ok(Guarded::Applied(()))
        } else {
            self.miss(id).await
        }
    }
}

#[derive(Clone)]
pub struct SeaOrmDirectory {
    db: DatabaseConnection,
}

impl SeaOrmDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileDirectory for SeaOrmDirectory {
    async fn find_student_by_user(&self, user_id: i32) -> Result<Option<StudentProfile>, DbErr> {
        Ok(student::Entity::find()
            .filter(student::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .map(|s| StudentProfile {
                id: s.id,
                user_id: s.user_id,
                advisor_id: s.advisor_id,
            }))
    }

    async fn find_lecturer_by_user(
        &self,
        user_id: i32,
    ) -> Result<Option<LecturerProfile>, DbErr> {
        Ok(lecturer::Entity::find()
            .filter(lecturer::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .map(|l| LecturerProfile {
                id: l.id,
                user_id: l.user_id,
            }))
    }

    async fn find_students_by_advisor(&self, lecturer_id: i32) -> Result<Vec<i32>, DbErr> {
        student::Entity::find()
            .select_only()
            .column(student::Column::Id)
            .filter(student::Column::AdvisorId.eq(lecturer_id))
            .order_by_asc(student::Column::Id)
            .into_tuple::<i32>()
            .all(&self.db)
            .await
    }
}
