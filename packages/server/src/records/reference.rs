use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AchievementStatus;
use sea_orm::DbErr;
use serde::Serialize;

use crate::entity::achievement_reference;

/// Workflow record of one achievement as the record service sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AchievementReference {
    pub id: i32,
    pub student_id: i32,
    pub content_id: String,
    pub status: AchievementStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<i32>,
    pub rejection_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<achievement_reference::Model> for AchievementReference {
    fn from(model: achievement_reference::Model) -> Self {
        Self {
            id: model.id,
            student_id: model.student_id,
            content_id: model.content_id,
            status: model.status,
            submitted_at: model.submitted_at,
            verified_at: model.verified_at,
            verified_by: model.verified_by,
            rejection_note: model.rejection_note,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewReference {
    pub student_id: i32,
    pub content_id: String,
}

/// Row filter for listing and counting references.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceFilter {
    /// `None` applies no owner restriction.
    pub owners: Option<Vec<i32>>,
    pub status: Option<AchievementStatus>,
}

impl ReferenceFilter {
    pub fn matches(&self, reference: &AchievementReference) -> bool {
        if let Some(owners) = &self.owners
            && !owners.contains(&reference.student_id)
        {
            return false;
        }
        self.status.is_none_or(|s| s == reference.status)
    }
}

/// A status change together with the audit fields it stamps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Also clears any earlier verifier and rejection note.
    Submit { at: DateTime<Utc> },
    Verify { by: i32, at: DateTime<Utc> },
    Reject {
        by: i32,
        at: DateTime<Utc>,
        note: Option<String>,
    },
}

impl Transition {
    pub fn target(&self) -> AchievementStatus {
        match self {
            Self::Submit { .. } => AchievementStatus::Submitted,
            Self::Verify { .. } => AchievementStatus::Verified,
            Self::Reject { .. } => AchievementStatus::Rejected,
        }
    }

    /// Statuses from which this transition is legal.
    pub fn allowed_from(&self) -> &'static [AchievementStatus] {
        match self {
            Self::Submit { .. } => AchievementStatus::SUBMITTABLE,
            Self::Verify { .. } | Self::Reject { .. } => &[AchievementStatus::Submitted],
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::Submit { at } | Self::Verify { at, .. } | Self::Reject { at, .. } => *at,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::Verify { .. } => "verify",
            Self::Reject { .. } => "reject",
        }
    }

    /// Write the new status and audit fields into `reference`.
    pub fn apply(&self, reference: &mut AchievementReference) {
        reference.status = self.target();
        reference.updated_at = self.at();
        match self {
            Self::Submit { at } => {
                reference.submitted_at = Some(*at);
                reference.verified_at = None;
                reference.verified_by = None;
                reference.rejection_note = None;
            }
            Self::Verify { by, at } => {
                reference.verified_at = Some(*at);
                reference.verified_by = Some(*by);
                reference.rejection_note = None;
            }
            Self::Reject { by, note, .. } => {
                reference.verified_by = Some(*by);
                reference.rejection_note = note.clone();
            }
        }
    }
}

/// Result of a write that only applies while the row is in an expected status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Guarded<T> {
    Applied(T),
    /// No row with that id.
    Missing,
    /// The row exists but its status no longer permits the write.
    Stale(AchievementStatus),
}

/// Relational persistence of achievement references.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn insert(&self, new: NewReference) -> Result<AchievementReference, DbErr>;

    async fn get(&self, id: i32) -> Result<Option<AchievementReference>, DbErr>;

    /// Newest first.
    async fn list(
        &self,
        filter: &ReferenceFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<AchievementReference>, DbErr>;

    async fn count(&self, filter: &ReferenceFilter) -> Result<u64, DbErr>;

    /// Reference count per status; statuses with no rows may be omitted.
    async fn counts_by_status(
        &self,
        owners: Option<&[i32]>,
    ) -> Result<Vec<(AchievementStatus, u64)>, DbErr>;

    /// Content ids of every reference owned by `owners` (`None` for all).
    async fn content_ids(&self, owners: Option<&[i32]>) -> Result<Vec<String>, DbErr>;

    /// Apply `transition` atomically, provided the current status is one of
    /// `transition.allowed_from()`.
    async fn transition(
        &self,
        id: i32,
        transition: &Transition,
    ) -> Result<Guarded<AchievementReference>, DbErr>;

    /// Delete the row, provided it is still in `status`.
    async fn delete_if(&self, id: i32, status: AchievementStatus) -> Result<Guarded<()>, DbErr>;
}
