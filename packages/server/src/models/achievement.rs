use chrono::{DateTime, Utc};
use common::achievement::{
    AchievementContent, Attachment, CommonDetails, NewAttachment, TypeDetails, TypeStatistic,
};
use common::AchievementStatus;
use serde::{Deserialize, Serialize};

pub use super::shared::Pagination;
use crate::records::input::{AchievementUpdate, NewAchievement};
use crate::records::reference::AchievementReference;
use crate::records::service::StatusCount;
use crate::records::{Achievement, Page, Statistics};

/// Request body for creating an achievement.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAchievementRequest {
    /// Title (1-256 characters after trimming).
    #[schema(example = "National Programming Olympiad")]
    pub title: String,
    #[serde(default)]
    #[schema(example = "Second place in the national final")]
    pub description: String,
    /// Type-specific attributes. `achievement_type` selects the variant:
    /// `competition`, `publication`, `organization`, `certification`, `other`.
    #[schema(value_type = Object, example = json!({
        "achievement_type": "competition",
        "competition_name": "National Programming Olympiad",
        "competition_level": "national",
        "rank": 2,
        "medal_type": "silver"
    }))]
    pub details: TypeDetails,
    /// Event date, location, organizer, score and scalar `custom_fields`.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub common: CommonDetails,
    /// At most 20 tags of 1-50 characters.
    #[serde(default)]
    #[schema(example = json!(["programming", "national"]))]
    pub tags: Vec<String>,
    /// Non-negative point value.
    #[serde(default)]
    #[schema(example = 10)]
    pub points: i32,
}

impl From<CreateAchievementRequest> for NewAchievement {
    fn from(req: CreateAchievementRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            details: req.details,
            common: req.common,
            tags: req.tags,
            points: req.points,
        }
    }
}

/// Request body for updating an achievement. Omitted fields are kept.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateAchievementRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Must keep the stored `achievement_type`.
    #[schema(value_type = Option<Object>)]
    pub details: Option<TypeDetails>,
    #[schema(value_type = Option<Object>)]
    pub common: Option<CommonDetails>,
    pub tags: Option<Vec<String>>,
    pub points: Option<i32>,
}

impl From<UpdateAchievementRequest> for AchievementUpdate {
    fn from(req: UpdateAchievementRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            details: req.details,
            common: req.common,
            tags: req.tags,
            points: req.points,
        }
    }
}

/// Review decision on a submitted achievement.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct VerifyRequest {
    /// `verify` or `reject`.
    #[schema(example = "reject")]
    pub action: String,
    /// Stored as the rejection note when rejecting.
    #[schema(example = "missing proof")]
    pub note: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AttachmentRequest {
    #[schema(example = "certificate.pdf")]
    pub file_name: String,
    #[schema(example = "https://files.example.com/certificate.pdf")]
    pub file_url: String,
    /// MIME type.
    #[serde(default)]
    #[schema(example = "application/pdf")]
    pub file_type: String,
}

impl From<AttachmentRequest> for NewAttachment {
    fn from(req: AttachmentRequest) -> Self {
        Self {
            file_name: req.file_name,
            file_url: req.file_url,
            file_type: req.file_type,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AchievementListQuery {
    /// Only achievements in this status.
    pub status: Option<AchievementStatus>,
    /// Page number, 1-based. Default: 1.
    pub page: Option<u64>,
    /// Items per page. Default: 10, max: 100.
    pub page_size: Option<u64>,
}

/// Workflow fields of an achievement.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ReferenceResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = 7)]
    pub student_id: i32,
    /// Document store id of the content.
    #[schema(example = "665f1c2ab4d3e8a1f0c9d712")]
    pub content_id: String,
    pub status: AchievementStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    /// User id of the reviewer.
    pub verified_by: Option<i32>,
    pub rejection_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AchievementReference> for ReferenceResponse {
    fn from(r: AchievementReference) -> Self {
        Self {
            id: r.id,
            student_id: r.student_id,
            content_id: r.content_id,
            status: r.status,
            submitted_at: r.submitted_at,
            verified_at: r.verified_at,
            verified_by: r.verified_by,
            rejection_note: r.rejection_note,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// An achievement: workflow fields plus its content.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AchievementResponse {
    #[serde(flatten)]
    pub reference: ReferenceResponse,
    /// `null` in listings when the content could not be found.
    #[schema(value_type = Option<Object>)]
    pub content: Option<AchievementContent>,
}

impl From<Achievement> for AchievementResponse {
    fn from(a: Achievement) -> Self {
        Self {
            reference: a.reference.into(),
            content: a.content,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AchievementListResponse {
    pub data: Vec<AchievementResponse>,
    pub pagination: Pagination,
}

impl From<Page<Achievement>> for AchievementListResponse {
    fn from(page: Page<Achievement>) -> Self {
        let pagination = Pagination::from(&page);
        Self {
            data: page.items.into_iter().map(Into::into).collect(),
            pagination,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AttachmentResponse {
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentResponse {
    fn from(a: Attachment) -> Self {
        Self {
            file_name: a.file_name,
            file_url: a.file_url,
            file_type: a.file_type,
            uploaded_at: a.uploaded_at,
        }
    }
}

/// Aggregates over the caller's scope.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StatisticsResponse {
    pub by_type: Vec<TypeStatistic>,
    pub by_status: Vec<StatusCount>,
    #[schema(example = 12)]
    pub total_achievements: u64,
    #[schema(example = 150)]
    pub total_points: i64,
}

impl From<Statistics> for StatisticsResponse {
    fn from(s: Statistics) -> Self {
        Self {
            by_type: s.by_type,
            by_status: s.by_status,
            total_achievements: s.total_achievements,
            total_points: s.total_points,
        }
    }
}
