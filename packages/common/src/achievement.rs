//! Substantive achievement data held by the document store.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of achievement. Fixed when the content is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AchievementType {
    Competition,
    Publication,
    Organization,
    Certification,
    Other,
}

impl AchievementType {
    pub const ALL: &'static [AchievementType] = &[
        Self::Competition,
        Self::Publication,
        Self::Organization,
        Self::Certification,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Competition => "competition",
            Self::Publication => "publication",
            Self::Organization => "organization",
            Self::Certification => "certification",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for AchievementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AchievementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Invalid achievement type '{s}'"))
    }
}

/// Membership period of an organization role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Type-specific attributes. The `achievement_type` tag selects which group
/// is meaningful, and must agree with the content's [`AchievementType`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "achievement_type", rename_all = "snake_case")]
pub enum TypeDetails {
    Competition {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        competition_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        competition_level: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rank: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        medal_type: Option<String>,
    },
    Publication {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        publication_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        publication_title: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        authors: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        publisher: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issn: Option<String>,
    },
    Organization {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        organization_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        period: Option<Period>,
    },
    Certification {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        certification_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        issued_by: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        certification_number: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        valid_until: Option<DateTime<Utc>>,
    },
    Other,
}

impl TypeDetails {
    pub fn achievement_type(&self) -> AchievementType {
        match self {
            Self::Competition { .. } => AchievementType::Competition,
            Self::Publication { .. } => AchievementType::Publication,
            Self::Organization { .. } => AchievementType::Organization,
            Self::Certification { .. } => AchievementType::Certification,
            Self::Other => AchievementType::Other,
        }
    }
}

/// A caller-supplied extension value. Only scalars are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Attributes shared by every achievement type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_fields: BTreeMap<String, ScalarValue>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Attachment descriptor before the store stamps its upload time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAttachment {
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
}

impl NewAttachment {
    pub fn stamp(self, uploaded_at: DateTime<Utc>) -> Attachment {
        Attachment {
            file_name: self.file_name,
            file_url: self.file_url,
            file_type: self.file_type,
            uploaded_at,
        }
    }
}

/// A stored achievement document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AchievementContent {
    /// Store-native identifier (ObjectId hex for MongoDB).
    pub id: String,
    /// Owning student profile.
    pub student_id: i32,
    pub achievement_type: AchievementType,
    pub title: String,
    pub description: String,
    pub details: TypeDetails,
    pub common: CommonDetails,
    pub attachments: Vec<Attachment>,
    pub tags: Vec<String>,
    pub points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Content to be written by `DocumentStore::create`.
#[derive(Clone, Debug, PartialEq)]
pub struct NewContent {
    pub student_id: i32,
    pub title: String,
    pub description: String,
    pub details: TypeDetails,
    pub common: CommonDetails,
    pub tags: Vec<String>,
    pub points: i32,
}

impl NewContent {
    pub fn achievement_type(&self) -> AchievementType {
        self.details.achievement_type()
    }

    /// Materialize with a store-assigned id and creation time.
    pub fn into_content(self, id: String, now: DateTime<Utc>) -> AchievementContent {
        AchievementContent {
            id,
            student_id: self.student_id,
            achievement_type: self.details.achievement_type(),
            title: self.title,
            description: self.description,
            details: self.details,
            common: self.common,
            attachments: Vec::new(),
            tags: self.tags,
            points: self.points,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update. `None` leaves the stored field untouched. Owner and type
/// are not representable here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub details: Option<TypeDetails>,
    pub common: Option<CommonDetails>,
    pub tags: Option<Vec<String>>,
    pub points: Option<i32>,
}

impl ContentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.details.is_none()
            && self.common.is_none()
            && self.tags.is_none()
            && self.points.is_none()
    }

    /// Apply the supplied fields and stamp `updated_at`.
    pub fn apply_to(self, content: &mut AchievementContent, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            content.title = title;
        }
        if let Some(description) = self.description {
            content.description = description;
        }
        if let Some(details) = self.details {
            content.details = details;
        }
        if let Some(common) = self.common {
            content.common = common;
        }
        if let Some(tags) = self.tags {
            content.tags = tags;
        }
        if let Some(points) = self.points {
            content.points = points;
        }
        content.updated_at = now;
    }
}

/// Count and summed points for one achievement type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TypeStatistic {
    pub achievement_type: AchievementType,
    #[schema(example = 3)]
    pub count: u64,
    #[schema(example = 45)]
    pub total_points: i64,
}
