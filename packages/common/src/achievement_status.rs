#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workflow status of an achievement reference.
///
/// ```text
/// draft --submit--> submitted --verify--> verified
/// draft --submit--> submitted --reject--> rejected
/// rejected --submit--> submitted
/// ```
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")
)]
#[serde(rename_all = "snake_case")]
pub enum AchievementStatus {
    /// Created by the student, not yet sent for review.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "draft"))]
    Draft,
    /// Waiting for an advisor or administrator.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "submitted"))]
    Submitted,
    /// Accepted by a verifier. Terminal.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "verified"))]
    Verified,
    /// Sent back to the student with a note.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "rejected"))]
    Rejected,
}

impl AchievementStatus {
    /// All possible status values.
    pub const ALL: &'static [AchievementStatus] =
        &[Self::Draft, Self::Submitted, Self::Verified, Self::Rejected];

    /// Statuses in which the owning student may still edit content.
    pub const EDITABLE: &'static [AchievementStatus] = &[Self::Draft, Self::Rejected];

    /// Statuses from which `submit` is legal.
    pub const SUBMITTABLE: &'static [AchievementStatus] = &[Self::Draft, Self::Rejected];

    /// Returns true if content may be changed in this status.
    pub fn is_editable(&self) -> bool {
        Self::EDITABLE.contains(self)
    }

    /// Returns true if no further transition exists.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AchievementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for AchievementStatus {
    fn default() -> Self {
        Self::Draft
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status '{}'. Valid values: {}",
            self.invalid,
            AchievementStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for AchievementStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}
