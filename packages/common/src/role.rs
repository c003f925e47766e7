use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of caller roles the record workflow distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Owns achievements through a student profile.
    Student,
    /// Lecturer who reviews the achievements of their advisees.
    Advisor,
    /// Unrestricted reviewer and user manager.
    Admin,
}

impl Role {
    pub const ALL: &'static [Role] = &[Self::Student, Self::Advisor, Self::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Advisor => "advisor",
            Self::Admin => "admin",
        }
    }

    /// Roles allowed to verify or reject a submitted achievement.
    pub fn can_review(&self) -> bool {
        matches!(self, Self::Advisor | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role '{0}'")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "advisor" => Ok(Self::Advisor),
            "admin" => Ok(Self::Admin),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}
