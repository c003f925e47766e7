use std::str::FromStr;

use common::achievement::{CommonDetails, ContentPatch, NewAttachment, NewContent, TypeDetails};

use super::error::RecordError;

pub const MAX_TITLE_CHARS: usize = 256;
pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_CHARS: usize = 50;

/// Caller-supplied content for a new achievement.
#[derive(Clone, Debug, PartialEq)]
pub struct NewAchievement {
    pub title: String,
    pub description: String,
    pub details: TypeDetails,
    pub common: CommonDetails,
    pub tags: Vec<String>,
    pub points: i32,
}

impl NewAchievement {
    pub fn validate(&self) -> Result<(), RecordError> {
        validate_title(&self.title)?;
        validate_points(self.points)?;
        validate_tags(&self.tags)
    }

    pub(crate) fn into_content(self, student_id: i32) -> NewContent {
        NewContent {
            student_id,
            title: self.title.trim().to_string(),
            description: self.description,
            details: self.details,
            common: self.common,
            tags: normalize_tags(self.tags),
            points: self.points,
        }
    }
}

/// Replacement values for the mutable content fields. `None` keeps the stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AchievementUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub details: Option<TypeDetails>,
    pub common: Option<CommonDetails>,
    pub tags: Option<Vec<String>>,
    pub points: Option<i32>,
}

impl AchievementUpdate {
    pub fn validate(&self) -> Result<(), RecordError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(points) = self.points {
            validate_points(points)?;
        }
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        Ok(())
    }

    pub(crate) fn into_patch(self) -> ContentPatch {
        ContentPatch {
            title: self.title.map(|t| t.trim().to_string()),
            description: self.description,
            details: self.details,
            common: self.common,
            tags: self.tags.map(normalize_tags),
            points: self.points,
        }
    }
}

/// Decision taken on a submitted achievement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewAction {
    Verify,
    Reject,
}

impl FromStr for ReviewAction {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verify" => Ok(Self::Verify),
            "reject" => Ok(Self::Reject),
            other => Err(RecordError::InvalidInput(format!(
                "Action must be 'verify' or 'reject', got '{other}'"
            ))),
        }
    }
}

pub fn validate_attachment(attachment: &NewAttachment) -> Result<(), RecordError> {
    if attachment.file_name.trim().is_empty() {
        return Err(RecordError::InvalidInput(
            "Attachment file name must not be empty".into(),
        ));
    }
    if attachment.file_url.trim().is_empty() {
        return Err(RecordError::InvalidInput(
            "Attachment URL must not be empty".into(),
        ));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), RecordError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
        return Err(RecordError::InvalidInput(format!(
            "Title must be 1-{MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_points(points: i32) -> Result<(), RecordError> {
    if points < 0 {
        return Err(RecordError::InvalidInput("Points must be >= 0".into()));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), RecordError> {
    if tags.len() > MAX_TAGS {
        return Err(RecordError::InvalidInput(format!(
            "Too many tags: max {MAX_TAGS}"
        )));
    }
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || tag.chars().count() > MAX_TAG_CHARS {
            return Err(RecordError::InvalidInput(format!(
                "Each tag must be 1-{MAX_TAG_CHARS} characters"
            )));
        }
    }
    Ok(())
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter().map(|t| t.trim().to_string()).collect()
}
