use std::collections::HashMap;

use async_trait::async_trait;

use super::error::DocumentError;
use crate::achievement::{
    AchievementContent, Attachment, ContentPatch, NewAttachment, NewContent, TypeStatistic,
};

/// Schema-less store holding the substantive data of each achievement.
///
/// Only single-document atomicity is assumed.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store new content, assigning a store-native id and stamping created/updated times.
    async fn create(&self, content: NewContent) -> Result<AchievementContent, DocumentError>;

    /// Fetch one document by id.
    async fn get(&self, id: &str) -> Result<AchievementContent, DocumentError>;

    /// Fetch several documents at once. Ids with no document are absent from
    /// the returned map rather than an error.
    async fn get_many(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, AchievementContent>, DocumentError> {
        let mut found = HashMap::with_capacity(ids.len());
        for id in ids {
            match self.get(id).await {
                Ok(content) => {
                    found.insert(id.clone(), content);
                }
                Err(DocumentError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(found)
    }

    /// Replace the supplied fields and stamp the updated time.
    async fn update(&self, id: &str, patch: ContentPatch) -> Result<(), DocumentError>;

    /// Append an attachment descriptor, stamping its upload time.
    async fn push_attachment(
        &self,
        id: &str,
        attachment: NewAttachment,
    ) -> Result<Attachment, DocumentError>;

    /// Remove a document.
    async fn delete(&self, id: &str) -> Result<(), DocumentError>;

    /// Count and sum points per achievement type over the given documents.
    /// Ids with no document, or malformed ids, contribute nothing.
    async fn statistics_by_type(
        &self,
        ids: &[String],
    ) -> Result<Vec<TypeStatistic>, DocumentError>;
}
