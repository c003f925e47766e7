use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::error::DocumentError;
use super::traits::DocumentStore;
use crate::achievement::{
    AchievementContent, AchievementType, Attachment, ContentPatch, NewAttachment, NewContent,
    TypeStatistic,
};

/// Process-local document store.
///
/// Used when `document.backend = "memory"` and by the test suites. Ids are
/// 24-character hex strings so they look like MongoDB ObjectIds.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, AchievementContent>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    fn next_id() -> String {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(24);
        id
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, content: NewContent) -> Result<AchievementContent, DocumentError> {
        let stored = content.into_content(Self::next_id(), Utc::now());
        self.documents
            .write()
            .await
            .insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: &str) -> Result<AchievementContent, DocumentError> {
        self.documents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))
    }

    async fn get_many(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, AchievementContent>, DocumentError> {
        let documents = self.documents.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| documents.get(id).map(|c| (id.clone(), c.clone())))
            .collect())
    }

    async fn update(&self, id: &str, patch: ContentPatch) -> Result<(), DocumentError> {
        let mut documents = self.documents.write().await;
        let content = documents
            .get_mut(id)
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))?;
        patch.apply_to(content, Utc::now());
        Ok(())
    }

    async fn push_attachment(
        &self,
        id: &str,
        attachment: NewAttachment,
    ) -> Result<Attachment, DocumentError> {
        let mut documents = self.documents.write().await;
        let content = documents
            .get_mut(id)
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))?;
        let now = Utc::now();
        let attachment = attachment.stamp(now);
        content.attachments.push(attachment.clone());
        content.updated_at = now;
        Ok(attachment)
    }

    async fn delete(&self, id: &str) -> Result<(), DocumentError> {
        self.documents
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))
    }

    async fn statistics_by_type(
        &self,
        ids: &[String],
    ) -> Result<Vec<TypeStatistic>, DocumentError> {
        let documents = self.documents.read().await;
        let mut by_type: BTreeMap<AchievementType, (u64, i64)> = BTreeMap::new();

        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        for content in wanted.into_iter().filter_map(|id| documents.get(id)) {
            let entry = by_type.entry(content.achievement_type).or_default();
            entry.0 += 1;
            entry.1 += i64::from(content.points);
        }

        Ok(by_type
            .into_iter()
            .map(|(achievement_type, (count, total_points))| TypeStatistic {
                achievement_type,
                count,
                total_points,
            })
            .collect())
    }
}
