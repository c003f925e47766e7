//! MongoDB-backed document store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::DocumentError;
use super::traits::DocumentStore;
use crate::achievement::{
    AchievementContent, AchievementType, Attachment, CommonDetails, ContentPatch, NewAttachment,
    NewContent, TypeDetails, TypeStatistic,
};

/// Stored shape of an achievement in the collection.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    student_id: i32,
    achievement_type: AchievementType,
    title: String,
    description: String,
    details: TypeDetails,
    #[serde(default)]
    common: CommonDetails,
    #[serde(default)]
    attachments: Vec<Attachment>,
    #[serde(default)]
    tags: Vec<String>,
    points: i32,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl ContentRecord {
    fn into_content(self) -> Result<AchievementContent, DocumentError> {
        let id = self
            .id
            .ok_or_else(|| DocumentError::Encoding("document without _id".into()))?;
        Ok(AchievementContent {
            id: id.to_hex(),
            student_id: self.student_id,
            achievement_type: self.achievement_type,
            title: self.title,
            description: self.description,
            details: self.details,
            common: self.common,
            attachments: self.attachments,
            tags: self.tags,
            points: self.points,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Achievement content kept in a single MongoDB collection.
#[derive(Clone)]
pub struct MongoDocumentStore {
    collection: Collection<ContentRecord>,
}

impl MongoDocumentStore {
    /// Connect, verify the server answers, and ensure the owner index exists.
    pub async fn connect(
        uri: &str,
        database: &str,
        collection: &str,
    ) -> Result<Self, DocumentError> {
        info!("Connecting to MongoDB at {}", uri);

        let client = Client::with_options(client_options(uri).await?)?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 }).await?;

        let store = Self {
            collection: db.collection(collection),
        };
        store.ensure_indexes().await?;

        info!(database, collection, "Connected to MongoDB");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), DocumentError> {
        let owner_type = IndexModel::builder()
            .keys(doc! { "studentId": 1, "achievementType": 1 })
            .options(
                IndexOptions::builder()
                    .name("student_type_index".to_string())
                    .build(),
            )
            .build();
        self.collection.create_index(owner_type).await?;
        Ok(())
    }

    fn object_id(id: &str) -> Result<ObjectId, DocumentError> {
        // A malformed id can never name a stored document.
        ObjectId::parse_str(id).map_err(|_| DocumentError::NotFound(id.to_string()))
    }
}

/// Applied when the connection string does not set its own timeouts, so an
/// unreachable server fails startup instead of hanging it.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

async fn client_options(uri: &str) -> Result<ClientOptions, DocumentError> {
    let mut options = ClientOptions::parse(uri).await?;
    options.server_selection_timeout.get_or_insert(DEFAULT_TIMEOUT);
    options.connect_timeout.get_or_insert(DEFAULT_TIMEOUT);
    Ok(options)
}

fn bson_to_i64(value: Option<&Bson>) -> i64 {
    match value {
        Some(Bson::Int32(v)) => i64::from(*v),
        Some(Bson::Int64(v)) => *v,
        Some(Bson::Double(v)) => *v as i64,
        _ => 0,
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn create(&self, content: NewContent) -> Result<AchievementContent, DocumentError> {
        let now = Utc::now();
        let record = ContentRecord {
            id: None,
            student_id: content.student_id,
            achievement_type: content.achievement_type(),
            title: content.title.clone(),
            description: content.description.clone(),
            details: content.details.clone(),
            common: content.common.clone(),
            attachments: Vec::new(),
            tags: content.tags.clone(),
            points: content.points,
            created_at: now,
            updated_at: now,
        };

        let result = self.collection.insert_one(&record).await?;
        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| DocumentError::Encoding("inserted id is not an ObjectId".into()))?;

        Ok(content.into_content(id.to_hex(), now))
    }

    async fn get(&self, id: &str) -> Result<AchievementContent, DocumentError> {
        let oid = Self::object_id(id)?;
        self.collection
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))?
            .into_content()
    }

    async fn get_many(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, AchievementContent>, DocumentError> {
        let oids: Vec<ObjectId> = ids
            .iter()
            .filter_map(|id| ObjectId::parse_str(id).ok())
            .collect();
        if oids.is_empty() {
            return Ok(HashMap::new());
        }

        let records: Vec<ContentRecord> = self
            .collection
            .find(doc! { "_id": { "$in": oids } })
            .await?
            .try_collect()
            .await?;

        let mut found = HashMap::with_capacity(records.len());
        for record in records {
            let content = record.into_content()?;
            found.insert(content.id.clone(), content);
        }
        Ok(found)
    }

    async fn update(&self, id: &str, patch: ContentPatch) -> Result<(), DocumentError> {
        let oid = Self::object_id(id)?;

        let mut set = Document::new();
        if let Some(title) = patch.title {
            set.insert("title", title);
        }
        if let Some(description) = patch.description {
            set.insert("description", description);
        }
        if let Some(details) = patch.details {
            set.insert("details", bson::to_bson(&details)?);
        }
        if let Some(common) = patch.common {
            set.insert("common", bson::to_bson(&common)?);
        }
        if let Some(tags) = patch.tags {
            set.insert("tags", tags);
        }
        if let Some(points) = patch.points {
            set.insert("points", points);
        }
        set.insert("updatedAt", bson::DateTime::from_chrono(Utc::now()));

        let result = self
            .collection
            .update_one(doc! { "_id": oid }, doc! { "$set": set })
            .await?;

        if result.matched_count == 0 {
            return Err(DocumentError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn push_attachment(
        &self,
        id: &str,
        attachment: NewAttachment,
    ) -> Result<Attachment, DocumentError> {
        let oid = Self::object_id(id)?;
        let now = Utc::now();
        let attachment = attachment.stamp(now);

        let result = self
            .collection
            .update_one(
                doc! { "_id": oid },
                doc! {
                    "$push": { "attachments": bson::to_bson(&attachment)? },
                    "$set": { "updatedAt": bson::DateTime::from_chrono(now) },
                },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(DocumentError::NotFound(id.to_string()));
        }
        Ok(attachment)
    }

    async fn delete(&self, id: &str) -> Result<(), DocumentError> {
        let oid = Self::object_id(id)?;
        let result = self.collection.delete_one(doc! { "_id": oid }).await?;
        if result.deleted_count == 0 {
            return Err(DocumentError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn statistics_by_type(
        &self,
        ids: &[String],
    ) -> Result<Vec<TypeStatistic>, DocumentError> {
        let oids: Vec<ObjectId> = ids
            .iter()
            .filter_map(|id| ObjectId::parse_str(id).ok())
            .collect();
        if oids.is_empty() {
            return Ok(Vec::new());
        }

        let pipeline = vec![
            doc! { "$match": { "_id": { "$in": oids } } },
            doc! {
                "$group": {
                    "_id": "$achievementType",
                    "count": { "$sum": 1 },
                    "totalPoints": { "$sum": "$points" },
                }
            },
            doc! { "$sort": { "_id": 1 } },
        ];

        let groups: Vec<Document> = self.collection.aggregate(pipeline).await?.try_collect().await?;

        let mut stats = Vec::with_capacity(groups.len());
        for group in groups {
            let Some(achievement_type) = group
                .get_str("_id")
                .ok()
                .and_then(|t| t.parse::<AchievementType>().ok())
            else {
                warn!(group = ?group.get("_id"), "Skipping statistics group with unknown type");
                continue;
            };
            stats.push(TypeStatistic {
                achievement_type,
                count: bson_to_i64(group.get("count")).max(0) as u64,
                total_points: bson_to_i64(group.get("totalPoints")),
            });
        }
        stats.sort_by_key(|s| s.achievement_type);
        Ok(stats)
    }
}
