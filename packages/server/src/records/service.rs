use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::AchievementStatus;
use common::achievement::{AchievementContent, Attachment, NewAttachment, TypeStatistic};
use common::document::{DocumentError, DocumentStore};
use sea_orm::DbErr;
use serde::Serialize;
use tracing::{error, info, warn};

use super::directory::ProfileDirectory;
use super::error::RecordError;
use super::input::{AchievementUpdate, NewAchievement, ReviewAction, validate_attachment};
use super::reference::{
    AchievementReference, Guarded, NewReference, ReferenceFilter, ReferenceStore, Transition,
};
use super::scope::{self, Caller, Scope};
use crate::config::RecordsConfig;

/// A reference joined with its content.
#[derive(Clone, Debug, PartialEq)]
pub struct Achievement {
    pub reference: AchievementReference,
    /// Absent only in listings, when the pointed-at content is missing.
    pub content: Option<AchievementContent>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub status: Option<AchievementStatus>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct StatusCount {
    pub status: AchievementStatus,
    #[schema(example = 4)]
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statistics {
    pub by_type: Vec<TypeStatistic>,
    /// One entry per status, zero counts included.
    pub by_status: Vec<StatusCount>,
    /// Number of references in scope.
    pub total_achievements: u64,
    /// Sum of content points in scope.
    pub total_points: i64,
}

impl Statistics {
    fn empty() -> Self {
        Self::from_parts(Vec::new(), &[])
    }

    fn from_parts(by_type: Vec<TypeStatistic>, counts: &[(AchievementStatus, u64)]) -> Self {
        let by_status: Vec<StatusCount> = AchievementStatus::ALL
            .iter()
            .map(|&status| StatusCount {
                status,
                count: counts
                    .iter()
                    .filter(|(s, _)| *s == status)
                    .map(|(_, n)| n)
                    .sum(),
            })
            .collect();
        Self {
            total_achievements: by_status.iter().map(|s| s.count).sum(),
            total_points: by_type.iter().map(|t| t.total_points).sum(),
            by_type,
            by_status,
        }
    }
}

/// Composes the document and reference stores into one achievement lifecycle.
///
/// Every store call runs under the configured deadline; an elapsed deadline is
/// reported as `StoreUnavailable`.
#[derive(Clone)]
pub struct AchievementService {
    documents: Arc<dyn DocumentStore>,
    references: Arc<dyn ReferenceStore>,
    directory: Arc<dyn ProfileDirectory>,
    deadline: Duration,
    default_page_size: u64,
    max_page_size: u64,
}

impl AchievementService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        references: Arc<dyn ReferenceStore>,
        directory: Arc<dyn ProfileDirectory>,
        options: &RecordsConfig,
    ) -> Self {
        let max_page_size = options.max_page_size.max(1);
        Self {
            documents,
            references,
            directory,
            deadline: options.store_timeout(),
            default_page_size: options.default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    async fn relational<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, DbErr>>,
    ) -> Result<T, RecordError> {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result.map_err(|e| RecordError::relational(operation, e)),
            Err(_) => Err(RecordError::timeout("relational", operation, self.deadline)),
        }
    }

    async fn document<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, DocumentError>>,
    ) -> Result<T, RecordError> {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result.map_err(|e| RecordError::document(operation, e)),
            Err(_) => Err(RecordError::timeout("document", operation, self.deadline)),
        }
    }

    /// Like [`Self::document`], but a missing document is `None`.
    async fn document_lookup<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, DocumentError>>,
    ) -> Result<Option<T>, RecordError> {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(Ok(value)) => Ok(Some(value)),
            Ok(Err(e)) if e.is_not_found() => Ok(None),
            Ok(Err(e)) => Err(RecordError::document(operation, e)),
            Err(_) => Err(RecordError::timeout("document", operation, self.deadline)),
        }
    }

    async fn scope(&self, caller: &Caller) -> Result<Scope, RecordError> {
        self.relational("resolve scope", scope::resolve(self.directory.as_ref(), caller))
            .await
    }

    async fn load(
        &self,
        id: i32,
        operation: &'static str,
    ) -> Result<AchievementReference, RecordError> {
        self.relational(operation, self.references.get(id))
            .await?
            .ok_or_else(|| RecordError::NotFound(format!("Achievement {id}")))
    }

    /// Load a reference the caller owns through their student profile.
    async fn load_owned(
        &self,
        caller: &Caller,
        id: i32,
        operation: &'static str,
    ) -> Result<AchievementReference, RecordError> {
        let reference = self.load(id, operation).await?;
        let student = self
            .relational(operation, self.directory.find_student_by_user(caller.user_id))
            .await?;
        match student {
            Some(student) if student.id == reference.student_id => Ok(reference),
            _ => Err(RecordError::Unauthorized),
        }
    }

    fn dangling(reference: &AchievementReference) -> RecordError {
        error!(
            reference_id = reference.id,
            content_id = %reference.content_id,
            "Achievement reference points at missing content"
        );
        RecordError::DataIntegrity {
            reference_id: reference.id,
            content_id: reference.content_id.clone(),
        }
    }

    async fn content_of(
        &self,
        reference: &AchievementReference,
        operation: &'static str,
    ) -> Result<AchievementContent, RecordError> {
        self.document_lookup(operation, self.documents.get(&reference.content_id))
            .await?
            .ok_or_else(|| Self::dangling(reference))
    }

    /// Content writes are not fenced by the reference status; a submission can
    /// land between the status check and the document write. Re-read the
    /// reference after the write and warn if it is no longer editable.
    async fn recheck_editable(
        &self,
        reference: AchievementReference,
        operation: &'static str,
    ) -> AchievementReference {
        match self.relational(operation, self.references.get(reference.id)).await {
            Ok(Some(current)) => {
                if !current.status.is_editable() {
                    warn!(
                        reference_id = current.id,
                        status = %current.status,
                        operation,
                        "Content changed after the achievement left an editable status"
                    );
                }
                current
            }
            Ok(None) => {
                warn!(
                    reference_id = reference.id,
                    operation,
                    "Reference vanished while its content was being written"
                );
                reference
            }
            Err(e) => {
                warn!(
                    reference_id = reference.id,
                    operation,
                    error = %e,
                    "Could not re-read reference"
                );
                reference
            }
        }
    }

    async fn apply(
        &self,
        id: i32,
        transition: Transition,
    ) -> Result<AchievementReference, RecordError> {
        let operation = transition.verb();
        match self
            .relational(operation, self.references.transition(id, &transition))
            .await?
        {
            Guarded::Applied(reference) => {
                info!(reference_id = id, status = %reference.status, "Achievement {operation} applied");
                Ok(reference)
            }
            Guarded::Missing => Err(RecordError::NotFound(format!("Achievement {id}"))),
            Guarded::Stale(status) => Err(RecordError::InvalidState { operation, status }),
        }
    }

    /// Write content, then a draft reference pointing at it.
    pub async fn create(
        &self,
        caller: &Caller,
        request: NewAchievement,
    ) -> Result<Achievement, RecordError> {
        request.validate()?;

        let student = self
            .relational("create", self.directory.find_student_by_user(caller.user_id))
            .await?
            .ok_or_else(|| RecordError::NotFound("Student profile".into()))?;

        let content = self
            .document("create", self.documents.create(request.into_content(student.id)))
            .await?;

        let new = NewReference {
            student_id: student.id,
            content_id: content.id.clone(),
        };
        let reference = match self.relational("create", self.references.insert(new)).await {
            Ok(reference) => reference,
            Err(e) => {
                warn!(content_id = %content.id, "Reference write failed, content left orphaned");
                return Err(e);
            }
        };

        info!(
            reference_id = reference.id,
            content_id = %content.id,
            student_id = student.id,
            "Created achievement"
        );
        Ok(Achievement {
            reference,
            content: Some(content),
        })
    }

    pub async fn get(&self, caller: &Caller, id: i32) -> Result<Achievement, RecordError> {
        let reference = self.load(id, "get").await?;
        if !self.scope(caller).await?.contains(reference.student_id) {
            return Err(RecordError::Unauthorized);
        }
        let content = self.content_of(&reference, "get").await?;
        Ok(Achievement {
            reference,
            content: Some(content),
        })
    }

    /// Newest first. Missing content leaves the item's content unset.
    pub async fn list(
        &self,
        caller: &Caller,
        query: ListQuery,
    ) -> Result<Page<Achievement>, RecordError> {
        let page = Ord::max(query.page.unwrap_or(1), 1);
        let page_size = query
            .page_size
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size);

        let scope = self.scope(caller).await?;
        if scope.is_empty() {
            return Ok(Page {
                items: Vec::new(),
                page,
                page_size,
                total_items: 0,
                total_pages: 0,
            });
        }

        let filter = ReferenceFilter {
            owners: scope.owner_filter().map(<[i32]>::to_vec),
            status: query.status,
        };

        let total_items = self
            .relational("count achievements", self.references.count(&filter))
            .await?;
        let offset = (page - 1).saturating_mul(page_size);

        let references = if offset >= total_items {
            Vec::new()
        } else {
            self.relational(
                "list achievements",
                self.references.list(&filter, offset, page_size),
            )
            .await?
        };

        let ids: Vec<String> = references.iter().map(|r| r.content_id.clone()).collect();
        let mut contents = if ids.is_empty() {
            Default::default()
        } else {
            self.document("list achievements", self.documents.get_many(&ids))
                .await?
        };

        let items = references
            .into_iter()
            .map(|reference| {
                let content = contents.remove(&reference.content_id);
                if content.is_none() {
                    warn!(
                        reference_id = reference.id,
                        content_id = %reference.content_id,
                        "Listed achievement has no content"
                    );
                }
                Achievement { reference, content }
            })
            .collect();

        Ok(Page {
            items,
            page,
            page_size,
            total_items,
            total_pages: total_items.div_ceil(page_size),
        })
    }

    /// Replace mutable content fields. Reference status and timestamps stay put.
    pub async fn update(
        &self,
        caller: &Caller,
        id: i32,
        update: AchievementUpdate,
    ) -> Result<Achievement, RecordError> {
        update.validate()?;

        let reference = self.load_owned(caller, id, "update").await?;
        if !reference.status.is_editable() {
            return Err(RecordError::InvalidState {
                operation: "update",
                status: reference.status,
            });
        }

        let current = self.content_of(&reference, "update").await?;
        if let Some(details) = &update.details
            && details.achievement_type() != current.achievement_type
        {
            return Err(RecordError::InvalidInput(format!(
                "Achievement type is fixed; details must be for '{}'",
                current.achievement_type
            )));
        }

        self.document_lookup(
            "update",
            self.documents.update(&reference.content_id, update.into_patch()),
        )
        .await?
        .ok_or_else(|| Self::dangling(&reference))?;

        let content = self.content_of(&reference, "update").await?;
        let reference = self.recheck_editable(reference, "update").await;
        info!(reference_id = id, "Updated achievement content");
        Ok(Achievement {
            reference,
            content: Some(content),
        })
    }

    /// Remove content, then the reference. Draft only.
    pub async fn delete(&self, caller: &Caller, id: i32) -> Result<(), RecordError> {
        let reference = self.load_owned(caller, id, "delete").await?;
        if reference.status != AchievementStatus::Draft {
            return Err(RecordError::InvalidState {
                operation: "delete",
                status: reference.status,
            });
        }

        let removed = self
            .document_lookup("delete", self.documents.delete(&reference.content_id))
            .await?;
        if removed.is_none() {
            warn!(
                reference_id = id,
                content_id = %reference.content_id,
                "Content already absent, removing reference only"
            );
        }

        match self
            .relational(
                "delete",
                self.references.delete_if(id, AchievementStatus::Draft),
            )
            .await?
        {
            Guarded::Applied(()) => {
                info!(reference_id = id, "Deleted achievement");
                Ok(())
            }
            Guarded::Missing => Err(RecordError::NotFound(format!("Achievement {id}"))),
            Guarded::Stale(status) => {
                error!(
                    reference_id = id,
                    %status,
                    "Reference left the draft status after its content was deleted"
                );
                Err(RecordError::DataIntegrity {
                    reference_id: id,
                    content_id: reference.content_id,
                })
            }
        }
    }

    pub async fn submit(
        &self,
        caller: &Caller,
        id: i32,
    ) -> Result<AchievementReference, RecordError> {
        let reference = self.load_owned(caller, id, "submit").await?;
        self.apply(reference.id, Transition::Submit { at: Utc::now() })
            .await
    }

    /// Verify or reject a submitted achievement within the caller's scope.
    pub async fn verify(
        &self,
        caller: &Caller,
        id: i32,
        action: &str,
        note: Option<String>,
    ) -> Result<AchievementReference, RecordError> {
        let action: ReviewAction = action.parse()?;

        let reference = self.load(id, "verify").await?;
        if !caller.role.can_review() || !self.scope(caller).await?.contains(reference.student_id)
        {
            return Err(RecordError::Unauthorized);
        }

        let at = Utc::now();
        let transition = match action {
            ReviewAction::Verify => Transition::Verify {
                by: caller.user_id,
                at,
            },
            ReviewAction::Reject => Transition::Reject {
                by: caller.user_id,
                at,
                note: note
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty()),
            },
        };
        self.apply(reference.id, transition).await
    }

    /// Append an attachment descriptor while the content is still editable.
    pub async fn attach(
        &self,
        caller: &Caller,
        id: i32,
        attachment: NewAttachment,
    ) -> Result<Attachment, RecordError> {
        validate_attachment(&attachment)?;

        let reference = self.load_owned(caller, id, "attach").await?;
        if !reference.status.is_editable() {
            return Err(RecordError::InvalidState {
                operation: "attach files to",
                status: reference.status,
            });
        }

        let attachment = self
            .document_lookup(
                "attach",
                self.documents
                    .push_attachment(&reference.content_id, attachment),
            )
            .await?
            .ok_or_else(|| Self::dangling(&reference))?;

        self.recheck_editable(reference, "attach").await;
        info!(reference_id = id, file_name = %attachment.file_name, "Attached file");
        Ok(attachment)
    }

    pub async fn statistics(&self, caller: &Caller) -> Result<Statistics, RecordError> {
        let scope = self.scope(caller).await?;
        if scope.is_empty() {
            return Ok(Statistics::empty());
        }
        let owners = scope.owner_filter();

        // Aggregate only referenced content so orphans never count.
        let content_ids = self
            .relational("statistics", self.references.content_ids(owners))
            .await?;
        let counts = self
            .relational("statistics", self.references.counts_by_status(owners))
            .await?;
        let by_type = self
            .document("statistics", self.documents.statistics_by_type(&content_ids))
            .await?;

        Ok(Statistics::from_parts(by_type, &counts))
    }
}
