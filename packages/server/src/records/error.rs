use std::time::Duration;

use common::AchievementStatus;
use common::document::DocumentError;
use sea_orm::DbErr;

/// Failure of a single store call, kept as the store reported it.
#[derive(Debug, thiserror::Error)]
pub enum StoreFault {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Relational(#[from] DbErr),
    #[error("no answer within {0:?}")]
    Timeout(Duration),
}

/// Outcome kinds of a record service operation.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Reference, content, or caller profile absent.
    #[error("{0} not found")]
    NotFound(String),
    /// Authenticated but not permitted for this record.
    #[error("Not permitted to act on this achievement")]
    Unauthorized,
    #[error("Cannot {operation} an achievement that is {status}")]
    InvalidState {
        operation: &'static str,
        status: AchievementStatus,
    },
    #[error("{0}")]
    InvalidInput(String),
    /// A reference points at content the document store does not have.
    #[error("Achievement {reference_id} points at missing content {content_id}")]
    DataIntegrity {
        reference_id: i32,
        content_id: String,
    },
    #[error("{store} store unavailable during {operation}")]
    StoreUnavailable {
        store: &'static str,
        operation: &'static str,
        #[source]
        source: StoreFault,
    },
}

impl RecordError {
    pub(crate) fn document(operation: &'static str, err: DocumentError) -> Self {
        Self::StoreUnavailable {
            store: "document",
            operation,
            source: StoreFault::Document(err),
        }
    }

    pub(crate) fn relational(operation: &'static str, err: DbErr) -> Self {
        Self::StoreUnavailable {
            store: "relational",
            operation,
            source: StoreFault::Relational(err),
        }
    }

    pub(crate) fn timeout(store: &'static str, operation: &'static str, after: Duration) -> Self {
        Self::StoreUnavailable {
            store,
            operation,
            source: StoreFault::Timeout(after),
        }
    }
}
