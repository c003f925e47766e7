/// Errors raised by a [`DocumentStore`](super::DocumentStore).
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// No document exists with the given identifier.
    #[error("document not found: {0}")]
    NotFound(String),
    /// The backing store could not be reached or refused the operation.
    #[error("document store error: {0}")]
    Backend(String),
    /// A document could not be converted to or from its stored form.
    #[error("document encoding error: {0}")]
    Encoding(String),
}

impl DocumentError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for DocumentError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

#[cfg(feature = "mongodb")]
impl From<bson::ser::Error> for DocumentError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}
