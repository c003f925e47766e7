mod error;
mod traits;

pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;

pub use error::DocumentError;
pub use memory::InMemoryDocumentStore;
#[cfg(feature = "mongodb")]
pub use mongo::MongoDocumentStore;
pub use traits::DocumentStore;
