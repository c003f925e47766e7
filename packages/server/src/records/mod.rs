//! Achievement record lifecycle across the document and relational stores.

pub mod directory;
pub mod error;
pub mod input;
pub mod reference;
pub mod scope;
pub mod sea_store;
pub mod service;


pub use error::{RecordError, StoreFault};
pub use scope::{Caller, Scope};
pub use service::{Achievement, AchievementService, ListQuery, Page, Statistics};
