use serde::Deserialize;

/// Which [`DocumentStore`](crate::document::DocumentStore) implementation backs achievement content.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentBackend {
    Mongodb,
    Memory,
}

/// App-level document store configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct DocumentStoreConfig {
    /// Storage backend. Default: `mongodb`.
    #[serde(default = "default_backend")]
    pub backend: DocumentBackend,
    /// MongoDB connection URI. Default: "mongodb://localhost:27017".
    #[serde(default = "default_uri")]
    pub uri: String,
    /// Database name. Default: "achievement_db".
    #[serde(default = "default_database")]
    pub database: String,
    /// Collection holding achievement content. Default: "achievements".
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_backend() -> DocumentBackend {
    DocumentBackend::Mongodb
}
fn default_uri() -> String {
    "mongodb://localhost:27017".into()
}
fn default_database() -> String {
    "achievement_db".into()
}
fn default_collection() -> String {
    "achievements".into()
}

impl Default for DocumentStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            uri: default_uri(),
            database: default_database(),
            collection: default_collection(),
        }
    }
}
