use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use common::config::DocumentBackend;
use common::document::{DocumentStore, InMemoryDocumentStore, MongoDocumentStore};
use server::config::{AppConfig, CorsConfig};
use server::records::AchievementService;
use server::records::sea_store::{SeaOrmDirectory, SeaOrmReferenceStore};
use server::state::AppState;
use server::{build_router, database, seed};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{Level, info, warn};

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(config.max_age))
}

async fn document_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let document = &config.document;
    let store: Arc<dyn DocumentStore> = match document.backend {
        DocumentBackend::Mongodb => Arc::new(
            MongoDocumentStore::connect(&document.uri, &document.database, &document.collection)
                .await?,
        ),
        DocumentBackend::Memory => {
            warn!("Using the in-memory document store; content is lost on restart");
            Arc::new(InMemoryDocumentStore::new())
        }
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database).await?;
    seed::seed_role_permissions(&db).await?;
    seed::ensure_indexes(&db).await?;

    let documents = document_store(&config).await?;
    let records = AchievementService::new(
        documents,
        Arc::new(SeaOrmReferenceStore::new(db.clone())),
        Arc::new(SeaOrmDirectory::new(db.clone())),
        &config.records,
    );

    let cors = cors_layer(&config.server.cors);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config,
        records,
    };
    let app = build_router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
