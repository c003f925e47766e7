mod v1;

use utoipa_axum::router::OpenApiRouter;

use crate::state::AppState;

/// Versioned API, mounted under `/api` by [`crate::build_router`].
pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1::routes())
}
