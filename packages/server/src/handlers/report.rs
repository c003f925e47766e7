use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::achievement::StatisticsResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/statistics",
    tag = "Reports",
    operation_id = "getStatistics",
    summary = "Achievement statistics for the caller's scope",
    description = "Count and summed points per achievement type, count per status, and totals. Students get their own figures, advisors their advisees', admins everyone's. A caller without a profile gets zeros.",
    responses(
        (status = 200, description = "Statistics", body = StatisticsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Unknown role (PERMISSION_DENIED)", body = ErrorBody),
        (status = 503, description = "Store unavailable (STORE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn statistics(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StatisticsResponse>, AppError> {
    let caller = auth_user.caller()?;
    let stats = state.records.statistics(&caller).await?;
    Ok(Json(stats.into()))
}
