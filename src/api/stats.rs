//! Statistics endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, models::stats::LocalStats};

use super::AuthenticatedUser;

/// Dashboard statistics over all memos (`null` when there are none)
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Local statistics", body = Option<LocalStats>)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Option<LocalStats>>> {
    let stats = state.services.memos.stats(claims.user_id).await?;
    Ok(Json(stats))
}
