//! Visit memo endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::memo::{BookSuggestion, Memo, MemoInput, MemoQuery, TagCount},
};

use super::AuthenticatedUser;

/// Query for `GET /books/search`
#[derive(Debug, Deserialize, IntoParams)]
pub struct BookSearchQuery {
    /// Part of a title
    #[serde(default)]
    pub q: String,
}

/// List memos with filters, newest visit first
#[utoipa::path(
    get,
    path = "/memos",
    tag = "memos",
    security(("bearer_auth" = [])),
    params(MemoQuery),
    responses(
        (status = 200, description = "Memos", body = Vec<Memo>)
    )
)]
pub async fn list_memos(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<MemoQuery>,
) -> AppResult<Json<Vec<Memo>>> {
    let memos = state.services.memos.list(claims.user_id, &query).await?;
    Ok(Json(memos))
}

/// Get memo by ID
#[utoipa::path(
    get,
    path = "/memos/{id}",
    tag = "memos",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Memo ID")),
    responses(
        (status = 200, description = "Memo with its purchased books", body = Memo),
        (status = 404, description = "Memo not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_memo(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Memo>> {
    let memo = state.services.memos.get(claims.user_id, id).await?;
    Ok(Json(memo))
}

/// Create a memo
#[utoipa::path(
    post,
    path = "/memos",
    tag = "memos",
    security(("bearer_auth" = [])),
    request_body = MemoInput,
    responses(
        (status = 201, description = "Memo created", body = Memo),
        (status = 400, description = "Invalid memo", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_memo(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(input): Json<MemoInput>,
) -> AppResult<(StatusCode, Json<Memo>)> {
    let memo = state.services.memos.create(claims.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(memo)))
}

/// Replace a memo and its purchased books
#[utoipa::path(
    put,
    path = "/memos/{id}",
    tag = "memos",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Memo ID")),
    request_body = MemoInput,
    responses(
        (status = 200, description = "Memo updated", body = Memo),
        (status = 400, description = "Invalid memo", body = crate::error::ErrorResponse),
        (status = 404, description = "Memo not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_memo(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<MemoInput>,
) -> AppResult<Json<Memo>> {
    let memo = state.services.memos.update(claims.user_id, id, input).await?;
    Ok(Json(memo))
}

/// Delete a memo
#[utoipa::path(
    delete,
    path = "/memos/{id}",
    tag = "memos",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Memo ID")),
    responses(
        (status = 204, description = "Memo deleted"),
        (status = 404, description = "Memo not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_memo(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.memos.delete(claims.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Tags in use, most used first
#[utoipa::path(
    get,
    path = "/tags",
    tag = "memos",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Tags with counts", body = Vec<TagCount>)
    )
)]
pub async fn list_tags(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<TagCount>>> {
    let tags = state.services.memos.tags(claims.user_id).await?;
    Ok(Json(tags))
}

/// Title suggestions from books the user has sold before
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "memos",
    security(("bearer_auth" = [])),
    params(BookSearchQuery),
    responses(
        (status = 200, description = "Up to 10 suggestions", body = Vec<BookSuggestion>)
    )
)]
pub async fn search_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BookSearchQuery>,
) -> AppResult<Json<Vec<BookSuggestion>>> {
    let books = state.services.memos.search_books(claims.user_id, &query.q).await?;
    Ok(Json(books))
}
