//! AI analysis endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        analysis::{
            AiAnalysisResult, AnalysisRequest, RecentAnalysesQuery, SaveAnalysisRequest,
            SavedAnalysis, WindowAnalysisRequest,
        },
        enums::AnalysisType,
    },
    services::analysis::check_batch,
};

use super::AuthenticatedUser;

/// Analyse a batch of memos supplied by the client
#[utoipa::path(
    post,
    path = "/ai-analysis",
    tag = "analysis",
    security(("bearer_auth" = [])),
    request_body = AnalysisRequest,
    responses(
        (status = 200, description = "Analysis result", body = AiAnalysisResult),
        (status = 400, description = "No memos, or more than 100", body = crate::error::ErrorResponse),
        (status = 500, description = "Provider missing or failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn analyze(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(request): Json<AnalysisRequest>,
) -> AppResult<Json<AiAnalysisResult>> {
    let memos = check_batch(request.memos.as_deref())?;
    let analysis_type = AnalysisType::from(request.analysis_type.as_deref());

    let result = state
        .services
        .analysis
        .analyze(memos, analysis_type)
        .await
        .map_err(AppError::into_analysis_failure)?;
    Ok(Json(result))
}

/// Analyse the stored memos of the weekly or monthly window
#[utoipa::path(
    post,
    path = "/ai-analysis/run",
    tag = "analysis",
    security(("bearer_auth" = [])),
    request_body = WindowAnalysisRequest,
    responses(
        (status = 200, description = "Analysis result", body = AiAnalysisResult),
        (status = 400, description = "No memos in the window", body = crate::error::ErrorResponse),
        (status = 500, description = "Provider missing or failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn analyze_window(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<WindowAnalysisRequest>,
) -> AppResult<Json<AiAnalysisResult>> {
    let analysis_type = AnalysisType::from(request.analysis_type.as_deref());

    let result = state
        .services
        .analysis
        .analyze_window(claims.user_id, analysis_type)
        .await
        .map_err(AppError::into_analysis_failure)?;
    Ok(Json(result))
}

/// Save an analysis result
#[utoipa::path(
    post,
    path = "/analyses",
    tag = "analysis",
    security(("bearer_auth" = [])),
    request_body = SaveAnalysisRequest,
    responses(
        (status = 201, description = "Analysis saved", body = SavedAnalysis)
    )
)]
pub async fn save_analysis(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<SaveAnalysisRequest>,
) -> AppResult<(StatusCode, Json<SavedAnalysis>)> {
    let saved = state.services.analysis.save(claims.user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Recently saved analyses, newest first
#[utoipa::path(
    get,
    path = "/analyses",
    tag = "analysis",
    security(("bearer_auth" = [])),
    params(RecentAnalysesQuery),
    responses(
        (status = 200, description = "Saved analyses", body = Vec<SavedAnalysis>)
    )
)]
pub async fn list_analyses(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<RecentAnalysesQuery>,
) -> AppResult<Json<Vec<SavedAnalysis>>> {
    let analyses = state.services.analysis.recent(claims.user_id, query.limit).await?;
    Ok(Json(analyses))
}
