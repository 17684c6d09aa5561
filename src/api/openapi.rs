//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{analysis, auth, health, memos, stats, weather};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookstore Journal API",
        version = "0.3.0",
        description = "Visit memos, local statistics and AI analysis for an independent bookstore",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::signup,
        auth::login,
        auth::me,
        // Memos
        memos::list_memos,
        memos::get_memo,
        memos::create_memo,
        memos::update_memo,
        memos::delete_memo,
        memos::list_tags,
        memos::search_books,
        // Stats
        stats::get_stats,
        // Analysis
        analysis::analyze,
        analysis::analyze_window,
        analysis::save_analysis,
        analysis::list_analyses,
        // Weather
        weather::current_weather,
        weather::historical_weather,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::User,
            crate::models::user::Credentials,
            crate::models::user::AuthResponse,
            // Memos
            crate::models::memo::Memo,
            crate::models::memo::PurchasedBook,
            crate::models::memo::MemoInput,
            crate::models::memo::BookInput,
            crate::models::memo::TagCount,
            crate::models::memo::BookSuggestion,
            crate::models::enums::VisitTime,
            crate::models::enums::Mood,
            crate::models::enums::WeatherCode,
            crate::models::enums::Genre,
            crate::models::enums::AnalysisType,
            // Stats
            crate::models::stats::LocalStats,
            crate::models::stats::WeekdayCount,
            // Analysis
            crate::models::analysis::AnalysisRequest,
            crate::models::analysis::WindowAnalysisRequest,
            crate::models::analysis::SaveAnalysisRequest,
            crate::models::analysis::AiAnalysisResult,
            crate::models::analysis::SavedAnalysis,
            crate::models::analysis::Insight,
            crate::models::analysis::Recommendation,
            // Weather
            crate::models::weather::WeatherReading,
            crate::models::weather::RawWeather,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "memos", description = "Visit memos, tags and book suggestions"),
        (name = "stats", description = "Statistics"),
        (name = "analysis", description = "AI analysis of visit memos"),
        (name = "weather", description = "Weather lookup for memos")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/auth/signup",
            "/memos",
            "/memos/{id}",
            "/tags",
            "/books/search",
            "/stats",
            "/ai-analysis",
            "/ai-analysis/run",
            "/analyses",
            "/weather",
            "/weather/historical",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
