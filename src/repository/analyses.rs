//! Saved AI analyses repository

use chrono::Utc;
use sqlx::{types::Json as SqlJson, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::analysis::{SaveAnalysisRequest, SavedAnalysis},
};

#[derive(Clone)]
pub struct AnalysesRepository {
    pool: Pool<Postgres>,
}

impl AnalysesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Persist an analysis result
    pub async fn create(&self, user_id: Uuid, data: &SaveAnalysisRequest) -> AppResult<SavedAnalysis> {
        let result = &data.result;

        let row = sqlx::query_as::<_, SavedAnalysis>(
            r#"
            INSERT INTO ai_analyses (
                id, user_id, analysis_type, summary, insights, recommendations,
                fun_fact, memo_count, raw_response, parse_error, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(data.analysis_type)
        .bind(&result.summary)
        .bind(SqlJson(&result.insights))
        .bind(SqlJson(&result.recommendations))
        .bind(&result.fun_fact)
        .bind(i32::try_from(result.memo_count).unwrap_or(i32::MAX))
        .bind(&result.raw_response)
        .bind(result.parse_error)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Most recent analyses first
    pub async fn recent(&self, user_id: Uuid, limit: i64) -> AppResult<Vec<SavedAnalysis>> {
        let rows = sqlx::query_as::<_, SavedAnalysis>(
            "SELECT * FROM ai_analyses WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
