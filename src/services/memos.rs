//! Visit memo service

use chrono::{Local, Timelike, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        enums::VisitTime,
        memo::{BookSuggestion, Memo, MemoInput, MemoQuery, TagCount},
        stats::LocalStats,
    },
    repository::Repository,
    services::aggregator,
};

#[derive(Clone)]
pub struct MemosService {
    repository: Repository,
}

impl MemosService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, user_id: Uuid, query: &MemoQuery) -> AppResult<Vec<Memo>> {
        self.repository.memos.list(user_id, query).await
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> AppResult<Memo> {
        self.repository.memos.get(user_id, id).await
    }

    /// Create a memo. Date and time slot default to "now".
    pub async fn create(&self, user_id: Uuid, input: MemoInput) -> AppResult<Memo> {
        let (memo, books) = input.into_records(Utc::now().date_naive(), current_slot())?;
        let created = self.repository.memos.create(user_id, &memo, &books).await?;
        tracing::info!("Memo {} created with {} books", created.id, created.purchased_books.len());
        Ok(created)
    }

    /// Replace a memo and its purchased books
    pub async fn update(&self, user_id: Uuid, id: Uuid, input: MemoInput) -> AppResult<Memo> {
        let (memo, books) = input.into_records(Utc::now().date_naive(), current_slot())?;
        self.repository.memos.update(user_id, id, &memo, &books).await
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        self.repository.memos.delete(user_id, id).await
    }

    pub async fn tags(&self, user_id: Uuid) -> AppResult<Vec<TagCount>> {
        self.repository.memos.tags_with_counts(user_id).await
    }

    pub async fn search_books(&self, user_id: Uuid, query: &str) -> AppResult<Vec<BookSuggestion>> {
        self.repository.memos.search_books(user_id, query).await
    }

    /// Dashboard statistics over every memo of the user
    pub async fn stats(&self, user_id: Uuid) -> AppResult<Option<LocalStats>> {
        let memos = self.repository.memos.list_all(user_id).await?;
        Ok(aggregator::aggregate(&memos))
    }
}

/// Time slot of the store's local clock
fn current_slot() -> VisitTime {
    VisitTime::from_hour(Local::now().hour())
}
