//! Memos repository

use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::memo::{BookRecord, BookSuggestion, Memo, MemoQuery, MemoRecord, PurchasedBook, TagCount},
};

/// Page size when the caller gives no limit
const DEFAULT_LIMIT: i64 = 50;
/// Number of catalog suggestions returned by the title search
const SUGGESTION_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct MemosRepository {
    pool: Pool<Postgres>,
}

impl MemosRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List memos with optional filters, newest visit first
    pub async fn list(&self, user_id: Uuid, query: &MemoQuery) -> AppResult<Vec<Memo>> {
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).max(1);
        let offset = query.offset.unwrap_or(0).max(0);

        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));
        let tag = query
            .tag
            .as_deref()
            .map(|t| t.trim().trim_start_matches('#'))
            .filter(|t| !t.is_empty());

        let mut conditions = vec!["user_id = $1".to_string()];
        let mut idx = 2;

        if search.is_some() {
            conditions.push(format!(
                "(customer_impression ILIKE ${i} OR customer_tag ILIKE ${i} \
                 OR owner_note ILIKE ${i} OR browsing_note ILIKE ${i})",
                i = idx
            ));
            idx += 1;
        }
        if tag.is_some() {
            conditions.push(format!("${} = ANY(tags)", idx));
            idx += 1;
        }
        if query.date_from.is_some() {
            conditions.push(format!("visit_date >= ${}", idx));
            idx += 1;
        }
        if query.date_to.is_some() {
            conditions.push(format!("visit_date <= ${}", idx));
        }

        let select_q = format!(
            "SELECT * FROM memos WHERE {} ORDER BY visit_date DESC, created_at DESC LIMIT {} OFFSET {}",
            conditions.join(" AND "),
            limit,
            offset
        );

        let mut builder = sqlx::query_as::<_, Memo>(&select_q).bind(user_id);
        if let Some(ref s) = search { builder = builder.bind(s); }
        if let Some(t) = tag { builder = builder.bind(t); }
        if let Some(from) = query.date_from { builder = builder.bind(from); }
        if let Some(to) = query.date_to { builder = builder.bind(to); }

        let mut memos = builder.fetch_all(&self.pool).await?;
        self.attach_books(&mut memos).await?;
        Ok(memos)
    }

    /// Every memo of the user, newest visit first
    pub async fn list_all(&self, user_id: Uuid) -> AppResult<Vec<Memo>> {
        let mut memos = sqlx::query_as::<_, Memo>(
            "SELECT * FROM memos WHERE user_id = $1 ORDER BY visit_date DESC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.attach_books(&mut memos).await?;
        Ok(memos)
    }

    /// Get memo by ID
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> AppResult<Memo> {
        let memo = sqlx::query_as::<_, Memo>("SELECT * FROM memos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Memo {} not found", id)))?;

        let mut memos = vec![memo];
        self.attach_books(&mut memos).await?;
        Ok(memos.remove(0))
    }

    /// Create a memo together with its purchased books
    pub async fn create(&self, user_id: Uuid, memo: &MemoRecord, books: &[BookRecord]) -> AppResult<Memo> {
        let mut tx = self.pool.begin().await?;

        let mut created = sqlx::query_as::<_, Memo>(
            r#"
            INSERT INTO memos (
                id, user_id, visit_date, visit_time, weather, weather_detail,
                weather_temp, weather_humidity, weather_auto_fetched,
                customer_impression, customer_tag, browsing_note, owner_note,
                mood, tags, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(memo.visit_date)
        .bind(memo.visit_time)
        .bind(memo.weather)
        .bind(&memo.weather_detail)
        .bind(memo.weather_temp)
        .bind(memo.weather_humidity)
        .bind(memo.weather_auto_fetched)
        .bind(&memo.customer_impression)
        .bind(&memo.customer_tag)
        .bind(&memo.browsing_note)
        .bind(&memo.owner_note)
        .bind(memo.mood)
        .bind(&memo.tags)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        created.purchased_books = Self::insert_books(&mut tx, user_id, created.id, books).await?;

        tx.commit().await?;
        Ok(created)
    }

    /// Replace a memo's fields and its complete set of purchased books
    pub async fn update(&self, user_id: Uuid, id: Uuid, memo: &MemoRecord, books: &[BookRecord]) -> AppResult<Memo> {
        let mut tx = self.pool.begin().await?;

        let mut updated = Self::update_fields(&mut tx, user_id, id, memo).await?;
        updated.purchased_books = Self::replace_books(&mut tx, user_id, id, books).await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn update_fields(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        id: Uuid,
        memo: &MemoRecord,
    ) -> AppResult<Memo> {
        sqlx::query_as::<_, Memo>(
            r#"
            UPDATE memos SET
                visit_date = $3, visit_time = $4, weather = $5, weather_detail = $6,
                weather_temp = $7, weather_humidity = $8, weather_auto_fetched = $9,
                customer_impression = $10, customer_tag = $11, browsing_note = $12,
                owner_note = $13, mood = $14, tags = $15, updated_at = $16
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(memo.visit_date)
        .bind(memo.visit_time)
        .bind(memo.weather)
        .bind(&memo.weather_detail)
        .bind(memo.weather_temp)
        .bind(memo.weather_humidity)
        .bind(memo.weather_auto_fetched)
        .bind(&memo.customer_impression)
        .bind(&memo.customer_tag)
        .bind(&memo.browsing_note)
        .bind(&memo.owner_note)
        .bind(memo.mood)
        .bind(&memo.tags)
        .bind(Utc::now())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Memo {} not found", id)))
    }

    async fn replace_books(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        memo_id: Uuid,
        books: &[BookRecord],
    ) -> AppResult<Vec<PurchasedBook>> {
        sqlx::query("DELETE FROM purchased_books WHERE memo_id = $1")
            .bind(memo_id)
            .execute(&mut **tx)
            .await?;

        Self::insert_books(tx, user_id, memo_id, books).await
    }

    /// Insert line items in order and count each sale in the user's catalog
    async fn insert_books(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        memo_id: Uuid,
        books: &[BookRecord],
    ) -> AppResult<Vec<PurchasedBook>> {
        let mut inserted = Vec::with_capacity(books.len());

        for (position, book) in books.iter().enumerate() {
            let row = sqlx::query_as::<_, PurchasedBook>(
                r#"
                INSERT INTO purchased_books (id, memo_id, title, author, genre, price, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, memo_id, title, author, genre, price
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(memo_id)
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.genre)
            .bind(book.price)
            .bind(position as i32)
            .fetch_one(&mut **tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO books_master (user_id, title, author, genre, times_purchased)
                VALUES ($1, $2, $3, $4, 1)
                ON CONFLICT (user_id, title, author)
                DO UPDATE SET times_purchased = books_master.times_purchased + 1, genre = EXCLUDED.genre
                "#,
            )
            .bind(user_id)
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.genre)
            .execute(&mut **tx)
            .await?;

            inserted.push(row);
        }

        Ok(inserted)
    }

    /// Delete a memo (its books go with it)
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM memos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Memo {} not found", id)));
        }
        Ok(())
    }

    /// Tags in use with their counts, most used first
    pub async fn tags_with_counts(&self, user_id: Uuid) -> AppResult<Vec<TagCount>> {
        let rows = sqlx::query_as::<_, TagCount>(
            r#"
            SELECT tag, COUNT(*) AS count
            FROM memos, unnest(tags) AS tag
            WHERE user_id = $1
            GROUP BY tag
            ORDER BY count DESC, tag ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Titles from the user's catalog containing `query`, best sellers first
    pub async fn search_books(&self, user_id: Uuid, query: &str) -> AppResult<Vec<BookSuggestion>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, BookSuggestion>(
            r#"
            SELECT title, author, genre
            FROM books_master
            WHERE user_id = $1 AND title ILIKE $2
            ORDER BY times_purchased DESC, title ASC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(format!("%{}%", query))
        .bind(SUGGESTION_LIMIT)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Load purchased books for a page of memos in one query
    async fn attach_books(&self, memos: &mut [Memo]) -> AppResult<()> {
        if memos.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = memos.iter().map(|m| m.id).collect();
        let books = sqlx::query_as::<_, PurchasedBook>(
            r#"
            SELECT id, memo_id, title, author, genre, price
            FROM purchased_books
            WHERE memo_id = ANY($1)
            ORDER BY position ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        for book in books {
            if let Some(memo) = memos.iter_mut().find(|m| m.id == book.memo_id) {
                memo.purchased_books.push(book);
            }
        }
        Ok(())
    }
}
