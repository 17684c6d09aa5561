//! Visit memo and purchased-book models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicode_normalization::UnicodeNormalization;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::enums::{Genre, Mood, VisitTime, WeatherCode};

/// One observed store visit
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Memo {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Uuid,
    pub visit_date: NaiveDate,
    #[serde(default)]
    pub visit_time: VisitTime,
    #[serde(default)]
    pub weather: WeatherCode,
    /// Human readable weather description
    #[serde(default)]
    pub weather_detail: String,
    /// Temperature in °C
    pub weather_temp: Option<f64>,
    /// Relative humidity in percent
    pub weather_humidity: Option<i32>,
    #[serde(default)]
    pub weather_auto_fetched: bool,
    pub customer_impression: String,
    /// Nickname used to recognise returning customers
    pub customer_tag: Option<String>,
    #[serde(default)]
    pub browsing_note: String,
    #[serde(default)]
    pub owner_note: String,
    #[serde(default)]
    pub mood: Mood,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    #[serde(default)]
    pub purchased_books: Vec<PurchasedBook>,
}

/// A book sold during a visit
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PurchasedBook {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub memo_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: Genre,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
}

/// Book line item as submitted by the client
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookInput {
    #[serde(default)]
    pub title: String,
    pub author: Option<String>,
    pub genre: Option<Genre>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
}

/// Create or fully replace a memo. `purchased_books` is the complete desired set.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MemoInput {
    /// Visit date (defaults to today)
    pub visit_date: Option<NaiveDate>,
    /// Time slot (defaults to the current slot)
    pub visit_time: Option<VisitTime>,
    pub weather: Option<WeatherCode>,
    pub weather_detail: Option<String>,
    pub weather_temp: Option<f64>,
    pub weather_humidity: Option<i32>,
    #[serde(default)]
    pub weather_auto_fetched: bool,
    #[serde(default)]
    pub customer_impression: String,
    pub customer_tag: Option<String>,
    pub browsing_note: Option<String>,
    pub owner_note: Option<String>,
    pub mood: Option<Mood>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub purchased_books: Vec<BookInput>,
}

/// Memo fields ready to be written, after validation and normalisation
#[derive(Debug, Clone, PartialEq)]
pub struct MemoRecord {
    pub visit_date: NaiveDate,
    pub visit_time: VisitTime,
    pub weather: WeatherCode,
    pub weather_detail: String,
    pub weather_temp: Option<f64>,
    pub weather_humidity: Option<i32>,
    pub weather_auto_fetched: bool,
    pub customer_impression: String,
    pub customer_tag: Option<String>,
    pub browsing_note: String,
    pub owner_note: String,
    pub mood: Mood,
    pub tags: Vec<String>,
}

/// Line item ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub price: Option<Decimal>,
}

impl MemoInput {
    /// Validate and normalise the submitted memo.
    ///
    /// `today` and `now_slot` fill in the date and time slot when absent.
    pub fn into_records(
        self,
        today: NaiveDate,
        now_slot: VisitTime,
    ) -> AppResult<(MemoRecord, Vec<BookRecord>)> {
        let customer_impression = self.customer_impression.trim().to_string();
        if customer_impression.is_empty() {
            return Err(AppError::Validation(
                "customer_impression must not be empty".to_string(),
            ));
        }

        if let Some(h) = self.weather_humidity {
            if !(0..=100).contains(&h) {
                return Err(AppError::Validation(format!(
                    "weather_humidity must be between 0 and 100, got {}",
                    h
                )));
            }
        }

        let books = self
            .purchased_books
            .into_iter()
            .filter(|b| !b.title.trim().is_empty())
            .map(BookInput::into_record)
            .collect::<AppResult<Vec<_>>>()?;

        let memo = MemoRecord {
            visit_date: self.visit_date.unwrap_or(today),
            visit_time: self.visit_time.unwrap_or(now_slot),
            weather: self.weather.unwrap_or_default(),
            weather_detail: self.weather_detail.unwrap_or_default(),
            weather_temp: self.weather_temp,
            weather_humidity: self.weather_humidity,
            weather_auto_fetched: self.weather_auto_fetched,
            customer_impression,
            customer_tag: self
                .customer_tag
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            browsing_note: self.browsing_note.unwrap_or_default(),
            owner_note: self.owner_note.unwrap_or_default(),
            mood: self.mood.unwrap_or_default(),
            tags: normalize_tags(self.tags),
        };

        Ok((memo, books))
    }
}

impl BookInput {
    fn into_record(self) -> AppResult<BookRecord> {
        if let Some(price) = self.price {
            if price.is_sign_negative() && !price.is_zero() {
                return Err(AppError::Validation(format!(
                    "price of \"{}\" must not be negative",
                    self.title.trim()
                )));
            }
        }

        Ok(BookRecord {
            title: self.title.trim().to_string(),
            author: self.author.map(|a| a.trim().to_string()).unwrap_or_default(),
            genre: self.genre.unwrap_or_default(),
            // A zero price means "not recorded"
            price: self.price.filter(|p| !p.is_zero()),
        })
    }
}

/// Strip a leading '#', trim, NFC-normalise and de-duplicate tags.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag: String = tag.trim().trim_start_matches('#').trim().nfc().collect();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Memo list filters
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct MemoQuery {
    /// Free text matched against impression, nickname, owner note and browsing note
    pub search: Option<String>,
    /// Only memos carrying this tag
    pub tag: Option<String>,
    /// Earliest visit date (inclusive)
    pub date_from: Option<NaiveDate>,
    /// Latest visit date (inclusive)
    pub date_to: Option<NaiveDate>,
    /// Maximum number of memos (default 50)
    pub limit: Option<i64>,
    /// Number of memos to skip
    pub offset: Option<i64>,
}

/// Tag with its number of uses
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// Book title suggestion from the sales catalog
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BookSuggestion {
    pub title: String,
    pub author: String,
    pub genre: Genre,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn input(impression: &str) -> MemoInput {
        MemoInput {
            visit_date: None,
            visit_time: None,
            weather: None,
            weather_detail: None,
            weather_temp: None,
            weather_humidity: None,
            weather_auto_fetched: false,
            customer_impression: impression.to_string(),
            customer_tag: None,
            browsing_note: None,
            owner_note: None,
            mood: None,
            tags: vec![],
            purchased_books: vec![],
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_blank_impression_is_rejected() {
        let result = input("   ").into_records(today(), VisitTime::Morning);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_defaults_are_filled() {
        let (memo, books) = input(" 조용히 시집을 고른 손님 ")
            .into_records(today(), VisitTime::Lunch)
            .unwrap();
        assert_eq!(memo.visit_date, today());
        assert_eq!(memo.visit_time, VisitTime::Lunch);
        assert_eq!(memo.weather, WeatherCode::Sunny);
        assert_eq!(memo.mood, Mood::Normal);
        assert_eq!(memo.customer_impression, "조용히 시집을 고른 손님");
        assert!(books.is_empty());
    }

    #[test]
    fn test_books_without_title_are_dropped() {
        let mut memo = input("단골");
        memo.purchased_books = vec![
            BookInput {
                title: "소년이 온다".to_string(),
                author: Some("한강".to_string()),
                genre: Some(Genre::KoreanLiterature),
                price: Some(Decimal::from_str("15000").unwrap()),
            },
            BookInput {
                title: "  ".to_string(),
                ..BookInput::default()
            },
            BookInput {
                title: "무제".to_string(),
                price: Some(Decimal::ZERO),
                ..BookInput::default()
            },
        ];

        let (_, books) = memo.into_records(today(), VisitTime::Evening).unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].author, "한강");
        assert_eq!(books[1].genre, Genre::Other);
        assert_eq!(books[1].author, "");
        assert_eq!(books[1].price, None);
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let mut memo = input("단골");
        memo.purchased_books = vec![BookInput {
            title: "데미안".to_string(),
            price: Some(Decimal::from_str("-1").unwrap()),
            ..BookInput::default()
        }];
        let result = memo.into_records(today(), VisitTime::Evening);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_blank_customer_tag_becomes_none() {
        let mut memo = input("처음 온 손님");
        memo.customer_tag = Some("  ".to_string());
        let (record, _) = memo.into_records(today(), VisitTime::Morning).unwrap();
        assert_eq!(record.customer_tag, None);
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(vec![
            "#시집".to_string(),
            " 시집 ".to_string(),
            "".to_string(),
            "#".to_string(),
            "선물".to_string(),
        ]);
        assert_eq!(tags, vec!["시집".to_string(), "선물".to_string()]);
    }
}
