//! Dashboard statistics computed from memos

use std::collections::BTreeMap;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use super::enums::{Genre, Mood, VisitTime, WeatherCode};

/// Aggregate view over a set of memos. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LocalStats {
    pub total_memos: usize,
    pub total_books: usize,
    /// Books per genre, in first-seen order
    #[schema(value_type = Object)]
    pub genre_counts: IndexMap<Genre, usize>,
    #[schema(value_type = Object)]
    pub weather_counts: IndexMap<WeatherCode, usize>,
    /// Every slot, morning first
    #[schema(value_type = Object)]
    pub time_counts: IndexMap<VisitTime, usize>,
    /// Every mood, quiet first
    #[schema(value_type = Object)]
    pub mood_counts: IndexMap<Mood, usize>,
    #[schema(value_type = Object)]
    pub tag_counts: IndexMap<String, usize>,
    /// Memos per customer nickname
    #[schema(value_type = Object)]
    pub customer_tags: IndexMap<String, usize>,
    #[schema(value_type = Object)]
    pub daily_counts: BTreeMap<NaiveDate, usize>,
    /// Indexed by weekday, 0 = Sunday
    #[schema(value_type = Vec<u64>)]
    pub weekday_counts: [usize; 7],
    /// Nicknames seen at least twice, most frequent first
    #[schema(value_type = Vec<Object>)]
    pub returning_customers: Vec<(String, usize)>,
    #[schema(value_type = Vec<Object>)]
    pub top_genres: Vec<(Genre, usize)>,
    #[schema(value_type = Object)]
    pub peak_time: (VisitTime, usize),
    /// All seven weekdays, busiest first
    pub peak_weekday: Vec<WeekdayCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeekdayCount {
    /// 0 = Sunday
    pub weekday: u32,
    /// Korean day name
    pub day: String,
    pub count: usize,
}
