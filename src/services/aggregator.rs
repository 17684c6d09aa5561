//! Local statistics over a memo collection

use chrono::Datelike;
use indexmap::IndexMap;

use crate::models::{
    enums::{Mood, VisitTime, DAY_NAMES},
    memo::Memo,
    stats::{LocalStats, WeekdayCount},
};

/// Number of genres reported in `top_genres`
const TOP_GENRES: usize = 5;

/// Tally memos into dashboard statistics.
///
/// Returns `None` when there is nothing to aggregate.
pub fn aggregate(memos: &[Memo]) -> Option<LocalStats> {
    if memos.is_empty() {
        return None;
    }

    let mut total_books = 0;
    let mut genre_counts = IndexMap::new();
    let mut weather_counts = IndexMap::new();
    let mut time_counts: IndexMap<VisitTime, usize> =
        VisitTime::ALL.iter().map(|t| (*t, 0)).collect();
    let mut mood_counts: IndexMap<Mood, usize> = Mood::ALL.iter().map(|m| (*m, 0)).collect();
    let mut tag_counts: IndexMap<String, usize> = IndexMap::new();
    let mut customer_tags: IndexMap<String, usize> = IndexMap::new();
    let mut daily_counts = std::collections::BTreeMap::new();
    let mut weekday_counts = [0usize; 7];

    for memo in memos {
        *time_counts.entry(memo.visit_time).or_insert(0) += 1;
        *weather_counts.entry(memo.weather).or_insert(0) += 1;
        *mood_counts.entry(memo.mood).or_insert(0) += 1;

        for tag in &memo.tags {
            *tag_counts.entry(tag.clone()).or_insert(0) += 1;
        }

        if let Some(nickname) = memo.customer_tag.as_deref().filter(|t| !t.trim().is_empty()) {
            *customer_tags.entry(nickname.to_string()).or_insert(0) += 1;
        }

        *daily_counts.entry(memo.visit_date).or_insert(0) += 1;
        weekday_counts[memo.visit_date.weekday().num_days_from_sunday() as usize] += 1;

        for book in &memo.purchased_books {
            total_books += 1;
            *genre_counts.entry(book.genre).or_insert(0) += 1;
        }
    }

    // sort_by is stable: ties keep first-seen order
    let mut returning_customers: Vec<(String, usize)> = customer_tags
        .iter()
        .filter(|(_, count)| **count >= 2)
        .map(|(tag, count)| (tag.clone(), *count))
        .collect();
    returning_customers.sort_by(|a, b| b.1.cmp(&a.1));

    let mut top_genres: Vec<_> = genre_counts.iter().map(|(g, c)| (*g, *c)).collect();
    top_genres.sort_by(|a, b| b.1.cmp(&a.1));
    top_genres.truncate(TOP_GENRES);

    let peak_time = time_counts
        .iter()
        .fold(None, |best: Option<(VisitTime, usize)>, (slot, count)| match best {
            Some((_, best_count)) if best_count >= *count => best,
            _ => Some((*slot, *count)),
        })
        .unwrap_or((VisitTime::Morning, 0));

    let mut peak_weekday: Vec<WeekdayCount> = weekday_counts
        .iter()
        .enumerate()
        .map(|(day, count)| WeekdayCount {
            weekday: day as u32,
            day: DAY_NAMES[day].to_string(),
            count: *count,
        })
        .collect();
    peak_weekday.sort_by(|a, b| b.count.cmp(&a.count));

    Some(LocalStats {
        total_memos: memos.len(),
        total_books,
        genre_counts,
        weather_counts,
        time_counts,
        mood_counts,
        tag_counts,
        customer_tags,
        daily_counts,
        weekday_counts,
        returning_customers,
        top_genres,
        peak_time,
        peak_weekday,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        enums::{Genre, WeatherCode},
        memo::PurchasedBook,
    };
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn memo(date: &str, slot: VisitTime, customer_tag: Option<&str>) -> Memo {
        Memo {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            visit_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            visit_time: slot,
            weather: WeatherCode::Sunny,
            weather_detail: String::new(),
            weather_temp: None,
            weather_humidity: None,
            weather_auto_fetched: false,
            customer_impression: "책을 오래 구경한 손님".to_string(),
            customer_tag: customer_tag.map(str::to_string),
            browsing_note: String::new(),
            owner_note: String::new(),
            mood: Mood::Normal,
            tags: vec![],
            created_at: None,
            updated_at: None,
            purchased_books: vec![],
        }
    }

    fn book(title: &str, genre: Genre) -> PurchasedBook {
        PurchasedBook {
            id: Uuid::new_v4(),
            memo_id: Uuid::nil(),
            title: title.to_string(),
            author: String::new(),
            genre,
            price: None,
        }
    }

    #[test]
    fn test_empty_input_has_no_stats() {
        assert!(aggregate(&[]).is_none());
    }

    #[test]
    fn test_totals() {
        let mut a = memo("2025-03-10", VisitTime::Morning, None);
        a.purchased_books = vec![book("토지", Genre::KoreanLiterature), book("코스모스", Genre::Science)];
        let mut b = memo("2025-03-11", VisitTime::Evening, None);
        b.purchased_books = vec![book("채식주의자", Genre::KoreanLiterature)];
        let c = memo("2025-03-12", VisitTime::Evening, None);

        let stats = aggregate(&[a, b, c]).unwrap();
        assert_eq!(stats.total_memos, 3);
        assert_eq!(stats.total_books, 3);
        assert_eq!(stats.genre_counts[&Genre::KoreanLiterature], 2);
        assert_eq!(stats.top_genres[0], (Genre::KoreanLiterature, 2));
        assert_eq!(stats.top_genres[1], (Genre::Science, 1));
    }

    #[test]
    fn test_returning_customer_scenario() {
        let memos = vec![
            memo("2025-03-10", VisitTime::Afternoon, Some("토지 아주머니")),
            memo("2025-03-12", VisitTime::Afternoon, Some("토지 아주머니")),
            memo("2025-03-13", VisitTime::Lunch, Some("안경 학생")),
        ];

        let stats = aggregate(&memos).unwrap();
        assert_eq!(stats.total_memos, 3);
        assert_eq!(stats.returning_customers, vec![("토지 아주머니".to_string(), 2)]);
        assert_eq!(stats.customer_tags["안경 학생"], 1);
    }

    #[test]
    fn test_returning_customers_sorted_with_stable_ties() {
        let memos = vec![
            memo("2025-03-01", VisitTime::Morning, Some("A")),
            memo("2025-03-01", VisitTime::Morning, Some("B")),
            memo("2025-03-02", VisitTime::Morning, Some("B")),
            memo("2025-03-02", VisitTime::Morning, Some("A")),
            memo("2025-03-03", VisitTime::Morning, Some("C")),
            memo("2025-03-03", VisitTime::Morning, Some("C")),
            memo("2025-03-04", VisitTime::Morning, Some("C")),
        ];

        let stats = aggregate(&memos).unwrap();
        assert_eq!(
            stats.returning_customers,
            vec![("C".to_string(), 3), ("A".to_string(), 2), ("B".to_string(), 2)]
        );
    }

    #[test]
    fn test_counts_are_prefilled_in_fixed_order() {
        let stats = aggregate(&[memo("2025-03-10", VisitTime::Evening, None)]).unwrap();
        let slots: Vec<_> = stats.time_counts.keys().copied().collect();
        assert_eq!(slots, VisitTime::ALL.to_vec());
        assert_eq!(stats.time_counts[&VisitTime::Morning], 0);
        assert_eq!(stats.mood_counts.len(), 4);
        assert_eq!(stats.peak_time, (VisitTime::Evening, 1));
    }

    #[test]
    fn test_peak_time_tie_prefers_earlier_slot() {
        let memos = vec![
            memo("2025-03-10", VisitTime::Evening, None),
            memo("2025-03-10", VisitTime::Lunch, None),
        ];
        let stats = aggregate(&memos).unwrap();
        assert_eq!(stats.peak_time, (VisitTime::Lunch, 1));
    }

    #[test]
    fn test_weekday_ranking() {
        // 2025-03-09 is a Sunday, 2025-03-10 a Monday
        let memos = vec![
            memo("2025-03-09", VisitTime::Morning, None),
            memo("2025-03-10", VisitTime::Morning, None),
            memo("2025-03-17", VisitTime::Morning, None),
        ];
        let stats = aggregate(&memos).unwrap();
        assert_eq!(stats.weekday_counts, [1, 2, 0, 0, 0, 0, 0]);
        assert_eq!(stats.peak_weekday.len(), 7);
        assert_eq!(stats.peak_weekday[0].day, "월");
        assert_eq!(stats.peak_weekday[0].count, 2);
        assert_eq!(stats.peak_weekday[1].day, "일");
        // zero-count days keep Sunday-first order
        assert_eq!(stats.peak_weekday[2].day, "화");
        assert_eq!(stats.daily_counts.len(), 3);
    }

    #[test]
    fn test_tags_and_weather_are_tallied() {
        let mut a = memo("2025-03-10", VisitTime::Morning, None);
        a.tags = vec!["시집".to_string(), "선물".to_string()];
        a.weather = WeatherCode::Rainy;
        let mut b = memo("2025-03-11", VisitTime::Morning, None);
        b.tags = vec!["시집".to_string()];

        let stats = aggregate(&[a, b]).unwrap();
        assert_eq!(stats.tag_counts["시집"], 2);
        assert_eq!(stats.tag_counts["선물"], 1);
        assert_eq!(stats.weather_counts[&WeatherCode::Rainy], 1);
        assert_eq!(stats.weather_counts[&WeatherCode::Sunny], 1);
    }

    #[test]
    fn test_serialized_shape() {
        let stats = aggregate(&[memo("2025-03-10", VisitTime::Morning, Some("토지 아주머니"))]).unwrap();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_memos"], 1);
        assert_eq!(json["time_counts"]["morning"], 1);
        assert_eq!(json["daily_counts"]["2025-03-10"], 1);
        assert_eq!(json["peak_time"], serde_json::json!(["morning", 1]));
        assert!(json["returning_customers"].as_array().unwrap().is_empty());
    }
}
