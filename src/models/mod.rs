//! Data models for the bookstore journal

pub mod analysis;
pub mod enums;
pub mod memo;
pub mod stats;
pub mod user;
pub mod weather;

// Re-export commonly used types
pub use analysis::{AiAnalysisResult, SavedAnalysis};
pub use enums::{AnalysisType, Genre, Mood, VisitTime, WeatherCode};
pub use memo::{Memo, MemoInput, PurchasedBook};
pub use stats::LocalStats;
pub use user::{User, UserClaims};
pub use weather::WeatherReading;
