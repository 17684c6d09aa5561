//! Shared domain vocabularies (time slots, moods, weather codes, genres)

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Implements `as_str`, `FromStr`, `Display` and the SQLx TEXT mapping for a
/// closed string vocabulary.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every value, in canonical order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Invalid {}: {}", stringify!($name), other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = sqlx::Decode::<sqlx::Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// VisitTime
// ---------------------------------------------------------------------------

/// Time slot of a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VisitTime {
    /// Opening until 12:00
    Morning,
    /// 12:00 - 14:00
    Lunch,
    /// 14:00 - 18:00
    #[default]
    Afternoon,
    /// 18:00 until closing
    Evening,
}

text_enum!(VisitTime {
    Morning => "morning",
    Lunch => "lunch",
    Afternoon => "afternoon",
    Evening => "evening",
});

impl VisitTime {
    /// Slot containing the given hour of day
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=11 => VisitTime::Morning,
            12..=13 => VisitTime::Lunch,
            14..=17 => VisitTime::Afternoon,
            _ => VisitTime::Evening,
        }
    }
}

// ---------------------------------------------------------------------------
// Mood
// ---------------------------------------------------------------------------

/// Store atmosphere during the visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Quiet,
    #[default]
    Normal,
    Busy,
    Crowded,
}

text_enum!(Mood {
    Quiet => "quiet",
    Normal => "normal",
    Busy => "busy",
    Crowded => "crowded",
});

// ---------------------------------------------------------------------------
// WeatherCode
// ---------------------------------------------------------------------------

/// Internal weather vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCode {
    #[default]
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
    Windy,
    Foggy,
    Hot,
    Cold,
    Clear,
}

text_enum!(WeatherCode {
    Sunny => "sunny",
    Cloudy => "cloudy",
    Rainy => "rainy",
    Snowy => "snowy",
    Windy => "windy",
    Foggy => "foggy",
    Hot => "hot",
    Cold => "cold",
    Clear => "clear",
});

// ---------------------------------------------------------------------------
// Genre
// ---------------------------------------------------------------------------

/// Genre of a purchased book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum Genre {
    #[serde(rename = "한국문학")]
    KoreanLiterature,
    #[serde(rename = "외국문학")]
    ForeignLiterature,
    #[serde(rename = "에세이")]
    Essay,
    #[serde(rename = "시")]
    Poetry,
    #[serde(rename = "역사")]
    History,
    #[serde(rename = "과학")]
    Science,
    #[serde(rename = "자기계발")]
    SelfHelp,
    #[serde(rename = "요리")]
    Cooking,
    #[serde(rename = "여행")]
    Travel,
    #[serde(rename = "아동")]
    Children,
    #[serde(rename = "만화")]
    Comics,
    #[serde(rename = "경제")]
    Economics,
    #[serde(rename = "철학")]
    Philosophy,
    #[serde(rename = "예술")]
    Art,
    #[serde(rename = "사회")]
    Society,
    #[serde(rename = "종교")]
    Religion,
    #[default]
    #[serde(rename = "기타")]
    Other,
}

text_enum!(Genre {
    KoreanLiterature => "한국문학",
    ForeignLiterature => "외국문학",
    Essay => "에세이",
    Poetry => "시",
    History => "역사",
    Science => "과학",
    SelfHelp => "자기계발",
    Cooking => "요리",
    Travel => "여행",
    Children => "아동",
    Comics => "만화",
    Economics => "경제",
    Philosophy => "철학",
    Art => "예술",
    Society => "사회",
    Religion => "종교",
    Other => "기타",
});

// ---------------------------------------------------------------------------
// AnalysisType
// ---------------------------------------------------------------------------

/// Time window framing of an AI analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Last 7 days
    Weekly,
    /// Last 30 days
    Monthly,
    /// Every memo
    #[default]
    Custom,
}

text_enum!(AnalysisType {
    Weekly => "weekly",
    Monthly => "monthly",
    Custom => "custom",
});

impl From<Option<&str>> for AnalysisType {
    /// Unknown or missing values fall back to `Custom`
    fn from(s: Option<&str>) -> Self {
        s.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

/// Weekday labels, Sunday first
pub const DAY_NAMES: [&str; 7] = ["일", "월", "화", "수", "목", "금", "토"];
