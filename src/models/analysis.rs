//! AI analysis request and result models

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::{types::Json as SqlJson, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{enums::AnalysisType, memo::Memo};

/// Declares a label vocabulary the model is asked to use.
///
/// Matching ignores whitespace and ASCII case, so `"고객 패턴"` and
/// `"Customer_Pattern"` both resolve. Labels outside the vocabulary are kept
/// verbatim in `Other` instead of failing the whole reply.
macro_rules! label_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal $(| $alias:literal)*),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $label,)+
                    $name::Other(label) => label,
                }
            }

            pub fn from_label(raw: &str) -> Self {
                let key: String = raw
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_ascii_lowercase();
                match key.as_str() {
                    $($label $(| $alias)* => $name::$variant,)+
                    _ => $name::Other(raw.trim().to_string()),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::Other(String::new())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
                Ok($name::from_label(&raw))
            }
        }
    };
}

label_enum! {
    /// Insight category
    InsightCategory {
        CustomerPattern => "고객패턴" | "customer_pattern" | "customer-pattern",
        SalesTrend => "판매트렌드" | "sales_trend" | "sales-trend",
        Seasonality => "계절성" | "seasonality",
        OperationalSuggestion => "운영제안" | "operational_suggestion" | "operational-suggestion",
    }
}

label_enum! {
    Confidence {
        High => "높음" | "high",
        Medium => "중간" | "medium",
        Low => "낮음" | "low",
    }
}

label_enum! {
    Priority {
        High => "상" | "high",
        Medium => "중" | "medium",
        Low => "하" | "low",
    }
}

/// `null` reads as the default value, like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keep the well-formed items of a list and drop the rest.
///
/// Anything other than an array reads as an empty list.
fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("Dropping malformed analysis item: {}", e);
                None
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Insight {
    /// 고객패턴, 판매트렌드, 계절성 or 운영제안
    #[serde(default)]
    #[schema(value_type = String)]
    pub category: InsightCategory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// 높음, 중간 or 낮음
    #[serde(default)]
    #[schema(value_type = String)]
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    /// 상, 중 or 하
    #[serde(default)]
    #[schema(value_type = String)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expected_effect: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timing: String,
}

/// Structured part of the model reply
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient_items")]
    pub insights: Vec<Insight>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub recommendations: Vec<Recommendation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fun_fact: String,
}

/// Result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AiAnalysisResult {
    pub summary: String,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub fun_fact: String,
    pub memo_count: usize,
    /// Unmodified model reply
    #[serde(default)]
    pub raw_response: String,
    /// Set when no structured JSON could be read from the reply
    #[serde(default)]
    pub parse_error: bool,
}

/// Body of `POST /ai-analysis`
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub memos: Option<Vec<Memo>>,
    #[serde(default, rename = "analysisType", alias = "analysis_type")]
    pub analysis_type: Option<String>,
}

/// Body of `POST /ai-analysis/run`
#[derive(Debug, Deserialize, ToSchema)]
pub struct WindowAnalysisRequest {
    #[serde(default, rename = "analysisType", alias = "analysis_type")]
    pub analysis_type: Option<String>,
}

/// Body of `POST /analyses`
#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveAnalysisRequest {
    #[serde(default)]
    pub analysis_type: AnalysisType,
    #[serde(flatten)]
    pub result: AiAnalysisResult,
}

/// Persisted analysis
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SavedAnalysis {
    pub id: Uuid,
    pub user_id: Uuid,
    pub analysis_type: AnalysisType,
    pub summary: String,
    #[schema(value_type = Vec<Insight>)]
    pub insights: SqlJson<Vec<Insight>>,
    #[schema(value_type = Vec<Recommendation>)]
    pub recommendations: SqlJson<Vec<Recommendation>>,
    pub fun_fact: String,
    pub memo_count: i32,
    pub raw_response: String,
    pub parse_error: bool,
    pub created_at: DateTime<Utc>,
}

/// Query for `GET /analyses`
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct RecentAnalysesQuery {
    /// Number of analyses to return (default 10)
    pub limit: Option<i64>,
}
