//! Weather reading model and provider payload

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::enums::WeatherCode;

/// Weather snapshot ready to be copied into a memo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeatherReading {
    pub weather: WeatherCode,
    pub weather_detail: String,
    /// °C, one decimal
    pub weather_temp: f64,
    pub weather_humidity: i32,
    pub weather_auto_fetched: bool,
    /// Provider values the reading was derived from
    #[serde(rename = "_raw")]
    pub raw: RawWeather,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RawWeather {
    pub temp: f64,
    pub feels_like: f64,
    pub description: Option<String>,
    pub code: Option<i32>,
    pub wind_speed: Option<f64>,
    pub clouds: Option<i32>,
}

/// Query for `GET /weather`
#[derive(Debug, Deserialize, IntoParams)]
pub struct WeatherQuery {
    /// Latitude (defaults to the store)
    pub lat: Option<f64>,
    /// Longitude (defaults to the store)
    pub lon: Option<f64>,
}

/// Query for `GET /weather/historical`
#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoricalWeatherQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Visit date (YYYY-MM-DD)
    pub date: NaiveDate,
}

// ---------------------------------------------------------------------------
// OpenWeatherMap "current weather" payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Option<Wind>,
    #[serde(default)]
    pub clouds: Option<Clouds>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub id: i32,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Clouds {
    #[serde(default)]
    pub all: i32,
}
