//! Weather lookup endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::weather::{HistoricalWeatherQuery, WeatherQuery, WeatherReading},
};

use super::AuthenticatedUser;

/// Current weather (defaults to the store location)
#[utoipa::path(
    get,
    path = "/weather",
    tag = "weather",
    security(("bearer_auth" = [])),
    params(WeatherQuery),
    responses(
        (status = 200, description = "Current reading", body = WeatherReading),
        (status = 500, description = "Weather key not configured", body = crate::error::ErrorResponse),
        (status = 502, description = "Provider unreachable", body = crate::error::ErrorResponse)
    )
)]
pub async fn current_weather(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<WeatherQuery>,
) -> AppResult<Json<WeatherReading>> {
    let weather = &state.services.weather;
    let (lat, lon) = weather.resolve(query.lat, query.lon);
    let reading = weather.current(lat, lon).await?;
    Ok(Json(reading))
}

/// Weather for a visit date (`null` for any day but today)
#[utoipa::path(
    get,
    path = "/weather/historical",
    tag = "weather",
    security(("bearer_auth" = [])),
    params(HistoricalWeatherQuery),
    responses(
        (status = 200, description = "Reading, or null when unavailable", body = Option<WeatherReading>)
    )
)]
pub async fn historical_weather(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<HistoricalWeatherQuery>,
) -> AppResult<Json<Option<WeatherReading>>> {
    let weather = &state.services.weather;
    let (lat, lon) = weather.resolve(query.lat, query.lon);
    let reading = weather.historical(lat, lon, query.date).await?;
    Ok(Json(reading))
}
