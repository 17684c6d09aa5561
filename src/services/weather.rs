//! Weather lookup: provider client, code mapping and descriptions

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;

#[cfg(test)]
use mockall::automock;

use crate::{
    config::WeatherConfig,
    error::{AppError, AppResult},
    models::{
        enums::WeatherCode,
        weather::{Observation, RawWeather, WeatherReading},
    },
    services::redis::RedisService,
};

/// At or above this temperature a sunny reading is reported as hot
const HOT_THRESHOLD: f64 = 33.0;
/// At or below this temperature a dry reading is reported as cold
const COLD_THRESHOLD: f64 = 0.0;

/// Round half up, the way the readings have always been displayed
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Map a provider condition code to the internal vocabulary.
///
/// Exact codes win over the leading-digit fallback.
pub fn map_condition_code(code: i32) -> WeatherCode {
    match code {
        600 => WeatherCode::Snowy,
        701 | 711 | 721 | 741 | 761 => WeatherCode::Foggy,
        751 | 771 => WeatherCode::Windy,
        800 | 801 => WeatherCode::Sunny,
        802..=804 => WeatherCode::Cloudy,
        _ => match code.to_string().chars().next() {
            Some('2') | Some('3') | Some('5') => WeatherCode::Rainy,
            Some('6') => WeatherCode::Snowy,
            Some('7') => WeatherCode::Foggy,
            _ => WeatherCode::Sunny,
        },
    }
}

/// Condition code mapping followed by the hot/cold temperature override
pub fn weather_code(code: Option<i32>, temp: f64) -> WeatherCode {
    let mut mapped = code.map(map_condition_code).unwrap_or(WeatherCode::Sunny);

    if temp >= HOT_THRESHOLD && mapped == WeatherCode::Sunny {
        mapped = WeatherCode::Hot;
    }
    if temp <= COLD_THRESHOLD && !matches!(mapped, WeatherCode::Rainy | WeatherCode::Snowy) {
        mapped = WeatherCode::Cold;
    }
    mapped
}

fn temperature_phrase(temp: f64) -> &'static str {
    match temp {
        t if t <= -5.0 => "매우 춥고",
        t if t <= 5.0 => "춥고",
        t if t <= 15.0 => "쌀쌀하고",
        t if t <= 22.0 => "선선하고",
        t if t <= 28.0 => "따뜻하고",
        t if t <= 33.0 => "덥고",
        _ => "매우 덥고",
    }
}

/// Korean description, e.g. `쌀쌀하고, 비가 내림 (9°C, 체감 7°C, 습도 90%)`
pub fn describe(observation: &Observation) -> String {
    let temp = round_half_up(observation.main.temp);
    let feels_like = round_half_up(observation.main.feels_like);
    let condition = observation.weather.first();
    let wind_speed = observation.wind.as_ref().map(|w| w.speed).unwrap_or(0.0);

    let mut parts: Vec<String> = vec![temperature_phrase(temp).to_string()];

    let condition_phrase = match condition.map(|c| c.main.as_str()).unwrap_or("") {
        "Clear" => "맑은 하늘".to_string(),
        "Clouds" => {
            let cloudiness = observation.clouds.as_ref().map(|c| c.all).unwrap_or(0);
            if cloudiness > 80 {
                "구름이 많음".to_string()
            } else {
                "구름이 약간 있음".to_string()
            }
        }
        "Rain" => "비가 내림".to_string(),
        "Drizzle" => "이슬비가 내림".to_string(),
        "Snow" => "눈이 내림".to_string(),
        "Thunderstorm" => "천둥번개".to_string(),
        "Mist" | "Fog" | "Haze" => "안개가 낌".to_string(),
        _ => condition.map(|c| c.description.clone()).unwrap_or_default(),
    };
    parts.push(condition_phrase);

    if wind_speed > 10.0 {
        parts.push("강풍 주의".to_string());
    } else if wind_speed > 5.0 {
        parts.push("바람이 약간 있음".to_string());
    }

    format!(
        "{} ({}°C, 체감 {}°C, 습도 {}%)",
        parts.join(", "),
        temp,
        feels_like,
        observation.main.humidity
    )
}

/// Build the memo-ready reading from a provider observation
pub fn reading_from(observation: &Observation) -> WeatherReading {
    let condition = observation.weather.first();
    let temp = observation.main.temp;

    WeatherReading {
        weather: weather_code(condition.map(|c| c.id), temp),
        weather_detail: describe(observation),
        weather_temp: round_half_up(temp * 10.0) / 10.0,
        weather_humidity: observation.main.humidity,
        weather_auto_fetched: true,
        raw: RawWeather {
            temp,
            feels_like: observation.main.feels_like,
            description: condition.map(|c| c.description.clone()),
            code: condition.map(|c| c.id),
            wind_speed: observation.wind.as_ref().map(|w| w.speed),
            clouds: observation.clouds.as_ref().map(|c| c.all),
        },
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Source of current weather observations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions at the given coordinates
    async fn current(&self, lat: f64, lon: f64) -> AppResult<Observation>;
}

/// OpenWeatherMap client
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    config: WeatherConfig,
}

impl OpenWeatherClient {
    pub fn new(config: WeatherConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, lat: f64, lon: f64) -> AppResult<Observation> {
        let api_key = self.config.require_api_key()?;

        tracing::debug!("Fetching weather for ({}, {})", lat, lon);

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
                ("lang", self.config.lang.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    cache: Option<RedisService>,
    cache_seconds: u64,
    store_location: (f64, f64),
}

impl WeatherService {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        cache: Option<RedisService>,
        cache_seconds: u64,
        store_location: (f64, f64),
    ) -> Self {
        Self {
            provider,
            cache,
            cache_seconds,
            store_location,
        }
    }

    /// Coordinates to use when the caller gives none
    pub fn resolve(&self, lat: Option<f64>, lon: Option<f64>) -> (f64, f64) {
        (
            lat.unwrap_or(self.store_location.0),
            lon.unwrap_or(self.store_location.1),
        )
    }

    fn cache_key(lat: f64, lon: f64) -> String {
        format!("weather:{:.4}:{:.4}", lat, lon)
    }

    /// Current weather, served from the cache when a recent reading exists
    pub async fn current(&self, lat: f64, lon: f64) -> AppResult<WeatherReading> {
        let key = Self::cache_key(lat, lon);

        if let Some(cache) = &self.cache {
            match cache.get_json::<WeatherReading>(&key).await {
                Ok(Some(reading)) => return Ok(reading),
                Ok(None) => {}
                Err(e) => tracing::warn!("Weather cache read failed: {}", e),
            }
        }

        let observation = self.provider.current(lat, lon).await?;
        let reading = reading_from(&observation);

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set_json(&key, &reading, self.cache_seconds).await {
                tracing::warn!("Weather cache write failed: {}", e);
            }
        }

        Ok(reading)
    }

    /// Weather for a visit date. Only today can be looked up; any other
    /// date returns `None` and must be entered by hand.
    pub async fn historical(&self, lat: f64, lon: f64, date: NaiveDate) -> AppResult<Option<WeatherReading>> {
        if date != Utc::now().date_naive() {
            return Ok(None);
        }
        self.current(lat, lon).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::weather::{Clouds, Condition, MainReadings, Wind};

    fn observation(code: i32, main: &str, temp: f64) -> Observation {
        Observation {
            main: MainReadings {
                temp,
                feels_like: temp - 2.0,
                humidity: 60,
            },
            weather: vec![Condition {
                id: code,
                main: main.to_string(),
                description: "튼구름".to_string(),
            }],
            wind: Some(Wind { speed: 1.5 }),
            clouds: Some(Clouds { all: 20 }),
        }
    }

    #[test]
    fn test_mapping_is_total() {
        for code in 200..=900 {
            let mapped = map_condition_code(code);
            assert!(WeatherCode::ALL.contains(&mapped), "code {} unmapped", code);
        }
    }

    #[test]
    fn test_exact_codes_take_precedence() {
        assert_eq!(map_condition_code(751), WeatherCode::Windy);
        assert_eq!(map_condition_code(771), WeatherCode::Windy);
        assert_eq!(map_condition_code(731), WeatherCode::Foggy);
        assert_eq!(map_condition_code(802), WeatherCode::Cloudy);
        assert_eq!(map_condition_code(801), WeatherCode::Sunny);
        assert_eq!(map_condition_code(211), WeatherCode::Rainy);
        assert_eq!(map_condition_code(311), WeatherCode::Rainy);
        assert_eq!(map_condition_code(502), WeatherCode::Rainy);
        assert_eq!(map_condition_code(622), WeatherCode::Snowy);
        assert_eq!(map_condition_code(900), WeatherCode::Sunny);
    }

    #[test]
    fn test_temperature_override() {
        assert_eq!(weather_code(Some(800), 34.0), WeatherCode::Hot);
        assert_eq!(weather_code(Some(800), 35.0), WeatherCode::Hot);
        assert_eq!(weather_code(Some(803), 34.0), WeatherCode::Cloudy);
        assert_eq!(weather_code(Some(803), -1.0), WeatherCode::Cold);
        assert_eq!(weather_code(Some(741), 0.0), WeatherCode::Cold);
        assert_eq!(weather_code(Some(600), -1.0), WeatherCode::Snowy);
        assert_eq!(weather_code(Some(500), -1.0), WeatherCode::Rainy);
        assert_eq!(weather_code(None, 20.0), WeatherCode::Sunny);
    }

    #[test]
    fn test_description() {
        let obs = observation(500, "Rain", 9.4);
        assert_eq!(describe(&obs), "쌀쌀하고, 비가 내림 (9°C, 체감 7°C, 습도 60%)");

        let mut obs = observation(804, "Clouds", 24.0);
        obs.clouds = Some(Clouds { all: 90 });
        obs.wind = Some(Wind { speed: 7.0 });
        assert_eq!(
            describe(&obs),
            "따뜻하고, 구름이 많음, 바람이 약간 있음 (24°C, 체감 22°C, 습도 60%)"
        );

        let mut obs = observation(781, "Tornado", 36.0);
        obs.wind = Some(Wind { speed: 12.0 });
        assert_eq!(
            describe(&obs),
            "매우 덥고, 튼구름, 강풍 주의 (36°C, 체감 34°C, 습도 60%)"
        );
    }

    #[test]
    fn test_temperature_bands_round_half_up() {
        assert_eq!(describe(&observation(800, "Clear", -5.5)).split(',').next(), Some("매우 춥고"));
        assert!(describe(&observation(800, "Clear", -2.5)).contains("(-2°C"));
        assert!(describe(&observation(800, "Clear", 33.4)).starts_with("덥고, 맑은 하늘"));
    }

    #[test]
    fn test_reading_from_hot_clear_day() {
        let reading = reading_from(&observation(800, "Clear", 35.04));
        assert_eq!(reading.weather, WeatherCode::Hot);
        assert_eq!(reading.weather_temp, 35.0);
        assert!(reading.weather_auto_fetched);
        assert_eq!(reading.raw.code, Some(800));
        assert!(reading.weather_detail.starts_with("매우 덥고, 맑은 하늘"));

        let json = serde_json::to_value(&reading).unwrap();
        assert_eq!(json["weather"], "hot");
        assert_eq!(json["_raw"]["code"], 800);
    }

    #[tokio::test]
    async fn test_service_uses_provider_without_cache() {
        let mut provider = MockWeatherProvider::new();
        provider
            .expect_current()
            .withf(|lat, lon| *lat == 37.38 && *lon == 126.8035)
            .times(1)
            .returning(|_, _| Ok(observation(800, "Clear", 35.0)));

        let service = WeatherService::new(Arc::new(provider), None, 1800, (37.38, 126.8035));
        let (lat, lon) = service.resolve(None, None);
        let reading = service.current(lat, lon).await.unwrap();
        assert_eq!(reading.weather, WeatherCode::Hot);
    }

    #[tokio::test]
    async fn test_historical_only_supports_today() {
        let mut provider = MockWeatherProvider::new();
        provider
            .expect_current()
            .times(1)
            .returning(|_, _| Ok(observation(500, "Rain", 12.0)));

        let service = WeatherService::new(Arc::new(provider), None, 1800, (37.38, 126.8035));
        let today = Utc::now().date_naive();

        let past = service
            .historical(37.38, 126.8035, today - chrono::Duration::days(3))
            .await
            .unwrap();
        assert!(past.is_none());

        let current = service.historical(37.38, 126.8035, today).await.unwrap();
        assert_eq!(current.map(|r| r.weather), Some(WeatherCode::Rainy));
    }

    #[tokio::test]
    async fn test_remote_errors_are_propagated() {
        let mut provider = MockWeatherProvider::new();
        provider.expect_current().returning(|_, _| {
            Err(AppError::Remote {
                status: 401,
                body: "Invalid API key".to_string(),
            })
        });

        let service = WeatherService::new(Arc::new(provider), None, 1800, (37.38, 126.8035));
        let result = service.current(37.38, 126.8035).await;
        assert!(matches!(result, Err(AppError::Remote { status: 401, .. })));
    }

    #[tokio::test]
    async fn test_client_without_key_is_configuration_error() {
        let client = OpenWeatherClient::new(WeatherConfig::default()).unwrap();
        let result = client.current(37.38, 126.8035).await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
