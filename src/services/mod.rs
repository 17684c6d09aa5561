//! Business logic services

pub mod aggregator;
pub mod analysis;
pub mod memos;
pub mod redis;
pub mod users;
pub mod weather;

use std::sync::Arc;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub memos: memos::MemosService,
    pub analysis: analysis::AnalysisService,
    pub weather: weather::WeatherService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository.
    ///
    /// Redis is optional: without it weather readings are simply not cached.
    pub async fn new(
        repository: Repository,
        config: &AppConfig,
        redis_service: Option<redis::RedisService>,
    ) -> AppResult<Self> {
        let completion = Arc::new(analysis::AnthropicClient::new(config.ai.clone())?);
        let weather_provider = Arc::new(weather::OpenWeatherClient::new(config.weather.clone())?);

        if config.ai.api_key.is_none() {
            tracing::warn!("ANTHROPIC_API_KEY is not set, AI analysis will be unavailable");
        }
        if config.weather.api_key.is_none() {
            tracing::warn!("OPENWEATHER_API_KEY is not set, weather lookup will be unavailable");
        }

        Ok(Self {
            users: users::UsersService::new(repository.clone(), config.auth.clone()),
            memos: memos::MemosService::new(repository.clone()),
            analysis: analysis::AnalysisService::new(repository.clone(), completion),
            weather: weather::WeatherService::new(
                weather_provider,
                redis_service,
                config.redis.weather_cache_seconds,
                (config.weather.store_lat, config.weather.store_lon),
            ),
            repository,
        })
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.repository.pool).await?;
        Ok(())
    }
}
