//! Bookstore Journal
//!
//! Visit memos for an independent bookstore: a REST JSON API for recording
//! customer observations, local statistics, weather snapshots and AI analysis.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
