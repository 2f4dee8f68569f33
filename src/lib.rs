//! Libris library circulation server
//!
//! REST JSON API for a small lending library: a book catalog, user
//! accounts with bearer-token authentication, and a borrow/return engine
//! that keeps shelf quantities and users' loan lists in step.

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
