//! Shared application state for the Axum API server.

use gigboard_common::config::AppConfig;
use gigboard_mailer::ResendMailer;
use sqlx::PgPool;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub mailer: ResendMailer,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(pool: PgPool, mailer: ResendMailer, config: AppConfig) -> Self {
        Self {
            pool,
            mailer,
            config,
        }
    }
}
