//! Bearer-token guard for job-trigger endpoints.
//!
//! The jobs are machine-triggered (scheduler or operator), so authentication
//! is a single shared token compared against `JOB_AUTH_TOKEN`. When no token
//! is configured the endpoints are open; that mode is for local development.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use gigboard_common::error::AppError;

use crate::state::AppState;

/// Authorization proof for job-trigger routes.
///
/// Use as an Axum extractor on protected routes:
/// ```ignore
/// async fn handler(_auth: JobAuth) -> impl IntoResponse {
///     // only reached with a valid job token (or no token configured)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct JobAuth;

impl FromRequestParts<AppState> for JobAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.job_auth_token.as_deref() else {
            return Ok(Self);
        };

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Auth("Missing bearer token".to_string()))?;

        if token != expected {
            return Err(AppError::Auth("Invalid job token".to_string()));
        }

        Ok(Self)
    }
}
