//! Job-trigger routes for the notification pipeline.
//!
//! Each job is a short-lived invocation: the caller (scheduler or operator)
//! POSTs with no body and gets back the run's counts, or a 500 with the
//! error message when the work set could not be fetched at all. The two jobs
//! are deliberately decoupled; triggering a scan does not trigger a dispatch.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use gigboard_common::error::AppError;
use gigboard_engine::dispatcher::EmailDispatcher;
use gigboard_engine::scanner::ReminderScanner;

use crate::middleware::auth::JobAuth;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs/deadline-reminders", post(run_deadline_reminders))
        .route("/jobs/send-emails", post(run_send_emails))
}

/// POST /jobs/deadline-reminders — run one reminder scan.
async fn run_deadline_reminders(
    State(state): State<AppState>,
    _auth: JobAuth,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome = ReminderScanner::from_config(&state.config)
        .run(&state.pool, Utc::now())
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "projects_processed": outcome.projects_processed,
    })))
}

/// POST /jobs/send-emails — drain one batch of pending queued emails.
async fn run_send_emails(
    State(state): State<AppState>,
    _auth: JobAuth,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome = EmailDispatcher::from_config(&state.config)
        .run(
            &state.pool,
            &state.mailer,
            &state.config.app_base_url,
            Utc::now(),
        )
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "processed": outcome.processed,
    })))
}
