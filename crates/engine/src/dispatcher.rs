//! Email dispatcher — drains pending queued emails and delivers them.
//!
//! Every message pulled into a batch leaves in a terminal state: rendered and
//! sent (`sent`), or `failed` on unrenderable metadata or a transport error.
//! Terminal updates are guarded by the current status so overlapping
//! dispatcher runs cannot finalize the same message twice. `failed` is
//! terminal; re-delivery is an operator action, not an automatic retry.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use gigboard_common::config::AppConfig;
use gigboard_common::error::AppError;
use gigboard_common::types::QueuedEmail;
use gigboard_mailer::MailTransport;

use crate::template::{self, TemplatePayload};

/// Result of one dispatch run.
#[derive(Debug, Clone, Copy)]
pub struct DispatchOutcome {
    /// Messages pulled into the batch.
    pub processed: u64,
    /// Messages accepted by the mail provider.
    pub sent: u64,
    /// Messages finalized as failed.
    pub failed: u64,
}

/// Drains the email queue in insertion order, up to a batch limit per run.
pub struct EmailDispatcher {
    batch_size: i64,
}

impl EmailDispatcher {
    pub fn new(batch_size: i64) -> Self {
        Self { batch_size }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.dispatch_batch_size)
    }

    /// Run one dispatch pass at `now`.
    ///
    /// A failure to fetch the batch aborts the run; per-message failures are
    /// recorded on the row and the loop continues.
    pub async fn run<M: MailTransport>(
        &self,
        pool: &PgPool,
        mailer: &M,
        base_url: &str,
        now: DateTime<Utc>,
    ) -> Result<DispatchOutcome, AppError> {
        let batch: Vec<QueuedEmail> = sqlx::query_as(
            r#"
            SELECT *
            FROM email_queue
            WHERE status = 'pending'
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(self.batch_size)
        .fetch_all(pool)
        .await?;

        tracing::info!(count = batch.len(), "Processing queued emails");

        let mut sent = 0u64;
        let mut failed = 0u64;
        for email in &batch {
            match self.deliver(pool, mailer, email, base_url, now).await {
                Ok(true) => sent += 1,
                Ok(false) => failed += 1,
                Err(e) => {
                    failed += 1;
                    tracing::error!(
                        email_id = %email.id,
                        error = %e,
                        "Failed to finalize queued email"
                    );
                }
            }
        }

        Ok(DispatchOutcome {
            processed: batch.len() as u64,
            sent,
            failed,
        })
    }

    /// Render and send one message, then finalize its row. Returns whether it
    /// was sent.
    async fn deliver<M: MailTransport>(
        &self,
        pool: &PgPool,
        mailer: &M,
        email: &QueuedEmail,
        base_url: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        // Overlay the row's recipient so producers don't have to duplicate it
        // in metadata.
        let mut metadata = email.metadata.clone();
        if let Some(map) = metadata.as_object_mut() {
            map.insert(
                "to_email".to_string(),
                serde_json::Value::String(email.to_email.clone()),
            );
        }

        let payload = match TemplatePayload::parse(email.template_type, &metadata) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(
                    email_id = %email.id,
                    error = %e,
                    "Unrenderable metadata, marking failed"
                );
                self.mark_failed(pool, email.id).await?;
                return Ok(false);
            }
        };
        let rendered = template::render(&payload, base_url);

        match mailer.send(&email.to_email, &rendered.subject, &rendered.html).await {
            Ok(()) => {
                self.mark_sent(pool, email.id, now).await?;
                tracing::info!(email_id = %email.id, to = %email.to_email, "Email sent");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(
                    email_id = %email.id,
                    to = %email.to_email,
                    error = %e,
                    "Email send failed"
                );
                self.mark_failed(pool, email.id).await?;
                Ok(false)
            }
        }
    }

    async fn mark_sent(
        &self,
        pool: &PgPool,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE email_queue SET status = 'sent', sent_at = $1 WHERE id = $2 AND status = 'pending'",
        )
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(email_id = %id, "Queued email was already finalized elsewhere");
        }
        Ok(())
    }

    async fn mark_failed(&self, pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE email_queue SET status = 'failed' WHERE id = $1 AND status = 'pending'")
                .bind(id)
                .execute(pool)
                .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(email_id = %id, "Queued email was already finalized elsewhere");
        }
        Ok(())
    }
}
