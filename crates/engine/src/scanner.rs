//! Reminder scanner — finds projects nearing their deadline and queues one
//! reminder email per eligible recipient.
//!
//! De-duplication needs no separate ledger: a project is only picked up when
//! `last_reminder_sent` is null or older than the cooldown, and the scanner
//! stamps it after processing. Overlapping scanner runs inside the same
//! cooldown boundary can race on that check; the window is accepted and the
//! stamp is the only guard.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use gigboard_common::config::AppConfig;
use gigboard_common::error::AppError;
use gigboard_common::types::{EmailPreference, EmailStatus, Profile, Project, TemplateType};

use crate::template::DeadlineReminderData;

const SECS_PER_DAY: i64 = 86_400;

/// Result of one scanner run.
#[derive(Debug, Clone, Copy)]
pub struct ScanOutcome {
    /// Projects in the work set (scanned and stamped), whether or not any
    /// recipient was eligible.
    pub projects_processed: u64,
    /// Reminder emails inserted into the queue.
    pub emails_queued: u64,
}

/// A reminder recipient: the project owner or an approved member.
#[derive(Debug, Clone, sqlx::FromRow)]
struct Recipient {
    user_id: Uuid,
    email: Option<String>,
}

/// Scans for projects whose deadline falls inside the look-ahead window and
/// queues deadline reminders, at most once per cooldown per project.
pub struct ReminderScanner {
    window: Duration,
    cooldown: Duration,
}

impl ReminderScanner {
    pub fn new(window_days: i64, cooldown_hours: i64) -> Self {
        Self {
            window: Duration::days(window_days),
            cooldown: Duration::hours(cooldown_hours),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.reminder_window_days, config.reminder_cooldown_hours)
    }

    /// Run one scan at `now`.
    ///
    /// A failure to fetch the work set aborts the run. Everything after that
    /// is per-project / per-recipient: failures are logged and skipped so one
    /// bad row cannot starve the rest of the batch.
    pub async fn run(&self, pool: &PgPool, now: DateTime<Utc>) -> Result<ScanOutcome, AppError> {
        let projects: Vec<Project> = sqlx::query_as(
            r#"
            SELECT *
            FROM projects
            WHERE status <> 'completed'
              AND deadline IS NOT NULL
              AND deadline <= $1
              AND (last_reminder_sent IS NULL OR last_reminder_sent < $2)
            ORDER BY deadline ASC
            "#,
        )
        .bind(now + self.window)
        .bind(now - self.cooldown)
        .fetch_all(pool)
        .await?;

        tracing::info!(count = projects.len(), "Found projects with upcoming deadlines");

        let mut emails_queued = 0u64;
        for project in &projects {
            match self.process_project(pool, project, now).await {
                Ok(queued) => emails_queued += queued,
                Err(e) => {
                    tracing::warn!(
                        project_id = %project.id,
                        error = %e,
                        "Failed to process project, continuing scan"
                    );
                }
            }
        }

        Ok(ScanOutcome {
            projects_processed: projects.len() as u64,
            emails_queued,
        })
    }

    /// Queue reminders for one project's recipients, then stamp
    /// `last_reminder_sent`. The stamp happens even when zero recipients were
    /// eligible, so the project is not re-scanned until the cooldown elapses,
    /// and only after the queue inserts, so a concurrent dispatcher never
    /// sees a stamped project with missing queue rows.
    async fn process_project(
        &self,
        pool: &PgPool,
        project: &Project,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        // Guaranteed non-null by the work-set query.
        let Some(deadline) = project.deadline else {
            return Ok(0);
        };
        let days_remaining = days_remaining(deadline, now);

        let mut queued = 0u64;
        for recipient in self.collect_recipients(pool, project).await {
            match self
                .queue_reminder(pool, project, &recipient, deadline, days_remaining, now)
                .await
            {
                Ok(true) => queued += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        project_id = %project.id,
                        user_id = %recipient.user_id,
                        error = %e,
                        "Failed to queue reminder for recipient"
                    );
                }
            }
        }

        sqlx::query("UPDATE projects SET last_reminder_sent = $1 WHERE id = $2")
            .bind(now)
            .bind(project.id)
            .execute(pool)
            .await?;

        tracing::info!(
            project_id = %project.id,
            days_remaining,
            queued,
            "Project reminders queued"
        );

        Ok(queued)
    }

    /// Build the recipient set: the owner plus every approved member, with
    /// emails resolved through `profiles`. Recipients without a resolvable
    /// email are dropped silently. Lookup failures degrade to a smaller set.
    async fn collect_recipients(&self, pool: &PgPool, project: &Project) -> Vec<Recipient> {
        let mut recipients = Vec::new();

        match sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(project.owner_id)
            .fetch_optional(pool)
            .await
        {
            Ok(owner) => recipients.push(Recipient {
                user_id: project.owner_id,
                email: owner.and_then(|p| p.email),
            }),
            Err(e) => {
                tracing::warn!(project_id = %project.id, error = %e, "Failed to load owner profile");
            }
        }

        match sqlx::query_as::<_, Recipient>(
            r#"
            SELECT pm.user_id, pr.email
            FROM project_members pm
            JOIN profiles pr ON pr.id = pm.user_id
            WHERE pm.project_id = $1
              AND pm.status = 'approved'
            "#,
        )
        .bind(project.id)
        .fetch_all(pool)
        .await
        {
            Ok(members) => recipients.extend(members),
            Err(e) => {
                tracing::warn!(project_id = %project.id, error = %e, "Failed to load project members");
            }
        }

        recipients.retain(|r| r.email.is_some());
        recipients
    }

    /// Insert one queued reminder for a recipient, unless they opted out.
    /// Returns whether a row was inserted.
    async fn queue_reminder(
        &self,
        pool: &PgPool,
        project: &Project,
        recipient: &Recipient,
        deadline: DateTime<Utc>,
        days_remaining: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let preference = match sqlx::query_as::<_, EmailPreference>(
            "SELECT * FROM email_preferences WHERE user_id = $1",
        )
        .bind(recipient.user_id)
        .fetch_optional(pool)
        .await
        {
            Ok(preference) => preference.map(|p| p.deadline_reminders),
            Err(e) => {
                // Preference lookup failure falls back to the default
                // (enabled) rather than dropping the reminder.
                tracing::warn!(user_id = %recipient.user_id, error = %e, "Failed to load email preference");
                None
            }
        };

        if !reminders_enabled(preference) {
            tracing::debug!(
                project_id = %project.id,
                user_id = %recipient.user_id,
                "Recipient opted out of deadline reminders"
            );
            return Ok(false);
        }

        let Some(to_email) = recipient.email.as_deref() else {
            return Ok(false);
        };

        let metadata = DeadlineReminderData {
            project_id: project.id,
            project_title: project.title.clone(),
            deadline,
            days_remaining,
            to_email: to_email.to_string(),
        };
        let metadata =
            serde_json::to_value(&metadata).map_err(|e| AppError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO email_queue (id, to_email, subject, body, template_type, metadata, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(to_email)
        .bind(format!("Deadline Reminder: {}", project.title))
        .bind(format!(
            "The project \"{}\" is due in {} day(s).",
            project.title, days_remaining
        ))
        .bind(TemplateType::DeadlineReminder.to_string())
        .bind(&metadata)
        .bind(EmailStatus::Pending.to_string())
        .bind(now)
        .execute(pool)
        .await?;

        Ok(true)
    }
}

/// Whole days until the deadline, rounded up. A deadline exactly `now` is 0
/// ("due today"); an overdue deadline goes negative, not clamped.
pub fn days_remaining(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (deadline - now).num_seconds();
    (secs + SECS_PER_DAY - 1).div_euclid(SECS_PER_DAY)
}

/// Absence of a preference row means reminders are enabled; only an explicit
/// `false` opts out.
pub fn reminders_enabled(preference: Option<bool>) -> bool {
    preference.unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, h, 0, 0).unwrap()
    }

    #[test]
    fn test_days_remaining_due_today() {
        let now = at(12);
        assert_eq!(days_remaining(now, now), 0);
    }

    #[test]
    fn test_days_remaining_rounds_up() {
        let now = at(12);
        assert_eq!(days_remaining(now + Duration::days(2), now), 2);
        assert_eq!(days_remaining(now + Duration::hours(36), now), 2);
        assert_eq!(days_remaining(now + Duration::seconds(1), now), 1);
    }

    #[test]
    fn test_days_remaining_overdue_goes_negative() {
        let now = at(12);
        assert_eq!(days_remaining(now - Duration::days(2), now), -2);
        assert_eq!(days_remaining(now - Duration::hours(36), now), -1);
    }

    #[test]
    fn test_reminders_enabled_defaults_true() {
        assert!(reminders_enabled(None));
        assert!(reminders_enabled(Some(true)));
        assert!(!reminders_enabled(Some(false)));
    }
}
