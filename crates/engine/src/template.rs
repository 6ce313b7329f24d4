//! Email template rendering.
//!
//! Each queued email carries a `template_type` tag plus a metadata payload.
//! The metadata is parsed into one typed payload shape per template
//! ([`TemplatePayload`]), so rendering is exhaustive over the union and
//! cannot silently drop a required field. Rendering itself is a pure
//! function of the payload and the configured base URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gigboard_common::types::TemplateType;

/// A rendered email ready to hand to the mail transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Metadata that does not deserialize into the payload shape its
/// template type requires.
#[derive(Debug, thiserror::Error)]
#[error("invalid metadata for {kind} template: {source}")]
pub struct TemplateError {
    pub kind: TemplateType,
    #[source]
    pub source: serde_json::Error,
}

/// Payload for `new_project` announcements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProjectData {
    pub project_title: String,
    pub project_description: String,
    #[serde(default)]
    pub required_skills: Option<Vec<String>>,
    pub to_email: String,
}

/// Outcome of a freelancer's application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationDecision {
    Approved,
    Rejected,
}

/// Payload for `application_status` updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationStatusData {
    pub status: ApplicationDecision,
    #[serde(default)]
    pub interview_notes: Option<String>,
    pub project_id: Uuid,
    pub to_email: String,
}

/// Payload for `deadline_reminder` emails, written by the reminder scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlineReminderData {
    pub project_id: Uuid,
    pub project_title: String,
    pub deadline: DateTime<Utc>,
    /// Whole days until the deadline, rounded up; negative when overdue.
    pub days_remaining: i64,
    pub to_email: String,
}

/// Payload for the catch-all `other` template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtherData {
    #[serde(default)]
    pub body: Option<String>,
    pub to_email: String,
}

/// Tagged union of template payloads, keyed by [`TemplateType`].
#[derive(Debug, Clone)]
pub enum TemplatePayload {
    NewProject(NewProjectData),
    ApplicationStatus(ApplicationStatusData),
    DeadlineReminder(DeadlineReminderData),
    Other(OtherData),
}

impl TemplatePayload {
    /// Parse queue-row metadata into the payload shape its template requires.
    pub fn parse(kind: TemplateType, metadata: &serde_json::Value) -> Result<Self, TemplateError> {
        let parsed = match kind {
            TemplateType::NewProject => {
                serde_json::from_value(metadata.clone()).map(Self::NewProject)
            }
            TemplateType::ApplicationStatus => {
                serde_json::from_value(metadata.clone()).map(Self::ApplicationStatus)
            }
            TemplateType::DeadlineReminder => {
                serde_json::from_value(metadata.clone()).map(Self::DeadlineReminder)
            }
            TemplateType::Other => serde_json::from_value(metadata.clone()).map(Self::Other),
        };

        parsed.map_err(|source| TemplateError { kind, source })
    }
}

/// Render a payload into subject + HTML body. Pure; links are built from
/// `base_url`.
pub fn render(payload: &TemplatePayload, base_url: &str) -> RenderedEmail {
    match payload {
        TemplatePayload::NewProject(data) => {
            let skills = match &data.required_skills {
                Some(skills) if !skills.is_empty() => format!(
                    "<p><strong>Required Skills:</strong> {}</p>",
                    skills.join(", ")
                ),
                _ => String::new(),
            };

            RenderedEmail {
                subject: format!("New Project: {}", data.project_title),
                html: format!(
                    r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #2563eb;">New Project Available!</h2>
  <h3>{}</h3>
  <p>{}</p>
  {}
  <a href="{}" style="display: inline-block; padding: 10px 20px; background-color: #2563eb; color: white; text-decoration: none; border-radius: 5px; margin-top: 20px;">View Project</a>
</div>"#,
                    data.project_title, data.project_description, skills, base_url
                ),
            }
        }

        TemplatePayload::ApplicationStatus(data) => {
            let (verdict, color) = match data.status {
                ApplicationDecision::Approved => ("Approved", "#10b981"),
                ApplicationDecision::Rejected => ("Rejected", "#ef4444"),
            };
            let notes = match &data.interview_notes {
                Some(notes) => format!("<p><strong>Notes:</strong> {}</p>", notes),
                None => String::new(),
            };

            RenderedEmail {
                subject: format!("Application {}", verdict),
                html: format!(
                    r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: {};">Application {}</h2>
  <p>Your application status has been updated.</p>
  {}
  <a href="{}/project/{}" style="display: inline-block; padding: 10px 20px; background-color: #2563eb; color: white; text-decoration: none; border-radius: 5px; margin-top: 20px;">View Project</a>
</div>"#,
                    color, verdict, notes, base_url, data.project_id
                ),
            }
        }

        TemplatePayload::DeadlineReminder(data) => RenderedEmail {
            subject: format!("Deadline Reminder: {}", data.project_title),
            html: format!(
                r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #f59e0b;">Deadline Reminder</h2>
  <h3>{}</h3>
  <p>This project is due on {}</p>
  <p>Days remaining: {}</p>
  <a href="{}/project/{}" style="display: inline-block; padding: 10px 20px; background-color: #2563eb; color: white; text-decoration: none; border-radius: 5px; margin-top: 20px;">View Project</a>
</div>"#,
                data.project_title,
                data.deadline.format("%B %-d, %Y"),
                data.days_remaining,
                base_url,
                data.project_id
            ),
        },

        TemplatePayload::Other(data) => RenderedEmail {
            subject: "Notification".to_string(),
            html: format!(
                "<p>{}</p>",
                data.body.as_deref().unwrap_or("You have a new notification")
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const BASE_URL: &str = "https://gigboard.test";

    #[test]
    fn test_deadline_reminder_rendering() {
        let project_id = Uuid::new_v4();
        let payload = TemplatePayload::DeadlineReminder(DeadlineReminderData {
            project_id,
            project_title: "Logo redesign".to_string(),
            deadline: Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap(),
            days_remaining: 2,
            to_email: "dev@example.com".to_string(),
        });

        let rendered = render(&payload, BASE_URL);
        assert_eq!(rendered.subject, "Deadline Reminder: Logo redesign");
        assert!(rendered.html.contains("June 4, 2025"));
        assert!(rendered.html.contains("Days remaining: 2"));
        assert!(
            rendered
                .html
                .contains(&format!("{}/project/{}", BASE_URL, project_id))
        );
    }

    #[test]
    fn test_deadline_reminder_overdue_days_pass_through() {
        let payload = TemplatePayload::DeadlineReminder(DeadlineReminderData {
            project_id: Uuid::new_v4(),
            project_title: "Late project".to_string(),
            deadline: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            days_remaining: -2,
            to_email: "dev@example.com".to_string(),
        });

        let rendered = render(&payload, BASE_URL);
        assert!(rendered.html.contains("Days remaining: -2"));
    }

    #[test]
    fn test_application_status_approved_and_rejected_subjects() {
        let approved = TemplatePayload::ApplicationStatus(ApplicationStatusData {
            status: ApplicationDecision::Approved,
            interview_notes: Some("Great portfolio".to_string()),
            project_id: Uuid::new_v4(),
            to_email: "dev@example.com".to_string(),
        });
        let rejected = TemplatePayload::ApplicationStatus(ApplicationStatusData {
            status: ApplicationDecision::Rejected,
            interview_notes: None,
            project_id: Uuid::new_v4(),
            to_email: "dev@example.com".to_string(),
        });

        assert_eq!(render(&approved, BASE_URL).subject, "Application Approved");
        assert!(render(&approved, BASE_URL).html.contains("Great portfolio"));
        assert_eq!(render(&rejected, BASE_URL).subject, "Application Rejected");
        assert!(!render(&rejected, BASE_URL).html.contains("Notes:"));
    }

    #[test]
    fn test_new_project_with_and_without_skills() {
        let with_skills = TemplatePayload::NewProject(NewProjectData {
            project_title: "API build-out".to_string(),
            project_description: "REST API for an inventory system".to_string(),
            required_skills: Some(vec!["Rust".to_string(), "Postgres".to_string()]),
            to_email: "dev@example.com".to_string(),
        });
        let without_skills = TemplatePayload::NewProject(NewProjectData {
            project_title: "API build-out".to_string(),
            project_description: "REST API for an inventory system".to_string(),
            required_skills: None,
            to_email: "dev@example.com".to_string(),
        });

        let rendered = render(&with_skills, BASE_URL);
        assert_eq!(rendered.subject, "New Project: API build-out");
        assert!(rendered.html.contains("Rust, Postgres"));
        assert!(!render(&without_skills, BASE_URL).html.contains("Required Skills"));
    }

    #[test]
    fn test_other_template_defaults() {
        let with_body = TemplatePayload::Other(OtherData {
            body: Some("Your invoice is ready".to_string()),
            to_email: "dev@example.com".to_string(),
        });
        let without_body = TemplatePayload::Other(OtherData {
            body: None,
            to_email: "dev@example.com".to_string(),
        });

        assert_eq!(render(&with_body, BASE_URL).subject, "Notification");
        assert!(render(&with_body, BASE_URL).html.contains("Your invoice is ready"));
        assert!(
            render(&without_body, BASE_URL)
                .html
                .contains("You have a new notification")
        );
    }

    #[test]
    fn test_parse_selects_shape_by_template_type() {
        let metadata = serde_json::json!({
            "project_id": Uuid::new_v4(),
            "project_title": "Logo redesign",
            "deadline": "2025-06-04T12:00:00Z",
            "days_remaining": 2,
            "to_email": "dev@example.com",
        });

        let payload = TemplatePayload::parse(TemplateType::DeadlineReminder, &metadata).unwrap();
        match payload {
            TemplatePayload::DeadlineReminder(data) => {
                assert_eq!(data.days_remaining, 2);
                assert_eq!(data.project_title, "Logo redesign");
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_missing_required_fields() {
        let metadata = serde_json::json!({ "project_title": "No deadline here" });
        let err = TemplatePayload::parse(TemplateType::DeadlineReminder, &metadata).unwrap_err();
        assert_eq!(err.kind, TemplateType::DeadlineReminder);
    }

    #[test]
    fn test_parse_rejects_unknown_application_decision() {
        let metadata = serde_json::json!({
            "status": "waitlisted",
            "project_id": Uuid::new_v4(),
            "to_email": "dev@example.com",
        });
        assert!(TemplatePayload::parse(TemplateType::ApplicationStatus, &metadata).is_err());
    }
}
