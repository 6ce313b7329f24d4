use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// Resend API key for email delivery
    pub resend_api_key: Option<String>,

    /// Email sender address, e.g. "Gigboard <notifications@gigboard.app>"
    pub email_from: String,

    /// Base URL used to build links embedded in email bodies
    pub app_base_url: String,

    /// Shared bearer token required on job-trigger endpoints.
    /// When unset, the endpoints are open (local development).
    pub job_auth_token: Option<String>,

    /// Deadline look-ahead window in days (default: 3)
    pub reminder_window_days: i64,

    /// Minimum hours between reminders for the same project (default: 24)
    pub reminder_cooldown_hours: i64,

    /// Maximum number of queued emails drained per dispatch run (default: 10)
    pub dispatch_batch_size: i64,

    /// Timeout for each outbound mail API call in seconds (default: 10)
    pub mail_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            resend_api_key: std::env::var("RESEND_API_KEY").ok(),
            email_from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Gigboard <onboarding@resend.dev>".to_string()),
            app_base_url: std::env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "https://gigboard.app".to_string()),
            job_auth_token: std::env::var("JOB_AUTH_TOKEN").ok(),
            reminder_window_days: std::env::var("REMINDER_WINDOW_DAYS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("REMINDER_WINDOW_DAYS must be a valid i64"))?,
            reminder_cooldown_hours: std::env::var("REMINDER_COOLDOWN_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("REMINDER_COOLDOWN_HOURS must be a valid i64"))?,
            dispatch_batch_size: std::env::var("DISPATCH_BATCH_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DISPATCH_BATCH_SIZE must be a valid i64"))?,
            mail_timeout_secs: std::env::var("MAIL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAIL_TIMEOUT_SECS must be a valid u64"))?,
        })
    }
}
