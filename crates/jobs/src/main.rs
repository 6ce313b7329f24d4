//! One-shot job runner for scheduler invocation.
//!
//! Each run is a short-lived process: connect, run the requested job(s),
//! exit. Point cron (or any scheduler) at it:
//!
//! ```bash
//! gigboard-jobs scan      # queue deadline reminders
//! gigboard-jobs dispatch  # drain one batch of pending emails
//! gigboard-jobs all       # scan, then dispatch (default)
//! ```

use chrono::Utc;
use sqlx::PgPool;

use gigboard_common::config::AppConfig;
use gigboard_common::db;
use gigboard_engine::dispatcher::EmailDispatcher;
use gigboard_engine::scanner::ReminderScanner;
use gigboard_mailer::ResendMailer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gigboard_jobs=info,gigboard_engine=info".into()),
        )
        .json()
        .init();

    let mode = std::env::args().nth(1).unwrap_or_else(|| "all".to_string());

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to database
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    match mode.as_str() {
        "scan" => run_scan(&config, &pool).await?,
        "dispatch" => run_dispatch(&config, &pool).await?,
        "all" => {
            run_scan(&config, &pool).await?;
            run_dispatch(&config, &pool).await?;
        }
        other => anyhow::bail!("unknown job '{}' (expected scan, dispatch, or all)", other),
    }

    Ok(())
}

async fn run_scan(config: &AppConfig, pool: &PgPool) -> anyhow::Result<()> {
    let outcome = ReminderScanner::from_config(config)
        .run(pool, Utc::now())
        .await?;

    tracing::info!(
        projects_processed = outcome.projects_processed,
        emails_queued = outcome.emails_queued,
        "Reminder scan complete"
    );
    Ok(())
}

async fn run_dispatch(config: &AppConfig, pool: &PgPool) -> anyhow::Result<()> {
    let mailer = ResendMailer::from_config(config)?;
    let outcome = EmailDispatcher::from_config(config)
        .run(pool, &mailer, &config.app_base_url, Utc::now())
        .await?;

    tracing::info!(
        processed = outcome.processed,
        sent = outcome.sent,
        failed = outcome.failed,
        "Email dispatch complete"
    );
    Ok(())
}
