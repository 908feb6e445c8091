//! One-shot availability reminder run
//!
//! For hosts that trigger reminders from an external cron instead of the
//! in-process scheduler. Prints the run report as JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use kickoff_core::kernel::ReminderScheduler;
use kickoff_core::server::build_server_deps;
use kickoff_core::CoreConfig;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "send_reminders")]
#[command(about = "Send availability reminders for matches entering the reminder window")]
struct Cli {
    /// Evaluate the window as of this instant (RFC 3339) instead of now
    #[arg(long)]
    at: Option<DateTime<Utc>>,

    /// Override REMINDER_LEAD_HOURS
    #[arg(long)]
    lead_hours: Option<i64>,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kickoff_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    // Only store and notification settings; no API secrets are needed here
    let mut config = CoreConfig::from_env().context("Failed to load configuration")?;
    if let Some(hours) = cli.lead_hours {
        config = config
            .with_lead_hours(hours)
            .context("Invalid --lead-hours")?;
    }

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let deps = Arc::new(build_server_deps(pool, &config));
    let now = cli.at.unwrap_or_else(Utc::now);

    let report = ReminderScheduler::new(deps)
        .run_once(now)
        .await
        .context("Reminder run failed")?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", output);

    Ok(())
}
