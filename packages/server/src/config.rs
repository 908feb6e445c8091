use anyhow::{Context, Result};
use chrono::Duration;
use dotenvy::dotenv;
use std::env;

use crate::domains::availability::ReminderWindow;
use crate::kernel::DEFAULT_REMINDER_CRON;

/// Longest lead time accepted for reminders (one year)
const MAX_REMINDER_LEAD_HOURS: i64 = 24 * 365;

/// Widest half-window accepted around the lead time (one day)
const MAX_REMINDER_TOLERANCE_MINUTES: i64 = 24 * 60;

/// Settings needed by anything that touches the store and sends
/// notifications: the API server and the one-shot reminder CLI.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub database_url: String,
    pub expo_access_token: Option<String>,
    pub push_notifications_enabled: bool,
    pub reminder_cron: String,
    pub reminder_window: ReminderWindow,
    pub app_base_url: String,
}

impl CoreConfig {
    /// Load store, notification and reminder settings from the environment
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let lead_hours: i64 = env::var("REMINDER_LEAD_HOURS")
            .unwrap_or_else(|_| "48".to_string())
            .parse()
            .context("REMINDER_LEAD_HOURS must be a whole number of hours")?;
        let tolerance_minutes: i64 = env::var("REMINDER_TOLERANCE_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .context("REMINDER_TOLERANCE_MINUTES must be a whole number of minutes")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            expo_access_token: env::var("EXPO_ACCESS_TOKEN").ok().filter(|t| !t.is_empty()),
            push_notifications_enabled: parse_bool(
                &env::var("PUSH_NOTIFICATIONS_ENABLED").unwrap_or_else(|_| "true".to_string()),
            )
            .context("PUSH_NOTIFICATIONS_ENABLED must be true or false")?,
            reminder_cron: env::var("REMINDER_CRON")
                .unwrap_or_else(|_| DEFAULT_REMINDER_CRON.to_string()),
            reminder_window: reminder_window(lead_hours, tolerance_minutes)?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        })
    }

    /// Replace the lead time, keeping the configured tolerance
    pub fn with_lead_hours(mut self, lead_hours: i64) -> Result<Self> {
        self.reminder_window = reminder_window(lead_hours, self.reminder_window.tolerance.num_minutes())?;
        Ok(self)
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub core: CoreConfig,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let core = CoreConfig::from_env()?;

        Ok(Self {
            core,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "kickoff".to_string()),
            allowed_origins: parse_list(&env::var("ALLOWED_ORIGINS").unwrap_or_default()),
        })
    }
}

/// Build the reminder window, rejecting values that would disable reminders
/// or fall outside the representable date range.
pub fn reminder_window(lead_hours: i64, tolerance_minutes: i64) -> Result<ReminderWindow> {
    if !(0..=MAX_REMINDER_LEAD_HOURS).contains(&lead_hours) {
        anyhow::bail!(
            "reminder lead must be between 0 and {} hours, got {}",
            MAX_REMINDER_LEAD_HOURS,
            lead_hours
        );
    }
    if !(1..=MAX_REMINDER_TOLERANCE_MINUTES).contains(&tolerance_minutes) {
        anyhow::bail!(
            "reminder tolerance must be between 1 and {} minutes, got {}",
            MAX_REMINDER_TOLERANCE_MINUTES,
            tolerance_minutes
        );
    }

    let lead = Duration::try_hours(lead_hours).context("reminder lead is out of range")?;
    let tolerance =
        Duration::try_minutes(tolerance_minutes).context("reminder tolerance is out of range")?;
    Ok(ReminderWindow::new(lead, tolerance))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("not a boolean: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_list(" https://a.example , ,https://b.example"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn default_reminder_settings_build_the_standard_window() {
        let window = reminder_window(48, 15).unwrap();
        assert_eq!(window, ReminderWindow::default());
    }

    #[test]
    fn oversized_reminder_lead_is_an_error() {
        assert!(reminder_window(i64::MAX / 1000, 15).is_err());
        assert!(reminder_window(MAX_REMINDER_LEAD_HOURS + 1, 15).is_err());
        assert!(reminder_window(MAX_REMINDER_LEAD_HOURS, 15).is_ok());
        assert!(reminder_window(-1, 15).is_err());
    }

    #[test]
    fn reminder_tolerance_must_be_positive_and_bounded() {
        assert!(reminder_window(48, -15).is_err());
        assert!(reminder_window(48, 0).is_err());
        assert!(reminder_window(48, MAX_REMINDER_TOLERANCE_MINUTES + 1).is_err());

        let window = reminder_window(48, 1).unwrap();
        let now = chrono::Utc::now();
        let (from, to) = window.bounds(now);
        assert!(from < to);
    }

    #[test]
    fn lead_override_keeps_tolerance() {
        let core = CoreConfig {
            database_url: "postgres://localhost/kickoff".into(),
            expo_access_token: None,
            push_notifications_enabled: false,
            reminder_cron: DEFAULT_REMINDER_CRON.into(),
            reminder_window: reminder_window(48, 20).unwrap(),
            app_base_url: "http://localhost:3000".into(),
        };

        let overridden = core.clone().with_lead_hours(24).unwrap();
        assert_eq!(overridden.reminder_window.lead, Duration::hours(24));
        assert_eq!(overridden.reminder_window.tolerance, Duration::minutes(20));
        assert!(core.with_lead_hours(-6).is_err());
    }

    #[test]
    fn booleans_accept_common_spellings() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("off").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
