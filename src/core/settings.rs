use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub poll_interval_secs: u64,
    pub backoff_secs: u64,
    pub request_timeout_secs: u64,
    pub target_date: Option<NaiveDate>,
    pub search: SearchSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            backoff_secs: 60,
            request_timeout_secs: 30,
            target_date: None,
            search: SearchSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// ICBC point-of-service id for the exam location.
    pub location_id: u32,
    pub exam_type: String,
    /// Preferred days of week, 0 = Sunday through 6 = Saturday.
    pub days_of_week: Vec<u8>,
    /// Preferred parts of day, 0 = morning, 1 = afternoon.
    pub parts_of_day: Vec<u8>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            location_id: 8,
            exam_type: "5-R-1".to_string(),
            days_of_week: vec![0, 1, 2, 3, 4, 5, 6],
            parts_of_day: vec![0, 1],
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("icbc-watch").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path().context("Could not determine config directory")?;

        if !path.exists() {
            tracing::info!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(?path, "Loaded config");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than zero");
        }
        if self.backoff_secs == 0 {
            anyhow::bail!("backoff_secs must be greater than zero");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }
        if self.search.days_of_week.is_empty()
            || self.search.days_of_week.iter().any(|d| *d > 6)
        {
            anyhow::bail!(
                "search.days_of_week must be a non-empty list of values 0-6, got {:?}",
                self.search.days_of_week
            );
        }
        if self.search.parts_of_day.is_empty()
            || self.search.parts_of_day.iter().any(|p| *p > 1)
        {
            anyhow::bail!(
                "search.parts_of_day must be a non-empty list of values 0-1, got {:?}",
                self.search.parts_of_day
            );
        }
        Ok(())
    }
}

/// Applicant identity fields used by both the login and search calls.
/// Sourced from the environment only, never from the config file.
#[derive(Debug, Clone)]
pub struct Identity {
    pub last_name: String,
    pub licence_number: String,
    pub keyword: String,
}

impl Identity {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            last_name: env::var("DRIVER_LAST_NAME").context("DRIVER_LAST_NAME must be set")?,
            licence_number: env::var("LICENSE_NUMBER").context("LICENSE_NUMBER must be set")?,
            keyword: env::var("KEYWORD").context("KEYWORD must be set")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .context("TELEGRAM_BOT_TOKEN must be set")?,
            chat_id: env::var("TELEGRAM_CHAT_ID").context("TELEGRAM_CHAT_ID must be set")?,
        })
    }
}

/// Everything the watcher needs, loaded once at startup. Any failure here
/// is a configuration error and aborts the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub identity: Identity,
    pub telegram: TelegramSettings,
    pub target_date: NaiveDate,
}

impl Config {
    pub fn load() -> Result<Self> {
        let settings = Settings::load()?;
        settings.validate()?;

        let identity = Identity::from_env()?;
        let telegram = TelegramSettings::from_env()?;
        let target_date = resolve_target_date(
            env::var("TARGET_DATE").ok(),
            settings.target_date,
            Local::now().date_naive(),
        )?;

        Ok(Self {
            settings,
            identity,
            telegram,
            target_date,
        })
    }
}

/// TARGET_DATE from the environment wins over the config file; with neither
/// set, an appointment counts as early if it lands within the next week.
fn resolve_target_date(
    env_value: Option<String>,
    file_value: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<NaiveDate> {
    match env_value {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("TARGET_DATE must be YYYY-MM-DD, got {raw:?}")),
        None => Ok(file_value.unwrap_or(today + Duration::days(7))),
    }
}
