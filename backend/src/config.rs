//! Application configuration.
//!
//! Settings are read from `meeting-planner.toml` (or the file named by
//! `MEETING_PLANNER_CONFIG`) and then overridden by environment variables:
//!
//! - `HOST`, `PORT`: listen address
//! - `SCHEDULING_TIMEZONE`: IANA zone used for slot rules (e.g. `Europe/Paris`)
//! - `REPOSITORY_TYPE`: `local` or `postgres`
//! - `DATABASE_URL`: Postgres connection string
//!
//! Every section is optional; a missing file yields the defaults.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [repository]
//! type = "local"
//!
//! [scheduling]
//! timezone = "Europe/Paris"
//! workday_start = "08:30"
//! workday_end = "18:30"
//! max_duration_minutes = 120
//! grace_window_minutes = 5
//! allowed_weekdays = ["mon", "tue", "wed", "thu", "fri"]
//! ```

use chrono::{Duration, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::{PostgresSettings, RepositoryConfig, RepositorySettings};
use crate::services::slot_validator::{
    NowPrecision, PolicyError, SlotValidator, ValidationPolicy,
};

pub const CONFIG_FILE_NAME: &str = "meeting-planner.toml";
pub const CONFIG_PATH_ENV: &str = "MEETING_PLANNER_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("invalid scheduling policy: {0}")]
    Policy(#[from] PolicyError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub postgres: PostgresSettings,
    #[serde(default)]
    pub scheduling: SchedulingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Scheduling rules, all shared by the submission and preview validators
/// except the grace window, which only applies on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingSettings {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_workday_start")]
    pub workday_start: String,
    #[serde(default = "default_workday_end")]
    pub workday_end: String,
    #[serde(default = "default_max_duration_minutes")]
    pub max_duration_minutes: i64,
    #[serde(default = "default_grace_window_minutes")]
    pub grace_window_minutes: i64,
    #[serde(default = "default_allowed_weekdays")]
    pub allowed_weekdays: Vec<String>,
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            workday_start: default_workday_start(),
            workday_end: default_workday_end(),
            max_duration_minutes: default_max_duration_minutes(),
            grace_window_minutes: default_grace_window_minutes(),
            allowed_weekdays: default_allowed_weekdays(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_workday_start() -> String {
    "08:30".to_string()
}

fn default_workday_end() -> String {
    "18:30".to_string()
}

fn default_max_duration_minutes() -> i64 {
    120
}

fn default_grace_window_minutes() -> i64 {
    5
}

fn default_allowed_weekdays() -> Vec<String> {
    ["mon", "tue", "wed", "thu", "fri"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

fn parse_time_of_day(field: &str, value: &str) -> ConfigResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        ConfigError::Invalid(format!(
            "scheduling.{} must be HH:MM, got '{}'",
            field, value
        ))
    })
}

fn minutes_setting(field: &str, minutes: i64) -> ConfigResult<Duration> {
    Duration::try_minutes(minutes).ok_or_else(|| {
        ConfigError::Invalid(format!(
            "scheduling.{} is out of range: {}",
            field, minutes
        ))
    })
}

impl SchedulingSettings {
    pub fn timezone(&self) -> ConfigResult<Tz> {
        self.timezone.trim().parse::<Tz>().map_err(|_| {
            ConfigError::Invalid(format!("unknown timezone '{}'", self.timezone))
        })
    }

    fn shared_policy(&self) -> ConfigResult<ValidationPolicy> {
        let allowed_weekdays = self
            .allowed_weekdays
            .iter()
            .map(|day| {
                day.trim().parse::<Weekday>().map_err(|_| {
                    ConfigError::Invalid(format!("unknown weekday '{}'", day))
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(ValidationPolicy {
            workday_start: parse_time_of_day("workday_start", &self.workday_start)?,
            workday_end: parse_time_of_day("workday_end", &self.workday_end)?,
            max_duration: minutes_setting("max_duration_minutes", self.max_duration_minutes)?,
            allowed_weekdays,
            ..ValidationPolicy::submission()
        })
    }

    /// Policy for the submission path: configured grace window from the exact
    /// current instant.
    pub fn submission_policy(&self) -> ConfigResult<ValidationPolicy> {
        let policy = self.shared_policy()?.with_lead_time(
            minutes_setting("grace_window_minutes", self.grace_window_minutes)?,
            NowPrecision::Exact,
        );
        policy.validate()?;
        Ok(policy)
    }

    /// Policy for the preview path: no grace window, minute precision.
    pub fn preview_policy(&self) -> ConfigResult<ValidationPolicy> {
        let policy = self
            .shared_policy()?
            .with_lead_time(Duration::zero(), NowPrecision::Minute);
        policy.validate()?;
        Ok(policy)
    }

    /// Build the `(submission, preview)` validator pair.
    pub fn validators(&self) -> ConfigResult<(SlotValidator, SlotValidator)> {
        let tz = self.timezone()?;
        Ok((
            SlotValidator::new(self.submission_policy()?, tz),
            SlotValidator::new(self.preview_policy()?, tz),
        ))
    }
}

impl AppConfig {
    /// Parse a configuration file without applying environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// First config file found among `MEETING_PLANNER_CONFIG`, the working
    /// directory, `backend/` and the parent directory.
    pub fn locate() -> Option<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(explicit));
        }

        [
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from("backend").join(CONFIG_FILE_NAME),
            PathBuf::from("..").join(CONFIG_FILE_NAME),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Load the located file (or defaults), then apply environment overrides
    /// and check the scheduling section.
    pub fn load() -> ConfigResult<Self> {
        let mut config = match Self::locate() {
            Some(path) => {
                log::info!("loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                log::info!("no {} found, using defaults", CONFIG_FILE_NAME);
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.scheduling.validators()?;
        Ok(config)
    }

    /// Apply `HOST`, `PORT`, `SCHEDULING_TIMEZONE`, `REPOSITORY_TYPE` and
    /// `DATABASE_URL` from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT must be a port number, got '{}'", port)))?;
        }
        if let Some(tz) = lookup("SCHEDULING_TIMEZONE") {
            self.scheduling.timezone = tz;
        }
        if let Some(repo_type) = lookup("REPOSITORY_TYPE") {
            self.repository.repo_type = repo_type;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.postgres.database_url = url;
        }
        Ok(())
    }

    /// The `[repository]` and `[postgres]` sections for the repository factory.
    pub fn repository_config(&self) -> RepositoryConfig {
        RepositoryConfig {
            repository: self.repository.clone(),
            postgres: self.postgres.clone(),
        }
    }
}
