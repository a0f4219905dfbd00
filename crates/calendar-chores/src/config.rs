use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TOKEN_PATH: &str = "/opt/pi-k8s/token.json";

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub calendar: CalendarConfig,
    pub redis: RedisConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone)]
pub struct CalendarConfig {
    /// Display name of the calendar to poll
    pub name: String,
    /// Authorized-user credential written by a previous OAuth consent
    pub token_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    /// Pub/sub channel chore notifications are published on
    pub channel: String,
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    /// Total width of the window polled each tick, centered on now
    pub range_secs: u64,
    /// Delay between ticks
    pub sleep: Duration,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{} must be set", key));

        let range_secs: u64 = required("RANGE")?
            .parse()
            .context("RANGE must be a whole number of seconds")?;
        if range_secs == 0 {
            bail!("RANGE must be greater than zero");
        }

        let sleep_secs: u64 = required("SLEEP")?
            .parse()
            .context("SLEEP must be a whole number of seconds")?;

        Ok(Self {
            calendar: CalendarConfig {
                name: required("GOOGLE_CALENDAR")?,
                token_path: lookup("GOOGLE_TOKEN_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH)),
            },
            redis: RedisConfig {
                host: required("REDIS_HOST")?,
                port: required("REDIS_PORT")?
                    .parse()
                    .context("REDIS_PORT must be a valid port number")?,
                channel: required("REDIS_CHANNEL")?,
            },
            polling: PollingConfig {
                range_secs,
                sleep: Duration::from_secs(sleep_secs),
            },
        })
    }
}
