use crate::Result;
use crate::discovery::{DiscoveryFilter, DiscoveryMode};
use crate::hosting::ClientSettings;
use crate::worker::WorkerSettings;
use camino::Utf8Path;
use core::time::Duration;
use ohno::{IntoAppError, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// File looked up in the current directory when no path is given
pub const CONFIG_FILE_NAME: &str = "repo-health.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where `discover` sends its results
    #[serde(default)]
    pub discovery_mode: DiscoveryMode,

    /// Languages to search for
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Minimum star count of a discovered repository
    #[serde(default = "default_min_stars")]
    pub min_stars: u64,

    /// Maximum repositories kept per language
    #[serde(default = "default_max_repos")]
    pub max_repos: usize,

    /// Search results per page (1..=100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Messages received per worker batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between consecutive items of a batch
    #[serde(default = "default_item_delay", with = "humantime_serde")]
    pub item_delay: Duration,

    /// Timeout applied to every API request
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Sleep before retrying a rate-limited request without `Retry-After`
    #[serde(default = "default_rate_limit_backoff", with = "humantime_serde")]
    pub rate_limit_backoff: Duration,

    /// Rate-limit retries before giving up on a request
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,

    /// Days of commit history counted by the worker
    #[serde(default = "default_commit_window_days")]
    pub commit_window_days: u32,

    /// Key prefix of daily snapshots
    #[serde(default = "default_daily_prefix")]
    pub daily_prefix: String,

    /// Key prefix of weekly summaries
    #[serde(default = "default_weekly_prefix")]
    pub weekly_prefix: String,
}

fn default_languages() -> Vec<String> {
    vec!["Python".to_owned()]
}

const fn default_min_stars() -> u64 {
    100
}

const fn default_max_repos() -> usize {
    250
}

const fn default_page_size() -> u32 {
    100
}

const fn default_batch_size() -> usize {
    10
}

const fn default_item_delay() -> Duration {
    Duration::from_millis(300)
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_rate_limit_backoff() -> Duration {
    Duration::from_secs(5)
}

const fn default_max_rate_limit_retries() -> u32 {
    5
}

const fn default_commit_window_days() -> u32 {
    7
}

fn default_daily_prefix() -> String {
    "health/".to_owned()
}

fn default_weekly_prefix() -> String {
    "health/weekly/".to_owned()
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `repo-health.toml` in the current directory is
    /// used if it exists.
    pub fn load(config_path: Option<&Utf8Path>) -> Result<Self> {
        let (path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.to_owned(), text)
        } else {
            let path = Utf8Path::new(CONFIG_FILE_NAME);
            match fs::read_to_string(path) {
                Ok(text) => (path.to_owned(), text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            bail!("languages must list at least one language");
        }

        if let Some(lang) = self.languages.iter().find(|l| l.trim().is_empty() || l.contains(char::is_whitespace)) {
            bail!("invalid language '{lang}', languages must be single non-empty words");
        }

        if self.max_repos == 0 {
            bail!("max_repos must be greater than 0");
        }

        if !(1..=100).contains(&self.page_size) {
            bail!("page_size must be between 1 and 100, got {}", self.page_size);
        }

        if self.batch_size == 0 {
            bail!("batch_size must be greater than 0");
        }

        if self.commit_window_days == 0 {
            bail!("commit_window_days must be greater than 0");
        }

        for (name, prefix) in [("daily_prefix", &self.daily_prefix), ("weekly_prefix", &self.weekly_prefix)] {
            if !prefix.ends_with('/') {
                bail!("{name} must end with '/', got '{prefix}'");
            }
        }

        Ok(())
    }

    /// One discovery filter per configured language.
    #[must_use]
    pub fn discovery_filters(&self) -> Vec<DiscoveryFilter> {
        self.languages
            .iter()
            .map(|language| DiscoveryFilter {
                language: language.clone(),
                min_stars: self.min_stars,
                max_repos: self.max_repos,
                page_size: self.page_size,
            })
            .collect()
    }

    #[must_use]
    pub const fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            request_timeout: self.request_timeout,
            rate_limit_backoff: self.rate_limit_backoff,
            max_rate_limit_retries: self.max_rate_limit_retries,
        }
    }

    #[must_use]
    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            daily_prefix: self.daily_prefix.clone(),
            commit_window_days: self.commit_window_days,
            item_delay: self.item_delay,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
