//! Arguments and setup shared by the pipeline commands.

use super::config::Config;
use crate::Result;
use crate::hosting::Client;
use crate::queue::SpoolQueue;
use crate::storage::FsObjectStore;
use camino::Utf8PathBuf;
use clap::{Args, ValueEnum};
use ohno::{app_err, bail};

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Deployment values a command may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Bucket,
    QueueUrl,
    GithubToken,
}

impl Setting {
    const fn describe(self) -> &'static str {
        match self {
            Self::Bucket => "BUCKET_NAME (--bucket)",
            Self::QueueUrl => "QUEUE_URL (--queue-url)",
            Self::GithubToken => "GITHUB_TOKEN (--github-token)",
        }
    }
}

/// Arguments shared by the commands that talk to GitHub, storage, or the queue
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to configuration file (default is `repo-health.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Name of the bucket holding snapshots and summaries
    #[arg(long, value_name = "NAME", env = "BUCKET_NAME")]
    pub bucket: Option<String>,

    /// Directory under which buckets are stored
    #[arg(long, value_name = "PATH", env = "STORAGE_ROOT", default_value = ".")]
    pub storage_root: Utf8PathBuf,

    /// Work queue location, as a `file://` URL or a spool directory path
    #[arg(long, value_name = "URL", env = "QUEUE_URL")]
    pub queue_url: Option<String>,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, value_name = "URL", env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub api_base_url: String,

    /// Set the logging level
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}

impl CommonArgs {
    fn value(&self, setting: Setting) -> Option<&str> {
        let value = match setting {
            Setting::Bucket => self.bucket.as_deref(),
            Setting::QueueUrl => self.queue_url.as_deref(),
            Setting::GithubToken => self.github_token.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    fn get(&self, setting: Setting) -> Result<&str> {
        self.value(setting)
            .ok_or_else(|| app_err!("missing required configuration: {}", setting.describe()))
    }

    /// Fail unless every listed setting has a value, naming all that are missing.
    pub fn require(&self, settings: &[Setting]) -> Result<()> {
        let missing: Vec<&str> = settings
            .iter()
            .filter(|s| self.value(**s).is_none())
            .map(|s| s.describe())
            .collect();

        if !missing.is_empty() {
            bail!("missing required configuration: {}", missing.join(", "));
        }

        Ok(())
    }

    /// The configured bucket, as a directory under the storage root.
    pub fn open_store(&self) -> Result<FsObjectStore> {
        let bucket = self.get(Setting::Bucket)?;
        if bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            bail!("invalid bucket name '{bucket}'");
        }

        Ok(FsObjectStore::new(self.storage_root.join(bucket)))
    }

    pub fn open_queue(&self) -> Result<SpoolQueue> {
        SpoolQueue::from_url(self.get(Setting::QueueUrl)?)
    }

    pub fn api_client(&self, config: &Config) -> Result<Client> {
        let token = self.get(Setting::GithubToken)?;
        Client::new(Some(token), self.api_base_url.as_str(), config.client_settings())
    }

    /// Set up logging and load the configuration file.
    pub fn init(&self) -> Result<Config> {
        init_logging(self.log_level);
        Config::load(self.config.as_deref())
    }
}

pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // A logger may already be installed when commands run more than once in a process
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}
