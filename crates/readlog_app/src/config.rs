use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::LevelFilter;
use readlog_engine::{DocumentLocator, FetchSettings, GitHubSettings, RetryPolicy};
use readlog_logging::{LogDestination, DEFAULT_LOG_FILE};
use serde::Deserialize;

pub(crate) const DEFAULT_CONFIG_FILE: &str = "readlog.ron";
pub(crate) const TOKEN_ENV: &str = "READLOG_GITHUB_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct RepositoryConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_string(),
            path: "data/reading.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub(crate) enum LogTarget {
    #[default]
    Terminal,
    File,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct LoggingConfig {
    pub level: String,
    pub target: LogTarget,
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            target: LogTarget::Terminal,
            file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl LoggingConfig {
    pub(crate) fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.level)
            .with_context(|| format!("unknown log level {:?}", self.level))
    }

    pub(crate) fn destination(&self) -> LogDestination {
        match self.target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File(self.file.clone()),
            LogTarget::Both => LogDestination::Both(self.file.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub repository: RepositoryConfig,
    pub api_base: String,
    pub metadata_timeout_secs: u64,
    pub max_attempts: u32,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            repository: RepositoryConfig::default(),
            api_base: GitHubSettings::default().api_base,
            metadata_timeout_secs: FetchSettings::default().request_timeout.as_secs(),
            max_attempts: RetryPolicy::default().max_attempts,
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    pub(crate) fn locator(&self) -> Result<DocumentLocator> {
        let repo = &self.repository;
        if repo.owner.is_empty() || repo.repo.is_empty() {
            bail!("repository.owner and repository.repo must be set in the config file");
        }
        Ok(DocumentLocator::new(
            repo.owner.as_str(),
            repo.repo.as_str(),
            repo.path.as_str(),
            repo.branch.as_str(),
        ))
    }

    pub(crate) fn github_settings(&self, token: Option<String>) -> GitHubSettings {
        GitHubSettings {
            api_base: self.api_base.clone(),
            token: token.unwrap_or_default(),
            ..GitHubSettings::default()
        }
    }

    pub(crate) fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: Duration::from_secs(self.metadata_timeout_secs),
            ..FetchSettings::default()
        }
    }

    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            ..RetryPolicy::default()
        }
    }
}

pub(crate) fn parse_config(content: &str) -> Result<AppConfig> {
    let config: AppConfig = ron::from_str(content).context("failed to parse config")?;
    if config.max_attempts == 0 {
        bail!("max_attempts must be at least 1");
    }
    if config.metadata_timeout_secs == 0 {
        bail!("metadata_timeout_secs must be at least 1");
    }
    config.logging.level_filter()?;
    Ok(config)
}

/// Loads the config file. A missing default file yields the defaults; a
/// missing explicitly requested file is an error.
pub(crate) fn load_config(path: &Path, explicit: bool) -> Result<AppConfig> {
    match fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .with_context(|| format!("invalid config file {}", path.display())),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !explicit => {
            Ok(AppConfig::default())
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to read config file {}", path.display()))
        }
    }
}

/// Token from the environment; blank values count as unset.
pub(crate) fn token_from_env() -> Option<String> {
    std::env::var(TOKEN_ENV)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
