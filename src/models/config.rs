//! Application configuration structures.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Target, Transform};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Program-wide defaults
    #[serde(default)]
    pub settings: Settings,

    /// Logging behavior
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Monitored pages
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| AppError::storage(path.to_path_buf(), e))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        self.targets().map(|_| ())
    }

    /// Validate and build the immutable target list.
    pub fn targets(&self) -> Result<Vec<Arc<Target>>> {
        self.settings.validate()?;

        if self.targets.is_empty() {
            return Err(AppError::validation("No targets defined"));
        }

        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(self.targets.len());
        for raw in &self.targets {
            let target = raw.build(&self.settings)?;
            if !seen.insert(target.url.to_string()) {
                return Err(AppError::validation(format!(
                    "target {} is defined more than once",
                    target.url
                )));
            }
            targets.push(Arc::new(target));
        }
        Ok(targets)
    }
}

/// Settings shared by every target unless overridden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Fetch deadline in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Default time between checks in seconds
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Default notification recipient
    #[serde(default)]
    pub recv_mail: Option<String>,

    /// Default transforms for targets without their own list
    #[serde(default)]
    pub strip: Vec<String>,
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(AppError::validation("settings.user_agent is empty"));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::validation("settings.timeout_secs must be > 0"));
        }
        if self.interval_secs == 0 {
            return Err(AppError::validation("settings.interval_secs must be > 0"));
        }
        if let Some(address) = &self.recv_mail {
            validate_mail(address)?;
        }
        validate_transforms(&self.strip)?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            interval_secs: defaults::interval(),
            recv_mail: None,
            strip: Vec::new(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// Raw per-target settings as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Page address
    pub url: String,

    /// CSS selector; empty selects the whole document
    #[serde(default)]
    pub selection: String,

    /// Inclusion pattern
    #[serde(default)]
    pub include: Option<String>,

    /// Exclusion pattern
    #[serde(default)]
    pub exclude: Option<String>,

    /// Transform names; falls back to `settings.strip`
    #[serde(default)]
    pub strip: Option<Vec<String>>,

    /// Dissimilarity threshold in percent
    #[serde(default)]
    pub threshold: f64,

    /// Time between checks in seconds; falls back to `settings.interval_secs`
    #[serde(default)]
    pub interval_secs: Option<u64>,

    /// Notification recipient; falls back to `settings.recv_mail`
    #[serde(default)]
    pub recv_mail: Option<String>,

    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl TargetConfig {
    fn build(&self, settings: &Settings) -> Result<Target> {
        let url = Url::parse(self.url.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::validation(format!(
                "{}: only http and https targets are supported",
                self.url
            )));
        }

        if !self.selection.trim().is_empty() {
            scraper::Selector::parse(&self.selection)
                .map_err(|e| AppError::selector(&self.selection, format!("{e:?}")))?;
        }
        for pattern in [&self.include, &self.exclude].into_iter().flatten() {
            Regex::new(pattern).map_err(|e| AppError::pattern(pattern, e))?;
        }

        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(AppError::validation(format!(
                "{}: threshold must be between 0 and 100, got {}",
                self.url, self.threshold
            )));
        }

        let interval_secs = self.interval_secs.unwrap_or(settings.interval_secs);
        if interval_secs == 0 {
            return Err(AppError::validation(format!(
                "{}: interval_secs must be > 0",
                self.url
            )));
        }

        let recv_mail = self
            .recv_mail
            .clone()
            .or_else(|| settings.recv_mail.clone())
            .filter(|address| !address.trim().is_empty());
        if let Some(address) = &recv_mail {
            validate_mail(address)?;
        }

        for (name, value) in &self.headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AppError::validation(format!("invalid header name `{name}`: {e}")))?;
            HeaderValue::from_str(value).map_err(|e| {
                AppError::validation(format!("invalid value for header `{name}`: {e}"))
            })?;
        }

        let names = self.strip.as_ref().unwrap_or(&settings.strip);
        validate_transforms(names)?;

        Ok(Target {
            url,
            selection: self.selection.trim().to_string(),
            include: self.include.clone().filter(|p| !p.is_empty()),
            exclude: self.exclude.clone().filter(|p| !p.is_empty()),
            transforms: names.iter().map(|n| Transform::from_name(n)).collect(),
            interval: Duration::from_secs(interval_secs),
            threshold: self.threshold,
            recv_mail,
            headers: self.headers.clone(),
        })
    }
}

fn validate_transforms(names: &[String]) -> Result<()> {
    for name in names {
        if !Transform::from_name(name).is_known() {
            return Err(AppError::validation(format!(
                "invalid strip function `{name}`; expected one of {}",
                Transform::NAMES.join(", ")
            )));
        }
    }
    Ok(())
}

fn validate_mail(address: &str) -> Result<()> {
    if !address.contains('@') {
        return Err(AppError::validation(format!(
            "invalid mail `{address}`; correct syntax -> `name@domain.tld`"
        )));
    }
    Ok(())
}

mod defaults {
    pub fn user_agent() -> String {
        concat!("Mozilla/5.0 (compatible; pagewatch/", env!("CARGO_PKG_VERSION"), ")").into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn interval() -> u64 {
        60
    }
    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[settings]
timeout_secs = 5
recv_mail = "me@example.org"
strip = ["attrs"]

[logging]
level = "debug"

[[targets]]
url = "https://example.org/news"
selection = "div.news"
include = "Post #\\d+"
strip = ["HTML", "numbers"]
threshold = 2.5
interval_secs = 300
headers = { "X-Token" = "abc" }

[[targets]]
url = "https://example.org/blog?page=1"
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(config.settings.timeout_secs, 5);
        assert_eq!(config.logging.level, "debug");

        let targets = config.targets().unwrap();
        assert_eq!(targets.len(), 2);

        let news = &targets[0];
        assert_eq!(news.selection, "div.news");
        assert_eq!(news.include.as_deref(), Some("Post #\\d+"));
        assert_eq!(news.transforms, vec![Transform::Html, Transform::Numbers]);
        assert_eq!(news.threshold, 2.5);
        assert_eq!(news.interval, Duration::from_secs(300));
        assert_eq!(news.recv_mail.as_deref(), Some("me@example.org"));
        assert_eq!(news.headers.get("X-Token").map(String::as_str), Some("abc"));

        let blog = &targets[1];
        assert_eq!(blog.transforms, vec![Transform::Attrs]);
        assert_eq!(blog.interval, Duration::from_secs(60));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("[[targets]]\nurl = \"http://example.org/\"").unwrap();
        assert_eq!(config.settings.timeout_secs, 10);
        assert_eq!(config.settings.interval_secs, 60);
        assert!(config.validate().is_ok());
    }

    fn with_target(extra: &str) -> Config {
        Config::from_toml(&format!(
            "[[targets]]\nurl = \"http://example.org/\"\n{extra}"
        ))
        .unwrap()
    }

    #[test]
    fn validate_rejects_empty_targets() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_strip_function() {
        let config = with_target(r#"strip = ["html", "emoji"]"#);
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let config = with_target(r#"selection = "[[invalid""#);
        assert!(matches!(config.validate(), Err(AppError::Selector { .. })));
    }

    #[test]
    fn validate_rejects_bad_pattern() {
        let config = with_target(r#"exclude = "(unclosed""#);
        assert!(matches!(config.validate(), Err(AppError::Pattern { .. })));
    }

    #[test]
    fn validate_rejects_threshold_out_of_range() {
        let config = with_target("threshold = 120.0");
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_mail() {
        let config = with_target(r#"recv_mail = "nobody""#);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_urls() {
        let config = Config::from_toml(
            "[[targets]]\nurl = \"http://example.org/\"\n[[targets]]\nurl = \"http://example.org/\"",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_scheme() {
        let config = Config::from_toml("[[targets]]\nurl = \"ftp://example.org/\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = with_target("");
        config.settings.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
