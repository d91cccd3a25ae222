//! Monitored target descriptor.

use std::collections::BTreeMap;
use std::time::Duration;

use url::Url;

use crate::models::Transform;
use crate::utils::url::cache_key;

/// One monitored page with its extraction, threshold and notification
/// settings. Built once from validated configuration and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Address of the page
    pub url: Url,

    /// CSS selector for the part of the page to compare; empty selects all
    pub selection: String,

    /// Keep only matches of this pattern
    pub include: Option<String>,

    /// Delete every match of this pattern
    pub exclude: Option<String>,

    /// Transforms applied in order after selection
    pub transforms: Vec<Transform>,

    /// Time to wait between checks
    pub interval: Duration,

    /// Dissimilarity that must be exceeded to count as changed
    pub threshold: f64,

    /// Address to notify on change
    pub recv_mail: Option<String>,

    /// Extra request headers
    pub headers: BTreeMap<String, String>,
}

impl Target {
    /// A target with default settings for `url`.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            selection: String::new(),
            include: None,
            exclude: None,
            transforms: Vec::new(),
            interval: Duration::from_secs(60),
            threshold: 0.0,
            recv_mail: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = selection.into();
        self
    }

    pub fn with_transforms<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.transforms = names
            .into_iter()
            .map(|name| Transform::from_name(name.as_ref()))
            .collect();
        self
    }

    pub fn with_include(mut self, pattern: impl Into<String>) -> Self {
        self.include = Some(pattern.into());
        self
    }

    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude = Some(pattern.into());
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_recv_mail(mut self, address: impl Into<String>) -> Self {
        self.recv_mail = Some(address.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Identity used for the update set and log lines.
    pub fn id(&self) -> &str {
        self.url.as_str()
    }

    /// File name stem for the cache entries of this target.
    pub fn cache_key(&self) -> String {
        cache_key(&self.url)
    }
}
