use std::fmt;

use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// How a target's relevant content is picked out of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// Visible text of the whole document.
    FullText,
    /// Visible text of the first element matching the selector rule.
    SubtreeText,
    /// Text labels of hyperlinks within the matched scope.
    LinkTextList,
}

/// Rule for narrowing extraction to part of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorRule {
    /// Match the element carrying this `id` attribute.
    ById(String),
    /// Match the first element hit by a CSS selector.
    Css(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("invalid target url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Deterministic, storage-safe identifier for a target.
///
/// Derived from the URL alone (lowercase hex SHA-256), so the same target
/// always maps to the same state entry across runs regardless of URL length
/// or characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetKey(String);

impl TargetKey {
    pub fn for_url(url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(64);
        for byte in digest.iter() {
            use std::fmt::Write;
            let _ = write!(&mut hex, "{byte:02x}");
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One monitored page: URL, optional selection rule, extraction mode.
///
/// Immutable for the lifetime of a run; built from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorTarget {
    url: String,
    rule: Option<SelectorRule>,
    mode: ExtractMode,
}

impl MonitorTarget {
    pub fn new(
        url: impl Into<String>,
        rule: Option<SelectorRule>,
        mode: ExtractMode,
    ) -> Result<Self, TargetError> {
        let url = url.into();
        if let Err(err) = Url::parse(&url) {
            return Err(TargetError::InvalidUrl {
                url,
                reason: err.to_string(),
            });
        }
        Ok(Self { url, rule, mode })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn rule(&self) -> Option<&SelectorRule> {
        self.rule.as_ref()
    }

    pub fn mode(&self) -> ExtractMode {
        self.mode
    }

    pub fn key(&self) -> TargetKey {
        TargetKey::for_url(&self.url)
    }
}
