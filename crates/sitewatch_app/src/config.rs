//! Run configuration.
//!
//! A RON file names the targets, state location, delivery credentials and
//! pipeline knobs. The parsed file is resolved into one explicit
//! [`AppConfig`] value with lifecycle scoped to a single run; nothing here
//! is process-global.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use sitewatch_core::{ExtractMode, MonitorTarget, ReportSettings, SelectorRule, TargetError};
use sitewatch_engine::{FetchSettings, PipelineSettings};

const DEFAULT_STATE_DIR: &str = "sitewatch_state";
const MAX_REPORT_LINES_LIMIT: usize = 20;

const BOT_TOKEN_ENV: &str = "SITEWATCH_BOT_TOKEN";
const CHAT_ID_ENV: &str = "SITEWATCH_CHAT_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config file: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("no targets configured")]
    NoTargets,
    #[error(transparent)]
    InvalidTarget(#[from] TargetError),
    #[error("max_report_lines must be between 1 and {MAX_REPORT_LINES_LIMIT}, got {0}")]
    InvalidReportCap(usize),
}

/// Telegram delivery credentials. Absence disables delivery; it is not an
/// error.
#[derive(Debug, Clone)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub targets: Vec<MonitorTarget>,
    pub state_dir: PathBuf,
    pub credentials: Option<TelegramCredentials>,
    pub fetch: FetchSettings,
    pub pipeline: PipelineSettings,
}

// On-disk layout. Kept separate from the resolved types so the file
// format can evolve without touching the pipeline.

#[derive(Debug, Deserialize)]
struct ConfigFile {
    targets: Vec<TargetEntry>,
    #[serde(default)]
    state_dir: Option<PathBuf>,
    #[serde(default)]
    telegram: Option<TelegramEntry>,
    #[serde(default)]
    user_agent: Option<String>,
    #[serde(default)]
    connect_timeout_secs: Option<u64>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    max_report_lines: Option<usize>,
    #[serde(default)]
    pause_between_targets_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TargetEntry {
    url: String,
    #[serde(default)]
    rule: Option<RuleEntry>,
    #[serde(default)]
    mode: Option<ModeEntry>,
}

#[derive(Debug, Deserialize)]
enum RuleEntry {
    ById(String),
    Css(String),
}

#[derive(Debug, Clone, Copy, Deserialize)]
enum ModeEntry {
    FullText,
    SubtreeText,
    LinkTextList,
}

/// Load and resolve the configuration, applying environment overrides
/// for the delivery credentials.
pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    resolve(&content, |name| env::var(name).ok())
}

/// Resolve a config file body against an environment lookup. Split from
/// [`load`] so tests can inject the environment.
fn resolve(
    content: &str,
    env_var: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let file: ConfigFile = ron::from_str(content)?;

    if file.targets.is_empty() {
        return Err(ConfigError::NoTargets);
    }

    let mut targets = Vec::with_capacity(file.targets.len());
    for entry in file.targets {
        let rule = entry.rule.map(|rule| match rule {
            RuleEntry::ById(id) => SelectorRule::ById(id),
            RuleEntry::Css(css) => SelectorRule::Css(css),
        });
        let mode = match entry.mode.unwrap_or(ModeEntry::FullText) {
            ModeEntry::FullText => ExtractMode::FullText,
            ModeEntry::SubtreeText => ExtractMode::SubtreeText,
            ModeEntry::LinkTextList => ExtractMode::LinkTextList,
        };
        targets.push(MonitorTarget::new(entry.url, rule, mode)?);
    }

    let max_report_lines = file.max_report_lines.unwrap_or(10);
    if max_report_lines == 0 || max_report_lines > MAX_REPORT_LINES_LIMIT {
        return Err(ConfigError::InvalidReportCap(max_report_lines));
    }

    let mut fetch = FetchSettings::default();
    if let Some(agent) = file.user_agent {
        fetch.user_agent = agent;
    }
    if let Some(secs) = file.connect_timeout_secs {
        fetch.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.request_timeout_secs {
        fetch.request_timeout = Duration::from_secs(secs);
    }

    let pipeline = PipelineSettings {
        pause_between_targets: file
            .pause_between_targets_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| PipelineSettings::default().pause_between_targets),
        report: ReportSettings {
            max_lines: max_report_lines,
        },
    };

    // Environment wins over the file, matching how the original deployment
    // injects its secrets.
    let bot_token = env_var(BOT_TOKEN_ENV).or_else(|| {
        file.telegram.as_ref().map(|t| t.bot_token.clone())
    });
    let chat_id = env_var(CHAT_ID_ENV).or_else(|| {
        file.telegram.as_ref().map(|t| t.chat_id.clone())
    });
    let credentials = match (bot_token, chat_id) {
        (Some(bot_token), Some(chat_id)) if !bot_token.is_empty() && !chat_id.is_empty() => {
            Some(TelegramCredentials { bot_token, chat_id })
        }
        _ => None,
    };

    Ok(AppConfig {
        targets,
        state_dir: file.state_dir.unwrap_or_else(|| DEFAULT_STATE_DIR.into()),
        credentials,
        fetch,
        pipeline,
    })
}

#[derive(Debug, Deserialize)]
struct TelegramEntry {
    bot_token: String,
    chat_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    (
        targets: [
            (url: "https://example.com/software-list",
             rule: Some(ById("software-updates")),
             mode: Some(LinkTextList)),
            (url: "https://example.com/news"),
        ],
        state_dir: Some("custom_state"),
        telegram: Some((bot_token: "file-token", chat_id: "file-chat")),
        max_report_lines: Some(15),
        pause_between_targets_ms: Some(250),
    )
    "#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parses_targets_with_defaults() {
        let config = resolve(SAMPLE, no_env).unwrap();
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[0].mode(), ExtractMode::LinkTextList);
        assert_eq!(
            config.targets[0].rule(),
            Some(&SelectorRule::ById("software-updates".to_string()))
        );
        // Second target: no rule, default mode.
        assert_eq!(config.targets[1].mode(), ExtractMode::FullText);
        assert!(config.targets[1].rule().is_none());

        assert_eq!(config.state_dir, PathBuf::from("custom_state"));
        assert_eq!(config.pipeline.report.max_lines, 15);
        assert_eq!(
            config.pipeline.pause_between_targets,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn credentials_come_from_file_when_env_is_empty() {
        let config = resolve(SAMPLE, no_env).unwrap();
        let creds = config.credentials.unwrap();
        assert_eq!(creds.bot_token, "file-token");
        assert_eq!(creds.chat_id, "file-chat");
    }

    #[test]
    fn environment_overrides_file_credentials() {
        let config = resolve(SAMPLE, |name| match name {
            BOT_TOKEN_ENV => Some("env-token".to_string()),
            CHAT_ID_ENV => Some("env-chat".to_string()),
            _ => None,
        })
        .unwrap();
        let creds = config.credentials.unwrap();
        assert_eq!(creds.bot_token, "env-token");
        assert_eq!(creds.chat_id, "env-chat");
    }

    #[test]
    fn missing_credentials_disable_delivery() {
        let minimal = r#"(targets: [(url: "https://example.com")])"#;
        let config = resolve(minimal, no_env).unwrap();
        assert!(config.credentials.is_none());
        assert_eq!(config.state_dir, PathBuf::from(DEFAULT_STATE_DIR));
    }

    #[test]
    fn empty_target_list_fails_fast() {
        let err = resolve("(targets: [])", no_env).unwrap_err();
        assert!(matches!(err, ConfigError::NoTargets));
    }

    #[test]
    fn invalid_target_url_is_rejected() {
        let broken = r#"(targets: [(url: "not a url")])"#;
        let err = resolve(broken, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTarget(_)));
    }

    #[test]
    fn report_cap_is_bounded() {
        let oversized = r#"
        (targets: [(url: "https://example.com")], max_report_lines: Some(50))
        "#;
        let err = resolve(oversized, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidReportCap(50)));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitewatch.ron");
        fs::write(&path, SAMPLE).unwrap();
        let config = load(&path).unwrap();
        assert_eq!(config.targets.len(), 2);
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let err = load(Path::new("/definitely/missing/sitewatch.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
