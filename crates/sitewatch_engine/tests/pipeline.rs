use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sitewatch_core::{Classification, ContentSnapshot, ExtractMode, MonitorTarget};
use sitewatch_engine::{
    FetchError, FetchedPage, Fetcher, FileStateStore, Notifier, NotifyError, Orchestrator,
    PipelineSettings, StateStore, StoreError, TargetState,
};
use tempfile::TempDir;

/// Serves canned markup per URL; unknown URLs fail like the network would.
#[derive(Default)]
struct StubFetcher {
    pages: HashMap<String, String>,
}

impl StubFetcher {
    fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }
}

#[async_trait::async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        match self.pages.get(url) {
            Some(html) => Ok(FetchedPage {
                html: html.clone(),
                final_url: url.to_string(),
                byte_len: html.len() as u64,
            }),
            None => Err(FetchError::Network("connection refused".to_string())),
        }
    }
}

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail_delivery: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail_delivery: true,
        }
    }

    fn sent(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail_delivery {
            return Err(NotifyError::Status(502));
        }
        Ok(())
    }
}

/// Store whose reads always fail, simulating a broken state directory.
struct FailingStore;

impl StateStore for FailingStore {
    fn load(&self, _target: &MonitorTarget) -> Result<Option<ContentSnapshot>, StoreError> {
        Err(StoreError::StateDir("disk on fire".to_string()))
    }

    fn save(&self, _target: &MonitorTarget, _snapshot: &ContentSnapshot) -> Result<(), StoreError> {
        Err(StoreError::StateDir("disk on fire".to_string()))
    }
}

fn settings() -> PipelineSettings {
    PipelineSettings {
        pause_between_targets: Duration::ZERO,
        ..PipelineSettings::default()
    }
}

fn text_target(url: &str) -> MonitorTarget {
    MonitorTarget::new(url, None, ExtractMode::FullText).unwrap()
}

fn state_dir_contents(dir: &Path) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            let body = fs::read_to_string(e.path()).unwrap();
            (name, body)
        })
        .collect();
    entries.sort();
    entries
}

#[tokio::test]
async fn first_observation_notifies_once_and_persists() {
    let temp = TempDir::new().unwrap();
    let url = "https://example.com/page";
    let fetcher = Arc::new(StubFetcher::default().with_page(url, "<p>initial content</p>"));
    let store = Arc::new(FileStateStore::new(temp.path().to_path_buf()));
    let notifier = Arc::new(RecordingNotifier::default());

    let orchestrator = Orchestrator::new(fetcher, store.clone(), notifier.clone(), settings());
    let targets = vec![text_target(url)];
    let reports = orchestrator.run_cycle(&targets).await;

    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0].classification,
        Some(Classification::FirstObservation)
    );
    assert_eq!(reports[0].state, TargetState::Persisted);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Monitoring started"));

    let stored = store.load(&targets[0]).unwrap().unwrap();
    assert_eq!(stored, ContentSnapshot::from_text("initial content"));
}

#[tokio::test]
async fn second_cycle_with_same_content_is_unchanged_and_store_untouched() {
    let temp = TempDir::new().unwrap();
    let url = "https://example.com/page";
    let fetcher = Arc::new(StubFetcher::default().with_page(url, "<p>stable</p>"));
    let store = Arc::new(FileStateStore::new(temp.path().to_path_buf()));
    let notifier = Arc::new(RecordingNotifier::default());

    let orchestrator = Orchestrator::new(fetcher, store, notifier.clone(), settings());
    let targets = vec![text_target(url)];

    orchestrator.run_cycle(&targets).await;
    let before = state_dir_contents(temp.path());

    let reports = orchestrator.run_cycle(&targets).await;
    assert_eq!(reports[0].classification, Some(Classification::Unchanged));
    assert_eq!(reports[0].state, TargetState::Skipped);

    let after = state_dir_contents(temp.path());
    assert_eq!(before, after);
    // Only the first-observation message went out.
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn whitespace_drift_is_reported_as_trivial_and_persisted() {
    let temp = TempDir::new().unwrap();
    let url = "https://example.com/page";
    let fetcher = Arc::new(StubFetcher::default().with_page(url, "<p>Driver v1.2 released</p>"));
    let store = Arc::new(FileStateStore::new(temp.path().to_path_buf()));
    let notifier = Arc::new(RecordingNotifier::default());

    let targets = vec![text_target(url)];
    store
        .save(&targets[0], &ContentSnapshot::from_text("Driver v1.2  released"))
        .unwrap();

    let orchestrator = Orchestrator::new(fetcher, store.clone(), notifier.clone(), settings());
    let reports = orchestrator.run_cycle(&targets).await;

    assert_eq!(reports[0].classification, Some(Classification::Trivial));
    assert_eq!(reports[0].state, TargetState::Persisted);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].contains("```"));

    // The drifted form is now the stored baseline, so it is not re-flagged.
    let stored = store.load(&targets[0]).unwrap().unwrap();
    assert_eq!(stored, ContentSnapshot::from_text("Driver v1.2 released"));
}

#[tokio::test]
async fn failing_target_does_not_block_changed_target() {
    let temp = TempDir::new().unwrap();
    let url_a = "https://example.com/broken";
    let url_b = "https://example.com/changed";
    // Only B is reachable.
    let fetcher = Arc::new(
        StubFetcher::default().with_page(url_b, "<ul><li>Driver v1.2</li><li>Driver v1.3</li></ul>"),
    );
    let store = Arc::new(FileStateStore::new(temp.path().to_path_buf()));
    let notifier = Arc::new(RecordingNotifier::default());

    let targets = vec![text_target(url_a), text_target(url_b)];
    store
        .save(&targets[1], &ContentSnapshot::from_text("Driver v1.2"))
        .unwrap();

    let orchestrator = Orchestrator::new(fetcher, store.clone(), notifier.clone(), settings());
    let reports = orchestrator.run_cycle(&targets).await;

    // A: fetch failed, nothing notified, nothing written.
    assert_eq!(reports[0].state, TargetState::NotPersisted);
    assert!(reports[0].error.is_some());
    assert!(reports[0].classification.is_none());
    assert!(store.load(&targets[0]).unwrap().is_none());

    // B: substantive change, notified and persisted.
    assert_eq!(reports[1].classification, Some(Classification::Substantive));
    assert_eq!(reports[1].state, TargetState::Persisted);
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Driver v1.3"));
}

#[tokio::test]
async fn notification_failure_does_not_block_persistence() {
    let temp = TempDir::new().unwrap();
    let url = "https://example.com/page";
    let fetcher = Arc::new(StubFetcher::default().with_page(url, "<p>fresh</p>"));
    let store = Arc::new(FileStateStore::new(temp.path().to_path_buf()));
    let notifier = Arc::new(RecordingNotifier::failing());

    let targets = vec![text_target(url)];
    let orchestrator = Orchestrator::new(fetcher, store.clone(), notifier.clone(), settings());
    let reports = orchestrator.run_cycle(&targets).await;

    assert!(!reports[0].notified);
    assert_eq!(reports[0].state, TargetState::Persisted);
    assert!(store.load(&targets[0]).unwrap().is_some());
}

#[tokio::test]
async fn store_read_failure_means_no_notification_and_no_write() {
    let url = "https://example.com/page";
    let fetcher = Arc::new(StubFetcher::default().with_page(url, "<p>content</p>"));
    let notifier = Arc::new(RecordingNotifier::default());

    let orchestrator = Orchestrator::new(
        fetcher,
        Arc::new(FailingStore),
        notifier.clone(),
        settings(),
    );
    let reports = orchestrator.run_cycle(&[text_target(url)]).await;

    assert_eq!(reports[0].state, TargetState::NotPersisted);
    assert!(reports[0].error.is_some());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn degraded_extraction_still_completes_the_target() {
    let temp = TempDir::new().unwrap();
    let url = "https://example.com/page";
    let fetcher = Arc::new(StubFetcher::default().with_page(url, "<p>body text</p>"));
    let store = Arc::new(FileStateStore::new(temp.path().to_path_buf()));
    let notifier = Arc::new(RecordingNotifier::default());

    let target = MonitorTarget::new(
        url,
        Some(sitewatch_core::SelectorRule::ById("gone".to_string())),
        ExtractMode::SubtreeText,
    )
    .unwrap();

    let orchestrator = Orchestrator::new(fetcher, store, notifier, settings());
    let reports = orchestrator.run_cycle(&[target]).await;

    assert!(reports[0].degraded);
    assert_eq!(reports[0].state, TargetState::Persisted);
}
