//! Per-target pipeline driver.
//!
//! Each target walks `Pending -> Fetched -> Extracted -> Compared ->
//! {Notified, Skipped} -> {Persisted, NotPersisted}`. Every failure is
//! target-scoped: one broken target never blocks the rest of the cycle.

use std::sync::Arc;
use std::time::Duration;

use sitewatch_core::{build_event, Classification, MonitorTarget, ReportSettings};
use watch_logging::{watch_error, watch_info, watch_warn};

use crate::extract::extract_content;
use crate::fetch::Fetcher;
use crate::notify::Notifier;
use crate::store::StateStore;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Pause between consecutive targets. Politeness toward the remote
    /// origin, not a correctness requirement.
    pub pause_between_targets: Duration,
    pub report: ReportSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            pause_between_targets: Duration::from_secs(1),
            report: ReportSettings::default(),
        }
    }
}

/// States of the per-target pipeline; a report carries the last one
/// reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Pending,
    Fetched,
    Extracted,
    Compared,
    Notified,
    Skipped,
    Persisted,
    NotPersisted,
}

/// Outcome of one target within a cycle.
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub url: String,
    pub state: TargetState,
    pub classification: Option<Classification>,
    /// Extraction fell back to the whole page.
    pub degraded: bool,
    /// A notification was handed to the delivery collaborator.
    pub notified: bool,
    pub error: Option<String>,
}

impl TargetReport {
    fn pending(target: &MonitorTarget) -> Self {
        Self {
            url: target.url().to_string(),
            state: TargetState::Pending,
            classification: None,
            degraded: false,
            notified: false,
            error: None,
        }
    }
}

/// Drives fetch, extraction, comparison, notification and persistence
/// for a configured set of targets.
pub struct Orchestrator {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn StateStore>,
    notifier: Arc<dyn Notifier>,
    settings: PipelineSettings,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn StateStore>,
        notifier: Arc<dyn Notifier>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            store,
            notifier,
            settings,
        }
    }

    /// Run one detection cycle over all targets, in configured order.
    pub async fn run_cycle(&self, targets: &[MonitorTarget]) -> Vec<TargetReport> {
        let mut reports = Vec::with_capacity(targets.len());
        for (index, target) in targets.iter().enumerate() {
            if index > 0 && !self.settings.pause_between_targets.is_zero() {
                tokio::time::sleep(self.settings.pause_between_targets).await;
            }
            watch_info!("checking for updates at: {}", target.url());
            reports.push(self.run_target(target).await);
        }

        let reported = reports.iter().filter(|r| r.notified).count();
        let errored = reports.iter().filter(|r| r.error.is_some()).count();
        watch_info!(
            "cycle complete: {} targets, {} notified, {} errored",
            reports.len(),
            reported,
            errored
        );
        reports
    }

    async fn run_target(&self, target: &MonitorTarget) -> TargetReport {
        let mut report = TargetReport::pending(target);

        let page = match self.fetcher.fetch(target.url()).await {
            Ok(page) => page,
            Err(err) => {
                watch_warn!("fetch failed for {}: {}", target.url(), err);
                report.error = Some(err.to_string());
                report.state = TargetState::NotPersisted;
                return report;
            }
        };
        report.state = TargetState::Fetched;

        let extraction = extract_content(&page.html, target);
        if extraction.degraded {
            watch_warn!(
                "selector rule for {} did not match; checking whole page instead",
                target.url()
            );
            report.degraded = true;
        }
        report.state = TargetState::Extracted;

        let previous = match self.store.load(target) {
            Ok(previous) => previous,
            Err(err) => {
                // Treated as unchanged this cycle: no notification and no
                // write, so a transient storage failure cannot fire
                // repeated alerts.
                watch_error!("state load failed for {}: {}", target.url(), err);
                report.error = Some(err.to_string());
                report.state = TargetState::NotPersisted;
                return report;
            }
        };
        report.state = TargetState::Compared;

        let event = build_event(
            target,
            previous.as_ref(),
            &extraction.snapshot,
            &self.settings.report,
        );
        let event = match event {
            None => {
                watch_info!("no changes detected for {}", target.url());
                report.classification = Some(Classification::Unchanged);
                report.state = TargetState::Skipped;
                return report;
            }
            Some(event) => event,
        };
        report.classification = Some(event.classification);

        match self.notifier.notify(&event.message).await {
            Ok(()) => report.notified = true,
            // Best-effort: logged, not retried, does not block persistence.
            Err(err) => watch_warn!("notification failed for {}: {}", target.url(), err),
        }
        report.state = TargetState::Notified;

        match self.store.save(target, &extraction.snapshot) {
            Ok(()) => report.state = TargetState::Persisted,
            Err(err) => {
                watch_error!("state save failed for {}: {}", target.url(), err);
                report.error = Some(err.to_string());
                report.state = TargetState::NotPersisted;
            }
        }
        report
    }
}
