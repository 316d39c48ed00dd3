//! Change classification and report rendering.
//!
//! Decides whether the difference between the stored snapshot and the
//! freshly extracted one is worth reporting, and builds the bounded
//! human-readable message handed to the notification collaborator.

use crate::diff::DiffResult;
use crate::snapshot::ContentSnapshot;
use crate::target::{MonitorTarget, TargetKey};

/// Transport message cap (Telegram's limit); longer bodies are truncated
/// with a marker before handoff.
pub const MAX_MESSAGE_CHARS: usize = 4096;

const TRUNCATION_MARKER: &str = "\n[...]";

/// Outcome of comparing the previous and current snapshot of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No prior snapshot existed; monitoring begins now.
    FirstObservation,
    /// Snapshots are identical; nothing to report, nothing to write.
    Unchanged,
    /// Raw forms differ but the difference disappears under whitespace
    /// normalization: formatting noise.
    Trivial,
    /// A difference that survives normalization.
    Substantive,
}

impl Classification {
    /// Whether this outcome writes the new snapshot to the state store.
    /// Trivial changes persist too, so the same formatting drift is not
    /// re-flagged on every cycle.
    pub fn persists(self) -> bool {
        !matches!(self, Classification::Unchanged)
    }
}

/// Report shaping knobs.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    /// Maximum number of changed lines included in a substantive report.
    pub max_lines: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self { max_lines: 10 }
    }
}

/// A reportable change for one target. Consumed by the notifier; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub key: TargetKey,
    pub classification: Classification,
    pub message: String,
}

/// Pure classification decision, one row per path.
pub fn classify(previous: Option<&ContentSnapshot>, current: &ContentSnapshot) -> Classification {
    let previous = match previous {
        None => return Classification::FirstObservation,
        Some(prev) => prev,
    };
    if previous == current {
        Classification::Unchanged
    } else if previous.normalized_form() == current.normalized_form() {
        Classification::Trivial
    } else {
        Classification::Substantive
    }
}

/// Classify and, for reportable outcomes, build the notification event.
///
/// Returns `None` for [`Classification::Unchanged`]. A substantive diff
/// whose capped changed-line list comes out empty degrades to the trivial
/// short message rather than producing an empty report.
pub fn build_event(
    target: &MonitorTarget,
    previous: Option<&ContentSnapshot>,
    current: &ContentSnapshot,
    settings: &ReportSettings,
) -> Option<ChangeEvent> {
    let classification = classify(previous, current);
    let event = match classification {
        Classification::Unchanged => return None,
        Classification::FirstObservation => ChangeEvent {
            key: target.key(),
            classification,
            message: format!("Monitoring started for:\n{}", target.url()),
        },
        Classification::Trivial => trivial_event(target),
        Classification::Substantive => substantive_event(target, previous?, current, settings),
    };
    Some(ChangeEvent {
        message: truncate_message(event.message, MAX_MESSAGE_CHARS),
        ..event
    })
}

fn substantive_event(
    target: &MonitorTarget,
    previous: &ContentSnapshot,
    current: &ContentSnapshot,
    settings: &ReportSettings,
) -> ChangeEvent {
    let diff = DiffResult::compute(previous.lines(), current.lines());
    let changed: Vec<String> = diff
        .changed_lines()
        .take(settings.max_lines)
        .map(|line| line.to_string())
        .collect();
    if changed.is_empty() {
        // Difference registered but nothing survived filtering; an empty
        // fenced block would be worse than a short note.
        return trivial_event(target);
    }
    ChangeEvent {
        key: target.key(),
        classification: Classification::Substantive,
        message: format!(
            "Website updated\n\nChanges detected on:\n{url}\n\nChanges:\n```\n{block}\n```",
            url = target.url(),
            block = changed.join("\n"),
        ),
    }
}

fn trivial_event(target: &MonitorTarget) -> ChangeEvent {
    ChangeEvent {
        key: target.key(),
        classification: Classification::Trivial,
        message: format!(
            "Website updated\n\nA minor change (formatting only) was detected on:\n{}",
            target.url()
        ),
    }
}

/// Cap a message to `max_chars`, appending a truncation marker when cut.
fn truncate_message(message: String, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message;
    }
    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
