//! Sitewatch core: pure change-detection pipeline, no I/O.
mod classify;
mod diff;
mod normalize;
mod snapshot;
mod target;

pub use classify::{
    build_event, classify, ChangeEvent, Classification, ReportSettings, MAX_MESSAGE_CHARS,
};
pub use diff::{DiffLine, DiffResult, DiffTag};
pub use normalize::{canonical_lines, collapse_whitespace, normalize_labels};
pub use snapshot::ContentSnapshot;
pub use target::{ExtractMode, MonitorTarget, SelectorRule, TargetError, TargetKey};
