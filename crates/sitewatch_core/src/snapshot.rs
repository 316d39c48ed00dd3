use crate::normalize::{canonical_lines, collapse_whitespace, normalize_labels};
use crate::target::ExtractMode;

/// Canonical representation of a target's relevant content at one point
/// in time.
///
/// Text modes keep the document's line structure (edge-trimmed, blank
/// lines dropped); link-list mode holds normalized, deduplicated labels
/// in lexicographic order. A snapshot has no timestamp of its own; its
/// currency is implied by its position in the state store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSnapshot {
    Text(Vec<String>),
    Links(Vec<String>),
}

impl ContentSnapshot {
    /// Build a text snapshot from raw extracted text.
    pub fn from_text(raw: &str) -> Self {
        ContentSnapshot::Text(canonical_lines(raw))
    }

    /// Build a link-list snapshot from raw link labels.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ContentSnapshot::Links(normalize_labels(labels))
    }

    /// Reconstruct a snapshot from its persisted plain-text form.
    ///
    /// The stored form is already canonical, so this goes through the same
    /// constructors; re-canonicalizing a canonical value is a no-op.
    pub fn from_plain(mode: ExtractMode, text: &str) -> Self {
        match mode {
            ExtractMode::FullText | ExtractMode::SubtreeText => Self::from_text(text),
            ExtractMode::LinkTextList => Self::from_labels(text.lines()),
        }
    }

    /// The snapshot rendered as an ordered line sequence, as consumed by
    /// the diff engine.
    pub fn lines(&self) -> &[String] {
        match self {
            ContentSnapshot::Text(lines) => lines,
            ContentSnapshot::Links(labels) => labels,
        }
    }

    /// Newline-joined persisted form.
    pub fn to_plain(&self) -> String {
        self.lines().join("\n")
    }

    /// Strong-normalized form: the whole snapshot folded onto one line.
    ///
    /// Two snapshots whose raw forms differ but whose strong forms are
    /// equal differ only by formatting noise.
    pub fn normalized_form(&self) -> String {
        collapse_whitespace(&self.lines().join(" "))
    }

    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }
}
