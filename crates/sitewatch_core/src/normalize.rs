//! Whitespace normalization.
//!
//! Two strengths are used by the pipeline:
//!
//! - [`collapse_whitespace`] folds every whitespace run (newlines included)
//!   into one space. Equality under this form is what separates a trivial
//!   change from a substantive one.
//! - [`canonical_lines`] trims line edges and drops blank lines but keeps
//!   the line structure and intra-line spacing, so stored snapshots still
//!   diff line by line and formatting drift stays detectable.
//!
//! Both are idempotent.

/// Collapse any run of whitespace characters to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Split text into edge-trimmed, non-blank lines.
pub fn canonical_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Normalize link labels: collapse whitespace per entry, drop empties,
/// sort lexicographically and deduplicate identical labels.
///
/// Sorting makes snapshot comparison insensitive to link reordering on
/// the page.
pub fn normalize_labels<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries: Vec<String> = labels
        .into_iter()
        .map(|label| collapse_whitespace(label.as_ref()))
        .filter(|label| !label.is_empty())
        .collect();
    entries.sort();
    entries.dedup();
    entries
}
