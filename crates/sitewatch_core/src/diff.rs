//! Line-level diff between two snapshots.
//!
//! Classic longest-common-subsequence alignment over line sequences.
//! Ties are broken leftmost-greedy (earlier lines align first, removals
//! are emitted before additions), matching textbook unified-diff output.

use std::fmt;

/// Role of a single line in the diff output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffTag {
    Added,
    Removed,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub tag: DiffTag,
    pub text: String,
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.tag {
            DiffTag::Added => '+',
            DiffTag::Removed => '-',
            DiffTag::Context => ' ',
        };
        write!(f, "{prefix}{}", self.text)
    }
}

/// Ordered edit script between two line sequences.
///
/// The two boundary markers naming the sides are kept apart from the
/// content lines; reporting consumes only added/removed content lines,
/// while the [`fmt::Display`] rendering leads with both markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    lines: Vec<DiffLine>,
}

impl DiffResult {
    pub const BEFORE_MARKER: &'static str = "--- Before";
    pub const AFTER_MARKER: &'static str = "+++ After";

    /// Compute the diff of `before` against `after`.
    pub fn compute(before: &[String], after: &[String]) -> Self {
        let table = lcs_table(before, after);
        let mut lines = Vec::new();
        let (mut i, mut j) = (0usize, 0usize);
        while i < before.len() && j < after.len() {
            if before[i] == after[j] {
                lines.push(DiffLine {
                    tag: DiffTag::Context,
                    text: before[i].clone(),
                });
                i += 1;
                j += 1;
            } else if table[i + 1][j] >= table[i][j + 1] {
                // Prefer consuming the earlier "before" line: removals
                // come first on a tie.
                lines.push(DiffLine {
                    tag: DiffTag::Removed,
                    text: before[i].clone(),
                });
                i += 1;
            } else {
                lines.push(DiffLine {
                    tag: DiffTag::Added,
                    text: after[j].clone(),
                });
                j += 1;
            }
        }
        for line in &before[i..] {
            lines.push(DiffLine {
                tag: DiffTag::Removed,
                text: line.clone(),
            });
        }
        for line in &after[j..] {
            lines.push(DiffLine {
                tag: DiffTag::Added,
                text: line.clone(),
            });
        }
        Self { lines }
    }

    /// All output lines in natural merge order, interleaved as encountered.
    pub fn lines(&self) -> &[DiffLine] {
        &self.lines
    }

    /// Only the added/removed content lines, in encounter order. The
    /// boundary markers are never part of this view.
    pub fn changed_lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.lines
            .iter()
            .filter(|line| line.tag != DiffTag::Context)
    }

    pub fn has_changes(&self) -> bool {
        self.changed_lines().next().is_some()
    }
}

/// Unified-diff-style rendering: boundary markers first, then every line
/// in merge order.
impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", Self::BEFORE_MARKER, Self::AFTER_MARKER)?;
        for line in &self.lines {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}

/// `table[i][j]` = length of the LCS of `before[i..]` and `after[j..]`.
fn lcs_table(before: &[String], after: &[String]) -> Vec<Vec<u32>> {
    let (n, m) = (before.len(), after.len());
    let mut table = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if before[i] == after[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }
    table
}
