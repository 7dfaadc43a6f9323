//! Hunk types and hunk application.
//!
//! A [`DiffHunk`] stores the lines it covers as text where every line is
//! terminated by `\n`, so a hunk that touches a single blank line still has
//! non-empty text on that side.

use serde::{Deserialize, Serialize};

use crate::models::SectionKind;

/// Kind of change a hunk represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

/// A 1-based line range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub count: usize,
}

/// One contiguous change unit inside one section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiffHunk {
    /// Stable identifier, `<section>-<ordinal>`.
    pub id: String,
    pub section: SectionKind,
    pub change_type: ChangeType,
    /// Covered lines in the old text; `None` for pure additions.
    pub old_range: Option<LineRange>,
    /// Covered lines in the new text; `None` for pure removals.
    pub new_range: Option<LineRange>,
    pub old_text: String,
    pub new_text: String,
}

impl DiffHunk {
    pub fn old_count(&self) -> usize {
        self.old_range.map(|r| r.count).unwrap_or(0)
    }

    pub fn new_count(&self) -> usize {
        self.new_range.map(|r| r.count).unwrap_or(0)
    }

    /// Number of lines the hunk spans on its larger side.
    pub fn span_lines(&self) -> usize {
        self.old_count().max(self.new_count())
    }

    /// Lines removed by this hunk, without terminators.
    pub fn old_lines(&self) -> Vec<&str> {
        hunk_lines(&self.old_text)
    }

    /// Lines introduced by this hunk, without terminators.
    pub fn new_lines(&self) -> Vec<&str> {
        hunk_lines(&self.new_text)
    }
}

/// Split a text blob into lines. The empty text has no lines; any other text
/// is split on `\n`, so joining the result with `\n` reproduces it exactly.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').collect()
    }
}

/// Inverse of [`split_lines`].
pub fn join_lines(lines: &[&str]) -> String {
    lines.join("\n")
}

/// Render lines as hunk text (every line terminated by `\n`).
pub(crate) fn hunk_text(lines: &[&str]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Inverse of [`hunk_text`].
pub(crate) fn hunk_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.strip_suffix('\n').unwrap_or(text).split('\n').collect()
}

/// Resolved 0-based position of a hunk on both sides of a diff.
///
/// Pure additions have no old range and pure removals have no new range;
/// their insertion point is recovered from the running line offset of the
/// preceding hunks in the same section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkSpan {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
}

impl HunkSpan {
    pub fn old_end(&self) -> usize {
        self.old_start.saturating_add(self.old_count)
    }

    pub fn new_end(&self) -> usize {
        self.new_start.saturating_add(self.new_count)
    }
}

/// A hunk whose line ranges cannot name a position in any text, such as a
/// zero start line or a count that runs past the addressable range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRange {
    pub hunk_id: String,
    pub section: SectionKind,
}

/// Resolve spans for the hunks of a single section, in order.
pub fn resolve_spans<'a, I>(hunks: I) -> Result<Vec<HunkSpan>, InvalidRange>
where
    I: IntoIterator<Item = &'a DiffHunk>,
{
    let mut delta: isize = 0;
    let mut spans = Vec::new();
    for hunk in hunks {
        let span = resolve_span(hunk, delta).ok_or_else(|| InvalidRange {
            hunk_id: hunk.id.clone(),
            section: hunk.section,
        })?;
        delta = isize::try_from(span.new_count)
            .ok()
            .zip(isize::try_from(span.old_count).ok())
            .and_then(|(new, old)| delta.checked_add(new)?.checked_sub(old))
            .ok_or_else(|| InvalidRange {
                hunk_id: hunk.id.clone(),
                section: hunk.section,
            })?;
        spans.push(span);
    }
    Ok(spans)
}

fn resolve_span(hunk: &DiffHunk, delta: isize) -> Option<HunkSpan> {
    let old_count = hunk.old_count();
    let new_count = hunk.new_count();
    let (old_start, new_start) = match (hunk.old_range, hunk.new_range) {
        (Some(o), Some(n)) => (o.start.checked_sub(1)?, n.start.checked_sub(1)?),
        (Some(o), None) => {
            let old_start = o.start.checked_sub(1)?;
            (old_start, offset(old_start, delta)?)
        }
        (None, Some(n)) => {
            let new_start = n.start.checked_sub(1)?;
            (offset(new_start, delta.checked_neg()?)?, new_start)
        }
        (None, None) => (0, offset(0, delta)?),
    };
    old_start.checked_add(old_count)?;
    new_start.checked_add(new_count)?;
    Some(HunkSpan {
        old_start,
        old_count,
        new_start,
        new_count,
    })
}

fn offset(pos: usize, delta: isize) -> Option<usize> {
    let shifted = isize::try_from(pos).ok()?.checked_add(delta)?;
    Some(shifted.max(0) as usize)
}

/// Apply the hunks of one section to `old`, producing the new text.
///
/// Hunks must be in diff order and come from a diff of `old`.
pub fn apply_hunks(old: &str, hunks: &[DiffHunk]) -> Result<String, InvalidRange> {
    let old_lines = split_lines(old);
    let spans = resolve_spans(hunks)?;

    let mut out: Vec<&str> = Vec::with_capacity(old_lines.len());
    let mut cursor = 0;
    for (hunk, span) in hunks.iter().zip(&spans) {
        let start = span.old_start.min(old_lines.len());
        if cursor < start {
            out.extend_from_slice(&old_lines[cursor..start]);
        }
        out.extend(hunk.new_lines());
        cursor = span.old_end().max(cursor);
    }
    if cursor < old_lines.len() {
        out.extend_from_slice(&old_lines[cursor..]);
    }
    Ok(join_lines(&out))
}
