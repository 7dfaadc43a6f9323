//! Line-based text diffing.
//!
//! The diff subsystem is responsible for:
//! 1. **Diffing** -- computing a minimal line edit script between two texts.
//! 2. **Hunking** -- grouping the script into added / removed / modified hunks.
//! 3. **Applying** -- replaying hunks onto the old text (the lossless inverse).
//! 4. **Exporting** -- rendering revision pairs as unified patches.

pub mod hunk;
pub mod patch;
pub mod text;

pub use hunk::{apply_hunks, split_lines, ChangeType, DiffHunk, HunkSpan, InvalidRange, LineRange};
pub use patch::render_unified_patch;
pub use text::TextDiffer;

/// Default number of unchanged lines allowed between a removal and an
/// addition for them to be coalesced into one `modified` hunk.
pub const DEFAULT_COALESCE_GAP: usize = 0;
