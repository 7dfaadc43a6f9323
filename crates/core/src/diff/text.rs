//! Line-level text differ.
//!
//! Computes a minimal line edit script with Myers' algorithm (via
//! `similar`) and turns it into hunks. The common prefix and suffix are
//! trimmed first, so matched lines at either end keep their line numbers.
//!
//! Inside one block the relative order of deletions and insertions is not
//! significant: a hunk only records how many old lines it replaces and which
//! new lines take their place. The middle is diffed in a canonical
//! orientation (lexicographically smaller side first), so `diff(b, a)` is
//! always the mirror image of `diff(a, b)`.

use similar::{capture_diff_slices, Algorithm, DiffTag};
use tracing::trace;

use super::hunk::{hunk_text, split_lines, ChangeType, DiffHunk, LineRange};
use super::DEFAULT_COALESCE_GAP;
use crate::models::SectionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Delete,
    Insert,
}

/// A maximal run of non-equal lines, 0-based on both sides.
#[derive(Debug, Clone, Copy)]
struct Block {
    old_start: usize,
    old_count: usize,
    new_start: usize,
    new_count: usize,
}

impl Block {
    fn old_end(&self) -> usize {
        self.old_start + self.old_count
    }

    fn new_end(&self) -> usize {
        self.new_start + self.new_count
    }
}

/// Stateless line differ with a configurable coalescing distance.
#[derive(Debug, Clone, Copy)]
pub struct TextDiffer {
    coalesce_gap: usize,
}

impl Default for TextDiffer {
    fn default() -> Self {
        Self::new(DEFAULT_COALESCE_GAP)
    }
}

impl TextDiffer {
    /// Create a differ that merges a removal and an addition separated by at
    /// most `coalesce_gap` unchanged lines into one `modified` hunk.
    pub fn new(coalesce_gap: usize) -> Self {
        Self { coalesce_gap }
    }

    pub fn coalesce_gap(&self) -> usize {
        self.coalesce_gap
    }

    /// Diff two texts belonging to `section`.
    pub fn diff(&self, section: SectionKind, old: &str, new: &str) -> Vec<DiffHunk> {
        if old == new {
            return Vec::new();
        }

        let old_lines = split_lines(old);
        let new_lines = split_lines(new);
        let ops = edit_script(&old_lines, &new_lines);
        let blocks = self.coalesce(collect_blocks(&ops));

        trace!(%section, blocks = blocks.len(), "diffed section");

        blocks
            .iter()
            .enumerate()
            .map(|(ordinal, block)| to_hunk(section, ordinal, block, &old_lines, &new_lines))
            .collect()
    }

    /// Merge neighbouring blocks when the gap between them is small enough
    /// and the merged block pairs removed lines with added lines.
    fn coalesce(&self, blocks: Vec<Block>) -> Vec<Block> {
        if self.coalesce_gap == 0 {
            return blocks;
        }
        let mut merged: Vec<Block> = Vec::with_capacity(blocks.len());
        for block in blocks {
            if let Some(prev) = merged.last_mut() {
                let gap = block.old_start - prev.old_end();
                let pairs = (prev.old_count > 0 || block.old_count > 0)
                    && (prev.new_count > 0 || block.new_count > 0);
                if gap <= self.coalesce_gap && pairs {
                    prev.old_count = block.old_end() - prev.old_start;
                    prev.new_count = block.new_end() - prev.new_start;
                    continue;
                }
            }
            merged.push(block);
        }
        merged
    }
}

/// Minimal edit script turning `a` into `b`.
fn edit_script(a: &[&str], b: &[&str]) -> Vec<Op> {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let max_suffix = a.len().min(b.len()) - prefix;
    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take(max_suffix)
        .take_while(|(x, y)| x == y)
        .count();

    let mid_a = &a[prefix..a.len() - suffix];
    let mid_b = &b[prefix..b.len() - suffix];

    let mut ops = Vec::with_capacity(a.len() + b.len());
    ops.extend(std::iter::repeat(Op::Equal).take(prefix));
    if mid_a <= mid_b {
        myers_script(mid_a, mid_b, &mut ops);
    } else {
        let start = ops.len();
        myers_script(mid_b, mid_a, &mut ops);
        for op in &mut ops[start..] {
            *op = match *op {
                Op::Delete => Op::Insert,
                Op::Insert => Op::Delete,
                Op::Equal => Op::Equal,
            };
        }
    }
    ops.extend(std::iter::repeat(Op::Equal).take(suffix));
    ops
}

/// Myers edit script over the differing middle.
fn myers_script(a: &[&str], b: &[&str], ops: &mut Vec<Op>) {
    for op in capture_diff_slices(Algorithm::Myers, a, b) {
        let (tag, old, new) = op.as_tag_tuple();
        let (deleted, inserted, equal) = match tag {
            DiffTag::Equal => (0, 0, old.len()),
            DiffTag::Delete => (old.len(), 0, 0),
            DiffTag::Insert => (0, new.len(), 0),
            DiffTag::Replace => (old.len(), new.len(), 0),
        };
        ops.extend(std::iter::repeat(Op::Equal).take(equal));
        ops.extend(std::iter::repeat(Op::Delete).take(deleted));
        ops.extend(std::iter::repeat(Op::Insert).take(inserted));
    }
}

/// Group consecutive non-equal ops into blocks.
fn collect_blocks(ops: &[Op]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current: Option<Block> = None;
    let (mut old_pos, mut new_pos) = (0, 0);

    for op in ops {
        match op {
            Op::Equal => {
                if let Some(block) = current.take() {
                    blocks.push(block);
                }
                old_pos += 1;
                new_pos += 1;
            }
            Op::Delete | Op::Insert => {
                let block = current.get_or_insert(Block {
                    old_start: old_pos,
                    old_count: 0,
                    new_start: new_pos,
                    new_count: 0,
                });
                if *op == Op::Delete {
                    block.old_count += 1;
                    old_pos += 1;
                } else {
                    block.new_count += 1;
                    new_pos += 1;
                }
            }
        }
    }
    if let Some(block) = current {
        blocks.push(block);
    }
    blocks
}

fn to_hunk(
    section: SectionKind,
    ordinal: usize,
    block: &Block,
    old_lines: &[&str],
    new_lines: &[&str],
) -> DiffHunk {
    let change_type = match (block.old_count, block.new_count) {
        (0, _) => ChangeType::Added,
        (_, 0) => ChangeType::Removed,
        _ => ChangeType::Modified,
    };
    let range = |start: usize, count: usize| {
        (count > 0).then_some(LineRange {
            start: start + 1,
            count,
        })
    };

    DiffHunk {
        id: format!("{section}-{ordinal}"),
        section,
        change_type,
        old_range: range(block.old_start, block.old_count),
        new_range: range(block.new_start, block.new_count),
        old_text: hunk_text(&old_lines[block.old_start..block.old_end()]),
        new_text: hunk_text(&new_lines[block.new_start..block.new_end()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::hunk::apply_hunks;

    fn diff(old: &str, new: &str) -> Vec<DiffHunk> {
        TextDiffer::default().diff(SectionKind::Logic, old, new)
    }

    fn count(hunks: &[DiffHunk], ty: ChangeType) -> usize {
        hunks.iter().filter(|h| h.change_type == ty).count()
    }

    const SAMPLES: &[&str] = &[
        "",
        "a",
        "a\n",
        "\n\n",
        "a\nb\nc",
        "a\nx\nc\n",
        "c\nb\na",
        "a\nb\nc\nd\ne\nf",
        "a\nc\ne\ng\nb",
        "x\na\nb\ny\nc\nd\nz",
        "function foo(){}\nfunction bar(){}",
    ];

    #[test]
    fn test_identical_texts_yield_no_hunks() {
        for text in SAMPLES {
            assert!(diff(text, text).is_empty(), "diff({text:?}, itself)");
        }
    }

    #[test]
    fn test_empty_old_is_all_additions() {
        let hunks = diff("", "a\nb");
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].change_type, ChangeType::Added);
        assert_eq!(hunks[0].old_range, None);
        assert_eq!(hunks[0].new_range, Some(LineRange { start: 1, count: 2 }));
        assert_eq!(hunks[0].new_text, "a\nb\n");
        assert!(hunks[0].old_text.is_empty());
    }

    #[test]
    fn test_empty_new_is_all_deletions() {
        let hunks = diff("a\nb", "");
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].change_type, ChangeType::Removed);
        assert_eq!(hunks[0].new_range, None);
        assert_eq!(hunks[0].old_range, Some(LineRange { start: 1, count: 2 }));
        assert!(hunks[0].new_text.is_empty());
    }

    #[test]
    fn test_replacement_coalesces_into_modified() {
        let hunks = diff("a\nb\nc", "a\nB\nc");
        assert_eq!(hunks.len(), 1);
        let h = &hunks[0];
        assert_eq!(h.change_type, ChangeType::Modified);
        assert_eq!(h.old_range, Some(LineRange { start: 2, count: 1 }));
        assert_eq!(h.new_range, Some(LineRange { start: 2, count: 1 }));
        assert_eq!(h.old_text, "b\n");
        assert_eq!(h.new_text, "B\n");
    }

    #[test]
    fn test_appended_line_is_an_addition_after_context() {
        let hunks = diff("function foo(){}", "function foo(){}\nfunction bar(){}");
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].change_type, ChangeType::Added);
        assert_eq!(hunks[0].new_range, Some(LineRange { start: 2, count: 1 }));
        assert_eq!(hunks[0].new_text, "function bar(){}\n");
    }

    #[test]
    fn test_blank_line_removal_has_visible_text() {
        let hunks = diff("a\n\nb", "a\nb");
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].change_type, ChangeType::Removed);
        assert_eq!(hunks[0].old_text, "\n");
    }

    #[test]
    fn test_hunk_text_invariants() {
        for a in SAMPLES {
            for b in SAMPLES {
                for h in diff(a, b) {
                    match h.change_type {
                        ChangeType::Added => {
                            assert!(h.old_text.is_empty() && !h.new_text.is_empty())
                        }
                        ChangeType::Removed => {
                            assert!(!h.old_text.is_empty() && h.new_text.is_empty())
                        }
                        ChangeType::Modified => {
                            assert!(!h.old_text.is_empty() && !h.new_text.is_empty())
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_round_trip_reconstructs_new_text() {
        for a in SAMPLES {
            for b in SAMPLES {
                let hunks = diff(a, b);
                assert_eq!(apply_hunks(a, &hunks).unwrap(), *b, "apply(diff({a:?}, {b:?}))");
            }
        }
    }

    #[test]
    fn test_round_trip_with_coalescing() {
        let differ = TextDiffer::new(2);
        for a in SAMPLES {
            for b in SAMPLES {
                let hunks = differ.diff(SectionKind::Markup, a, b);
                assert_eq!(apply_hunks(a, &hunks).unwrap(), *b);
            }
        }
    }

    #[test]
    fn test_count_symmetry() {
        for a in SAMPLES {
            for b in SAMPLES {
                let forward = diff(a, b);
                let backward = diff(b, a);
                assert_eq!(
                    count(&forward, ChangeType::Added),
                    count(&backward, ChangeType::Removed)
                );
                assert_eq!(
                    count(&forward, ChangeType::Removed),
                    count(&backward, ChangeType::Added)
                );
                assert_eq!(
                    count(&forward, ChangeType::Modified),
                    count(&backward, ChangeType::Modified)
                );
            }
        }
    }

    #[test]
    fn test_gap_coalescing_pairs_removal_with_addition() {
        let old = "a\nold\nkeep\nz";
        let new = "a\nkeep\nnew\nz";

        let strict = TextDiffer::new(0).diff(SectionKind::Logic, old, new);
        assert_eq!(strict.len(), 2);
        assert_eq!(strict[0].change_type, ChangeType::Removed);
        assert_eq!(strict[1].change_type, ChangeType::Added);

        let loose = TextDiffer::new(1).diff(SectionKind::Logic, old, new);
        assert_eq!(loose.len(), 1);
        assert_eq!(loose[0].change_type, ChangeType::Modified);
        assert_eq!(loose[0].old_text, "old\nkeep\n");
        assert_eq!(loose[0].new_text, "keep\nnew\n");
    }

    #[test]
    fn test_gap_coalescing_leaves_pure_removals_apart() {
        let hunks = TextDiffer::new(3).diff(SectionKind::Logic, "a\nb\nc\nd", "b\nd");
        assert_eq!(hunks.len(), 2);
        assert!(hunks.iter().all(|h| h.change_type == ChangeType::Removed));
    }

    #[test]
    fn test_hunk_ids_are_ordinal_per_section() {
        let hunks = TextDiffer::default().diff(SectionKind::Styles, "a\nb\nc\nd", "A\nb\nc\nD");
        let ids: Vec<_> = hunks.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["styles-0", "styles-1"]);
    }

    #[test]
    fn test_matching_lines_keep_their_position() {
        // The shared leading "x" is trimmed as common prefix, so the duplicate
        // is reported as inserted after it.
        let hunks = diff("x\ny", "x\nx\ny");
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].change_type, ChangeType::Added);
        assert_eq!(hunks[0].new_range, Some(LineRange { start: 2, count: 1 }));
    }

    #[test]
    fn test_large_texts_with_edits_at_both_ends() {
        // Edits at the first and last line leave no common prefix or suffix,
        // so the whole text goes through the edit script.
        let body: Vec<String> = (0..20_000).map(|i| format!("line {i}")).collect();
        let old = format!("head\n{}\ntail", body.join("\n"));
        let new = format!("HEAD\n{}\nTAIL", body.join("\n"));

        let hunks = TextDiffer::new(0).diff(SectionKind::Logic, &old, &new);
        assert_eq!(hunks.len(), 2);
        assert!(hunks.iter().all(|h| h.change_type == ChangeType::Modified));
        assert_eq!(hunks[1].old_range, Some(LineRange { start: 20_002, count: 1 }));
        assert_eq!(apply_hunks(&old, &hunks).unwrap(), new);
    }

    #[test]
    fn test_disjoint_texts_form_one_modified_block() {
        let old: Vec<String> = (0..2_000).map(|i| format!("old {i}")).collect();
        let new: Vec<String> = (0..1_500).map(|i| format!("new {i}")).collect();
        let (old, new) = (old.join("\n"), new.join("\n"));

        let hunks = diff(&old, &new);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].change_type, ChangeType::Modified);
        assert_eq!(hunks[0].old_range, Some(LineRange { start: 1, count: 2_000 }));
        assert_eq!(hunks[0].new_range, Some(LineRange { start: 1, count: 1_500 }));
        assert_eq!(apply_hunks(&old, &hunks).unwrap(), new);
    }

    #[test]
    fn test_deterministic_output() {
        let a = "a\nb\nc\nd\ne\nf";
        let b = "a\nc\ne\ng\nb";
        assert_eq!(diff(a, b), diff(a, b));
    }
}
