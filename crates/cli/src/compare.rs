//! `revdiff compare`: show the classified changes between two revisions.

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use revdiff_core::comparison::VersionComparison;
use revdiff_core::diff::{render_unified_patch, LineRange};
use revdiff_core::store::{InMemoryVersionStore, VersionStore};
use revdiff_core::VersionService;

use crate::style;

pub async fn run_compare(
    service: &VersionService<InMemoryVersionStore>,
    from: &str,
    to: &str,
    json: bool,
    patch: bool,
) -> Result<()> {
    let comparison = service
        .compare_versions(from, to)
        .await
        .with_context(|| format!("failed to compare {} with {}", from, to))?;

    if json {
        println!("{}", comparison.to_json().context("failed to serialize comparison")?);
    } else {
        print_comparison(&comparison);
    }

    if patch {
        let store = service.store();
        let from_rev = store.get_revision(from).await?;
        let to_rev = store.get_revision(to).await?;
        print!("{}", render_unified_patch(&from_rev, &to_rev));
    }

    Ok(())
}

/// Human-readable summary plus one table row per hunk.
pub fn print_comparison(comparison: &VersionComparison) {
    let s = &comparison.summary;

    println!();
    println!(
        "{}",
        style::header(&format!(
            "{} -> {}",
            comparison.from_revision_id, comparison.to_revision_id
        ))
    );
    println!("  {}", style::dim(&comparison.id));
    println!();

    if comparison.is_empty() {
        println!("{}", style::success("No changes"));
        println!();
        return;
    }

    println!(
        "  Changes : {} ({} added, {} removed, {} modified) in {} section(s)",
        s.total_changes, s.additions_count, s.deletions_count, s.modifications_count, s.files_changed
    );
    println!("  Impact  : {}", style::severity(s.impact_level));
    if s.breaking_changes {
        println!("  {}", style::warn("Contains breaking changes"));
    }
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Hunk", "Change", "Old", "New", "Severity", ""]);

    for h in &comparison.hunks {
        let mut note = style::breaking(h.breaking);
        if !h.removed_symbols.is_empty() {
            note = format!("{} {}", note, h.removed_symbols.join(", "));
        }
        table.add_row(vec![
            Cell::new(&h.hunk.id),
            Cell::new(style::change(h.hunk.change_type)),
            Cell::new(range(h.hunk.old_range)),
            Cell::new(range(h.hunk.new_range)),
            Cell::new(style::severity(h.severity)),
            Cell::new(note),
        ]);
    }

    println!("{}", table);
    println!();
}

fn range(r: Option<LineRange>) -> String {
    match r {
        Some(r) if r.count == 1 => r.start.to_string(),
        Some(r) => format!("{}-{}", r.start, r.start + r.count - 1),
        None => "—".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_formatting() {
        assert_eq!(range(None), "—");
        assert_eq!(range(Some(LineRange { start: 3, count: 1 })), "3");
        assert_eq!(range(Some(LineRange { start: 3, count: 4 })), "3-6");
    }
}
