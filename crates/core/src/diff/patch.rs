//! Unified patch export.
//!
//! Uses the `diffy` crate to render each changed section of a revision pair
//! as a standard unified diff, for handing a comparison to external tools.

use tracing::debug;

use crate::models::Revision;
use crate::sections::SectionExtractor;

/// Render every section that differs between `from` and `to` as a unified
/// patch. Sections are emitted in reporting order; unchanged sections are
/// skipped, so identical revisions yield an empty string.
pub fn render_unified_patch(from: &Revision, to: &Revision) -> String {
    let old_sections = SectionExtractor::extract(from);
    let new_sections = SectionExtractor::extract(to);

    let mut out = String::new();
    for section in SectionExtractor::union_keys(&old_sections, &new_sections) {
        let old = old_sections.get(&section).copied().unwrap_or("");
        let new = new_sections.get(&section).copied().unwrap_or("");
        if old == new {
            continue;
        }

        let patch = diffy::create_patch(old, new);
        out.push_str(&format!(
            "diff {section} {}@{} {}@{}\n",
            from.id, from.version, to.id, to.version
        ));
        out.push_str(&patch.to_string());
    }

    debug!(from = %from.id, to = %to.id, bytes = out.len(), "rendered unified patch");
    out
}
