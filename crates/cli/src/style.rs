//! Shared styling utilities for the CLI.

use console::Style;

use revdiff_core::comparison::Severity;
use revdiff_core::diff::ChangeType;
use revdiff_core::reconcile::Decision;

/// Create a success-styled string (green with checkmark).
pub fn success(msg: &str) -> String {
    let style = Style::new().green();
    format!("{} {}", style.apply_to("✓"), msg)
}

/// Create a warning-styled string (yellow).
pub fn warn(msg: &str) -> String {
    let style = Style::new().yellow();
    format!("{} {}", style.apply_to("⚠"), msg)
}

/// Create a header-styled string (bold, white).
pub fn header(msg: &str) -> String {
    let style = Style::new().bold();
    style.apply_to(msg).to_string()
}

/// Create a dim-styled string.
pub fn dim(msg: &str) -> String {
    let style = Style::new().dim();
    style.apply_to(msg).to_string()
}

/// Severity label: high red, medium yellow, low dim.
pub fn severity(level: Severity) -> String {
    let style = match level {
        Severity::High => Style::new().red().bold(),
        Severity::Medium => Style::new().yellow(),
        Severity::Low => Style::new().dim(),
    };
    style.apply_to(level.to_string()).to_string()
}

/// Change type label (+ added, - removed, ~ modified).
pub fn change(kind: ChangeType) -> String {
    let (style, marker) = match kind {
        ChangeType::Added => (Style::new().green(), "+"),
        ChangeType::Removed => (Style::new().red(), "-"),
        ChangeType::Modified => (Style::new().cyan(), "~"),
    };
    style.apply_to(format!("{marker} {kind}")).to_string()
}

/// Decision label.
pub fn decision(decision: Decision) -> String {
    let style = match decision {
        Decision::Accept => Style::new().green(),
        Decision::Reject => Style::new().red(),
    };
    style.apply_to(decision.to_string()).to_string()
}

/// Breaking-change marker.
pub fn breaking(is_breaking: bool) -> String {
    if is_breaking {
        Style::new().red().bold().apply_to("BREAKING").to_string()
    } else {
        String::new()
    }
}
