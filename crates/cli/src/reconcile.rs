//! `revdiff reconcile`: accept or reject hunks and build a candidate revision.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use semver::Version;

use revdiff_core::errors::ReconcileError;
use revdiff_core::models::CandidateRevision;
use revdiff_core::reconcile::{Decision, ReviewSession};
use revdiff_core::store::InMemoryVersionStore;
use revdiff_core::VersionService;

use crate::style;

/// Options collected from the command line.
pub struct ReconcileArgs {
    pub from: String,
    pub to: String,
    pub accept: Vec<String>,
    pub reject: Vec<String>,
    pub json: bool,
    pub save: bool,
    pub version: Option<String>,
    pub author: Option<String>,
}

pub async fn run_reconcile(
    service: &VersionService<InMemoryVersionStore>,
    revisions_dir: &Path,
    args: ReconcileArgs,
) -> Result<()> {
    let mut session = service
        .review(&args.from, &args.to)
        .await
        .with_context(|| format!("failed to compare {} with {}", args.from, args.to))?;

    if let Some(conflict) = contradictory_flags(&session, &args) {
        return Err(anyhow::Error::new(conflict).context("a hunk cannot be both accepted and rejected"));
    }

    for id in &args.accept {
        session
            .accept(id)
            .with_context(|| format!("cannot accept hunk '{}'", id))?;
    }
    for id in &args.reject {
        session
            .reject(id)
            .with_context(|| format!("cannot reject hunk '{}'", id))?;
    }

    let default = service.engine().default_decision();
    if !args.json {
        print_decisions(&session, default);
    }

    let mut candidate = service
        .finish_review(&mut session)
        .await
        .context("reconciliation failed")?;

    if let Some(v) = &args.version {
        let version = Version::parse(v).with_context(|| format!("invalid version '{}'", v))?;
        candidate = candidate.with_version(version);
    }
    if let Some(author) = &args.author {
        candidate = candidate.with_author(author.clone());
    }

    if !args.save {
        if args.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&candidate).context("failed to serialize candidate")?
            );
        } else {
            print_candidate(&candidate);
        }
        return Ok(());
    }

    let saved = service
        .persist_candidate(candidate)
        .await
        .context("failed to save candidate revision")?;

    let path = revisions_dir.join(format!("{}.json", saved.id));
    let body = serde_json::to_string_pretty(&*saved).context("failed to serialize revision")?;
    std::fs::write(&path, body)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&*saved)?);
    } else {
        println!(
            "{}",
            style::success(&format!(
                "Saved revision {} (version {}, parent {})",
                saved.id,
                saved.version,
                saved.parent_id.as_deref().unwrap_or("—")
            ))
        );
        println!("  {}", style::dim(&path.display().to_string()));
    }
    Ok(())
}

/// Known hunks named by both `--accept` and `--reject`, grouped under the
/// section of the first one. Unknown ids are left for the session to report.
fn contradictory_flags(session: &ReviewSession, args: &ReconcileArgs) -> Option<ReconcileError> {
    let comparison = session.comparison();
    let mut both: Vec<_> = args
        .accept
        .iter()
        .filter(|id| args.reject.contains(id))
        .filter_map(|id| comparison.hunk(id))
        .collect();
    both.sort_by(|a, b| a.hunk.id.cmp(&b.hunk.id));
    both.dedup_by(|a, b| a.hunk.id == b.hunk.id);

    let section = both.first()?.hunk.section;
    Some(ReconcileError::OverlappingDecisionConflict {
        section: section.to_string(),
        hunk_ids: both
            .iter()
            .filter(|h| h.hunk.section == section)
            .map(|h| h.hunk.id.clone())
            .collect(),
    })
}

fn print_decisions(session: &ReviewSession, default: Decision) {
    let comparison = session.comparison();
    println!();
    println!(
        "{}",
        style::header(&format!(
            "Reconciling {} -> {}",
            comparison.from_revision_id, comparison.to_revision_id
        ))
    );
    println!();

    if comparison.is_empty() {
        println!("{}", style::success("No changes to reconcile"));
        println!();
        return;
    }

    let decided = session.decisions();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Hunk", "Change", "Severity", "Decision"]);

    for h in &comparison.hunks {
        let decision = decided
            .iter()
            .find(|d| d.hunk_id == h.hunk.id)
            .map(|d| style::decision(d.decision))
            .unwrap_or_else(|| format!("{} {}", style::decision(default), style::dim("(default)")));
        table.add_row(vec![
            Cell::new(&h.hunk.id),
            Cell::new(style::change(h.hunk.change_type)),
            Cell::new(style::severity(h.severity)),
            Cell::new(decision),
        ]);
    }

    println!("{}", table);
    println!();
}

fn print_candidate(candidate: &CandidateRevision) {
    println!("{}", style::header("Candidate revision"));
    println!("  Parent  : {}", candidate.parent_id);
    println!(
        "  Version : {}",
        candidate
            .version
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "(assigned on save)".to_string())
    );
    for (section, text) in &candidate.sections {
        println!();
        println!("{}", style::dim(&format!("── {} ──", section)));
        println!("{}", text);
    }
    println!();
    println!("{}", style::dim("Not saved. Re-run with --save to persist."));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use revdiff_core::config::AppConfig;
    use revdiff_core::models::{Revision, SectionKind};

    fn service() -> VersionService<InMemoryVersionStore> {
        let store = InMemoryVersionStore::new();
        store
            .insert(
                Revision::new("r1", Version::new(1, 0, 0), "alice")
                    .with_section(SectionKind::Logic, "let a = 1;\nlet b = 2;"),
            )
            .unwrap();
        store
            .insert(
                Revision::new("r2", Version::new(1, 1, 0), "alice")
                    .with_parent("r1")
                    .with_section(SectionKind::Logic, "let a = 10;\nlet b = 2;")
                    .with_section(SectionKind::Styles, ".x {}"),
            )
            .unwrap();
        VersionService::new(Arc::new(store), &AppConfig::default()).unwrap()
    }

    fn args(accept: &[&str], reject: &[&str]) -> ReconcileArgs {
        ReconcileArgs {
            from: "r1".into(),
            to: "r2".into(),
            accept: accept.iter().map(|s| s.to_string()).collect(),
            reject: reject.iter().map(|s| s.to_string()).collect(),
            json: true,
            save: true,
            version: None,
            author: None,
        }
    }

    #[tokio::test]
    async fn test_accept_and_reject_of_same_hunk_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_reconcile(
            &service(),
            dir.path(),
            args(&["logic-0", "styles-0"], &["logic-0"]),
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.root_cause().downcast_ref::<ReconcileError>(),
            Some(&ReconcileError::OverlappingDecisionConflict {
                section: "logic".into(),
                hunk_ids: vec!["logic-0".into()],
            })
        );
        // Nothing was saved.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_hunk_in_both_lists_is_reported_as_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_reconcile(&service(), dir.path(), args(&["logic-9"], &["logic-9"]))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("logic-9"));
        assert!(format!("{:#}", err).contains("cannot accept"));
    }

    #[tokio::test]
    async fn test_disjoint_flags_save_candidate() {
        let dir = tempfile::tempdir().unwrap();
        run_reconcile(&service(), dir.path(), args(&["styles-0"], &["logic-0"]))
            .await
            .unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
