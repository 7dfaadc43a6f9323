//! Section extraction.
//!
//! Splits a revision into its named sections so that diffs are computed per
//! section. Section names come from the closed [`SectionKind`] set, so the
//! extractor and every consumer agree on the key space.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Revision, SectionKind};

/// Stateless section extractor.
pub struct SectionExtractor;

impl SectionExtractor {
    /// Return every section the revision declares, including empty ones.
    ///
    /// The map borrows from the revision; sections the revision does not
    /// declare are simply absent and read as empty text.
    pub fn extract(revision: &Revision) -> BTreeMap<SectionKind, &str> {
        revision
            .sections
            .iter()
            .map(|(kind, text)| (*kind, text.as_str()))
            .collect()
    }

    /// Text of `kind` in an extracted map, empty when absent.
    pub fn text<'a>(sections: &BTreeMap<SectionKind, &'a str>, kind: SectionKind) -> &'a str {
        sections.get(&kind).copied().unwrap_or("")
    }

    /// Union of the section keys of two extracted maps, in reporting order.
    pub fn union_keys(
        a: &BTreeMap<SectionKind, &str>,
        b: &BTreeMap<SectionKind, &str>,
    ) -> Vec<SectionKind> {
        a.keys()
            .chain(b.keys())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
