//! Version store boundary.
//!
//! The core never owns revision storage; it reads immutable snapshots through
//! [`VersionStore`] and hands candidates back for persistence. Revisions are
//! append-only, which is what lets comparisons be cached without
//! invalidation.
//!
//! [`InMemoryVersionStore`] is the reference implementation used by the CLI
//! and the tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use semver::Version;
use tracing::{debug, info};

use crate::errors::StoreError;
use crate::models::{CandidateRevision, Revision};

/// Read/write access to stored revisions.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Fetch one revision snapshot.
    async fn get_revision(&self, id: &str) -> Result<Arc<Revision>, StoreError>;

    /// Persist a candidate, assigning its id, creation time and (when unset)
    /// its version.
    async fn save(&self, candidate: CandidateRevision) -> Result<Arc<Revision>, StoreError>;

    /// Every stored revision, ordered by version then id.
    async fn list_revisions(&self) -> Result<Vec<Arc<Revision>>, StoreError>;
}

/// Default version for a candidate saved without one: the parent's version
/// with the patch component bumped.
pub fn next_version(parent: &Version) -> Version {
    Version::new(parent.major, parent.minor, parent.patch + 1)
}

type RevisionMap = HashMap<String, Arc<Revision>>;

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryVersionStore {
    revisions: RwLock<RevisionMap>,
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RevisionMap> {
        self.revisions.read().unwrap_or_else(|poisoned| {
            tracing::warn!("version store lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, RevisionMap> {
        self.revisions.write().unwrap_or_else(|poisoned| {
            tracing::warn!("version store lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Insert a fully formed revision, keeping its id and timestamps.
    ///
    /// Parents must be inserted before their children.
    pub fn insert(&self, revision: Revision) -> Result<Arc<Revision>, StoreError> {
        let mut map = self.write();
        if map.contains_key(&revision.id) {
            return Err(StoreError::DuplicateRevision(revision.id));
        }
        if let Some(parent_id) = &revision.parent_id {
            if *parent_id == revision.id {
                return Err(StoreError::LineageCycle(revision.id));
            }
            check_ancestors(&map, parent_id, &revision.version)?;
        }

        debug!(id = %revision.id, version = %revision.version, "revision inserted");
        let revision = Arc::new(revision);
        map.insert(revision.id.clone(), Arc::clone(&revision));
        Ok(revision)
    }

    /// The parent chain of `id`, starting with the revision itself and
    /// ending at its root.
    pub fn lineage(&self, id: &str) -> Result<Vec<Arc<Revision>>, StoreError> {
        let map = self.read();
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(id.to_string());

        while let Some(current) = next {
            if !seen.insert(current.clone()) {
                return Err(StoreError::LineageCycle(current));
            }
            let revision = map.get(&current).cloned().ok_or_else(|| {
                if chain.is_empty() {
                    StoreError::RevisionNotFound(current.clone())
                } else {
                    StoreError::ParentNotFound(current.clone())
                }
            })?;
            next = revision.parent_id.clone();
            chain.push(revision);
        }
        Ok(chain)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Walk from `parent_id` to the root, requiring every ancestor to exist and
/// to carry a version strictly below `version`.
fn check_ancestors(map: &RevisionMap, parent_id: &str, version: &Version) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    let mut next = Some(parent_id);
    let mut first = true;

    while let Some(current) = next {
        if !seen.insert(current) {
            return Err(StoreError::LineageCycle(current.to_string()));
        }
        let ancestor = map.get(current).ok_or_else(|| {
            if first {
                StoreError::ParentNotFound(current.to_string())
            } else {
                StoreError::Backend(format!("dangling ancestor reference {current}"))
            }
        })?;
        if ancestor.version >= *version {
            return Err(StoreError::VersionNotIncreasing {
                version: version.to_string(),
                ancestor_id: ancestor.id.clone(),
                ancestor_version: ancestor.version.to_string(),
            });
        }
        first = false;
        next = ancestor.parent_id.as_deref();
    }
    Ok(())
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn get_revision(&self, id: &str) -> Result<Arc<Revision>, StoreError> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::RevisionNotFound(id.to_string()))
    }

    async fn save(&self, candidate: CandidateRevision) -> Result<Arc<Revision>, StoreError> {
        let mut map = self.write();
        let parent = map
            .get(&candidate.parent_id)
            .cloned()
            .ok_or_else(|| StoreError::ParentNotFound(candidate.parent_id.clone()))?;

        let version = candidate
            .version
            .unwrap_or_else(|| next_version(&parent.version));
        check_ancestors(&map, &parent.id, &version)?;

        let revision = Arc::new(Revision {
            id: uuid::Uuid::new_v4().to_string(),
            version,
            sections: candidate.sections,
            created_at: Utc::now(),
            author_id: candidate
                .author_id
                .unwrap_or_else(|| parent.author_id.clone()),
            parent_id: Some(parent.id.clone()),
            status: candidate.status,
        });
        map.insert(revision.id.clone(), Arc::clone(&revision));

        info!(
            id = %revision.id,
            parent = %parent.id,
            version = %revision.version,
            "revision saved"
        );
        Ok(revision)
    }

    async fn list_revisions(&self) -> Result<Vec<Arc<Revision>>, StoreError> {
        let mut all: Vec<Arc<Revision>> = self.read().values().cloned().collect();
        all.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }
}
