//! The version service: store access, comparison building, caching and
//! reconciliation behind three entry points.

use std::sync::Arc;

use tracing::{debug, info};

use crate::comparison::{CacheStats, ComparisonBuilder, ComparisonCache, VersionComparison};
use crate::config::AppConfig;
use crate::errors::{ConfigError, CoreError, StoreError};
use crate::models::{CandidateRevision, Revision};
use crate::reconcile::{ReconciliationDecision, ReconciliationEngine, ReviewSession};
use crate::store::VersionStore;

/// Compare, reconcile and persist revisions held by a [`VersionStore`].
#[derive(Debug)]
pub struct VersionService<S: VersionStore> {
    store: Arc<S>,
    builder: ComparisonBuilder,
    engine: ReconciliationEngine,
    cache: Option<ComparisonCache>,
}

impl<S: VersionStore> VersionService<S> {
    pub fn new(store: Arc<S>, config: &AppConfig) -> Result<Self, ConfigError> {
        let cache = config
            .cache
            .enabled
            .then(|| ComparisonCache::new(config.cache.max_entries));
        Ok(Self {
            store,
            builder: ComparisonBuilder::from_config(config)?,
            engine: ReconciliationEngine::from_config(config),
            cache,
        })
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn builder(&self) -> &ComparisonBuilder {
        &self.builder
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    /// Compare two stored revisions.
    ///
    /// Both revisions are fetched before any diffing; a missing id surfaces
    /// as [`StoreError::RevisionNotFound`] unchanged.
    pub async fn compare_versions(
        &self,
        from_id: &str,
        to_id: &str,
    ) -> Result<Arc<VersionComparison>, CoreError> {
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(from_id, to_id)) {
            return Ok(hit);
        }

        let from = self.store.get_revision(from_id).await?;
        let to = self.store.get_revision(to_id).await?;

        let comparison = Arc::new(self.builder.compare(&from, &to));
        if let Some(cache) = &self.cache {
            cache.insert(Arc::clone(&comparison));
        }
        Ok(comparison)
    }

    /// Start a review session for two stored revisions.
    pub async fn review(&self, from_id: &str, to_id: &str) -> Result<ReviewSession, CoreError> {
        let comparison = self.compare_versions(from_id, to_id).await?;
        Ok(ReviewSession::new(comparison))
    }

    /// Apply decisions to a comparison. The result is not persisted.
    pub async fn reconcile_comparison(
        &self,
        comparison: &VersionComparison,
        decisions: &[ReconciliationDecision],
    ) -> Result<CandidateRevision, CoreError> {
        let to = self.store.get_revision(&comparison.to_revision_id).await?;
        debug!(comparison = %comparison.id, to = %to.id, "target revision loaded");
        Ok(self.engine.reconcile(comparison, &to, decisions)?)
    }

    /// Close a review session, producing its candidate revision.
    pub async fn finish_review(
        &self,
        session: &mut ReviewSession,
    ) -> Result<CandidateRevision, CoreError> {
        let to = self
            .store
            .get_revision(&session.comparison().to_revision_id)
            .await?;
        Ok(session.reconcile(&self.engine, &to)?)
    }

    /// Hand a candidate to the store.
    pub async fn persist_candidate(
        &self,
        candidate: CandidateRevision,
    ) -> Result<Arc<Revision>, StoreError> {
        let parent = candidate.parent_id.clone();
        let saved = self.store.save(candidate).await?;
        info!(id = %saved.id, parent = %parent, "candidate persisted");
        Ok(saved)
    }

    /// Cache counters, or `None` when caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(ComparisonCache::stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SectionKind;
    use crate::store::InMemoryVersionStore;
    use semver::Version;

    fn service(config: &AppConfig) -> VersionService<InMemoryVersionStore> {
        let store = InMemoryVersionStore::new();
        store
            .insert(Revision::new("r1", Version::new(1, 0, 0), "a").with_section(SectionKind::Logic, "x"))
            .unwrap();
        store
            .insert(
                Revision::new("r2", Version::new(1, 1, 0), "a")
                    .with_parent("r1")
                    .with_section(SectionKind::Logic, "y"),
            )
            .unwrap();
        VersionService::new(Arc::new(store), config).unwrap()
    }

    #[tokio::test]
    async fn test_second_compare_hits_cache() {
        let svc = service(&AppConfig::default());
        let first = svc.compare_versions("r1", "r2").await.unwrap();
        let second = svc.compare_versions("r1", "r2").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let stats = svc.cache_stats().unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_cache_can_be_disabled() {
        let mut config = AppConfig::default();
        config.cache.enabled = false;
        let svc = service(&config);
        svc.compare_versions("r1", "r2").await.unwrap();
        assert!(svc.cache_stats().is_none());
    }

    #[tokio::test]
    async fn test_missing_revision_is_not_cached() {
        let svc = service(&AppConfig::default());
        let err = svc.compare_versions("r1", "zz").await.unwrap_err();
        assert!(matches!(err, CoreError::Store(StoreError::RevisionNotFound(id)) if id == "zz"));
        assert_eq!(svc.cache_stats().unwrap().entries, 0);
    }

    #[tokio::test]
    async fn test_review_session_round_trip() {
        let svc = service(&AppConfig::default());
        let mut session = svc.review("r1", "r2").await.unwrap();
        session.reject("logic-0").unwrap();
        let candidate = svc.finish_review(&mut session).await.unwrap();
        assert_eq!(candidate.section_text(SectionKind::Logic), "x");
        assert_eq!(candidate.parent_id, "r2");
    }
}
