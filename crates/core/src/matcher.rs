use crate::error::CatalogError;
use crate::models::{MatchPhase, MatchResult, ResolvedCriteria};
use crate::query::QueryNode;
use crate::store::CatalogStore;
use std::collections::BTreeSet;
use tracing::debug;

/// Exact conjunction first, relaxed disjunction only when the exact phase
/// finds nothing; store order is preserved untouched.
pub struct CatalogMatcher<S> {
    store: S,
}

impl<S> CatalogMatcher<S>
where
    S: CatalogStore + Send + Sync,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn find_matches(
        &self,
        criteria: &ResolvedCriteria,
    ) -> Result<MatchResult, CatalogError> {
        let Some(exact) = QueryNode::exact(criteria) else {
            return Ok(MatchResult::empty());
        };

        let records = self.store.find(&exact).await?;
        if !records.is_empty() {
            debug!(hits = records.len(), "exact match");
            return Ok(MatchResult {
                records,
                unsatisfied: BTreeSet::new(),
                phase: MatchPhase::Exact,
            });
        }

        let Some(relaxed) = QueryNode::relaxed(criteria) else {
            return Ok(MatchResult::empty());
        };

        let records = self.store.find(&relaxed).await?;
        if !records.is_empty() {
            debug!(hits = records.len(), "relaxed match");
            return Ok(MatchResult {
                records,
                unsatisfied: BTreeSet::new(),
                phase: MatchPhase::Relaxed,
            });
        }

        debug!(criteria = criteria.len(), "no match in either phase");
        Ok(MatchResult {
            records: Vec::new(),
            unsatisfied: criteria.keys(),
            phase: MatchPhase::NoMatch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CatalogRecord, EntityCandidate, ResolvedCriteria};
    use crate::stores::InMemoryCatalog;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(pairs: &[(&str, &str)], document_id: &str) -> CatalogRecord {
        let mut entities = BTreeMap::new();
        for (category, text) in pairs {
            entities.insert(
                category.to_string(),
                vec![EntityCandidate::new(*text, 0.9)],
            );
        }
        CatalogRecord::new(document_id, entities)
    }

    fn criteria(pairs: &[(&str, &str)]) -> ResolvedCriteria {
        pairs
            .iter()
            .map(|(category, value)| (category.to_string(), value.to_string()))
            .collect()
    }

    /// Store that counts queries, for asserting the empty-criteria
    /// short-circuit.
    #[derive(Default)]
    struct CountingStore {
        queries: AtomicUsize,
    }

    #[async_trait]
    impl CatalogStore for CountingStore {
        async fn insert(&self, _record: &CatalogRecord) -> Result<(), CatalogError> {
            Ok(())
        }

        async fn find(&self, _query: &QueryNode) -> Result<Vec<CatalogRecord>, CatalogError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn all(&self) -> Result<Vec<CatalogRecord>, CatalogError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn exact_match_wins_outright() -> Result<(), CatalogError> {
        let store = InMemoryCatalog::with_records(vec![
            record(&[("Marca", "Dell")], "exact.pdf"),
            record(&[("Marca", "Dell Inc")], "partial.pdf"),
        ]);
        let matcher = CatalogMatcher::new(store);

        let result = matcher.find_matches(&criteria(&[("Marca", "dell")])).await?;
        assert_eq!(result.phase, MatchPhase::Exact);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].document_id, "exact.pdf");
        assert!(result.unsatisfied.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn relaxed_phase_matches_substrings_when_exact_fails() -> Result<(), CatalogError> {
        let store = InMemoryCatalog::with_records(vec![record(
            &[("Marca", "Dell Inc"), ("Memoria RAM", "16GB DDR4")],
            "ficha.pdf",
        )]);
        let matcher = CatalogMatcher::new(store);

        let result = matcher
            .find_matches(&criteria(&[("Marca", "Dell"), ("Memoria RAM", "16GB")]))
            .await?;
        assert_eq!(result.phase, MatchPhase::Relaxed);
        assert_eq!(result.records.len(), 1);
        assert!(result.unsatisfied.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn both_phases_empty_report_every_criterion_unsatisfied(
    ) -> Result<(), CatalogError> {
        let store = InMemoryCatalog::with_records(vec![record(&[("Marca", "Asus")], "asus.pdf")]);
        let matcher = CatalogMatcher::new(store);

        let wanted = criteria(&[("Marca", "Dell"), ("Grafica", "RTX 4060")]);
        let result = matcher.find_matches(&wanted).await?;

        assert_eq!(result.phase, MatchPhase::NoMatch);
        assert!(result.records.is_empty());
        assert_eq!(result.unsatisfied, wanted.keys());
        Ok(())
    }

    #[tokio::test]
    async fn empty_criteria_issue_no_store_query() -> Result<(), CatalogError> {
        let store = CountingStore::default();
        let matcher = CatalogMatcher::new(store);

        let result = matcher.find_matches(&ResolvedCriteria::new()).await?;
        assert!(result.records.is_empty());
        assert!(result.unsatisfied.is_empty());
        assert_eq!(matcher.store().queries.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn matching_is_idempotent_for_an_unchanged_snapshot() -> Result<(), CatalogError> {
        let store = InMemoryCatalog::with_records(vec![
            record(&[("Marca", "Dell Inc")], "a.pdf"),
            record(&[("Marca", "Dellbook")], "b.pdf"),
        ]);
        let matcher = CatalogMatcher::new(store);
        let wanted = criteria(&[("Marca", "Dell")]);

        let first = matcher.find_matches(&wanted).await?;
        let second = matcher.find_matches(&wanted).await?;
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn accepts_any_criteria_subset_including_empty() -> Result<(), CatalogError> {
        let store = InMemoryCatalog::with_records(vec![record(
            &[("Marca", "Lenovo"), ("Memoria RAM", "32GB")],
            "lenovo.pdf",
        )]);
        let matcher = CatalogMatcher::new(store);

        let wanted = criteria(&[("Marca", "Dell"), ("Memoria RAM", "32GB")]);
        let first = matcher.find_matches(&wanted).await?;
        assert_eq!(first.phase, MatchPhase::Relaxed);

        let narrower = criteria(&[("Grafica", "RTX 5090")]);
        let miss = matcher.find_matches(&narrower).await?;
        assert_eq!(miss.phase, MatchPhase::NoMatch);

        // Dropping the unsatisfied categories leaves the empty set, which
        // must short-circuit cleanly.
        let followup = matcher
            .find_matches(&narrower.without(&miss.unsatisfied))
            .await?;
        assert!(followup.records.is_empty());
        assert!(followup.unsatisfied.is_empty());
        Ok(())
    }
}
