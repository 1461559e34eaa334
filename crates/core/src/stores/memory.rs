use crate::error::CatalogError;
use crate::models::CatalogRecord;
use crate::query::QueryNode;
use crate::store::CatalogStore;
use async_trait::async_trait;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory backend evaluating the query tree locally.
#[derive(Default)]
pub struct InMemoryCatalog {
    records: RwLock<Vec<CatalogRecord>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<CatalogRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|mut record| {
                if record.id.is_none() {
                    record.id = Some(Uuid::new_v4().to_string());
                }
                record
            })
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn insert(&self, record: &CatalogRecord) -> Result<(), CatalogError> {
        let mut stored = record.clone();
        if stored.id.is_none() {
            stored.id = Some(Uuid::new_v4().to_string());
        }

        self.records
            .write()
            .map_err(|_| CatalogError::Request("catalog lock poisoned".to_string()))?
            .push(stored);
        Ok(())
    }

    async fn find(&self, query: &QueryNode) -> Result<Vec<CatalogRecord>, CatalogError> {
        let records = self
            .records
            .read()
            .map_err(|_| CatalogError::Request("catalog lock poisoned".to_string()))?;

        Ok(records
            .iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect())
    }

    async fn all(&self) -> Result<Vec<CatalogRecord>, CatalogError> {
        let records = self
            .records
            .read()
            .map_err(|_| CatalogError::Request("catalog lock poisoned".to_string()))?;
        Ok(records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityCandidate, ResolvedCriteria};
    use std::collections::BTreeMap;

    fn record(brand: &str) -> CatalogRecord {
        let mut entities = BTreeMap::new();
        entities.insert(
            "Marca".to_string(),
            vec![EntityCandidate::new(brand, 0.9)],
        );
        CatalogRecord::new(format!("{brand}.pdf"), entities)
    }

    #[tokio::test]
    async fn insert_mints_an_id_and_find_preserves_order() -> Result<(), CatalogError> {
        let store = InMemoryCatalog::new();
        store.insert(&record("Dell")).await?;
        store.insert(&record("Lenovo")).await?;
        store.insert(&record("Dell Latitude")).await?;

        let criteria: ResolvedCriteria = [("Marca".to_string(), "dell".to_string())]
            .into_iter()
            .collect();
        let query = QueryNode::relaxed(&criteria).expect("non-empty");

        let found = store.find(&query).await?;
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].document_id, "Dell.pdf");
        assert_eq!(found[1].document_id, "Dell Latitude.pdf");
        assert!(found.iter().all(|record| record.id.is_some()));
        Ok(())
    }

    #[tokio::test]
    async fn all_returns_the_whole_catalog() -> Result<(), CatalogError> {
        let store = InMemoryCatalog::with_records(vec![record("Dell"), record("Asus")]);
        assert_eq!(store.all().await?.len(), 2);
        Ok(())
    }
}
