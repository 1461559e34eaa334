use crate::error::CatalogError;
use crate::models::CatalogRecord;
use crate::query::QueryNode;
use async_trait::async_trait;

#[async_trait]
pub trait CatalogStore {
    async fn insert(&self, record: &CatalogRecord) -> Result<(), CatalogError>;

    /// Records satisfying the query, in the store's natural order.
    async fn find(&self, query: &QueryNode) -> Result<Vec<CatalogRecord>, CatalogError>;

    async fn all(&self) -> Result<Vec<CatalogRecord>, CatalogError>;
}
