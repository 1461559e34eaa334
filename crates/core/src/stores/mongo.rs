use crate::error::CatalogError;
use crate::models::CatalogRecord;
use crate::query::QueryNode;
use crate::store::CatalogStore;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

const BACKEND: &str = "data-api";

/// Catalog backend speaking the document database's HTTP data API.
pub struct DataApiStore {
    client: Client,
    endpoint: String,
    api_key: String,
    data_source: String,
    database: String,
    collection: String,
}

impl DataApiStore {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        data_source: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            data_source: data_source.into(),
            database: "ordenadores_db".to_string(),
            collection: "ordenadores".to_string(),
        }
    }

    pub fn with_collection(
        mut self,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        self.database = database.into();
        self.collection = collection.into();
        self
    }

    fn action_body(&self, extra: Value) -> Result<Value, CatalogError> {
        let mut body = json!({
            "dataSource": self.data_source,
            "database": self.database,
            "collection": self.collection,
        });

        let object = body
            .as_object_mut()
            .ok_or_else(|| CatalogError::Request("action body is not an object".to_string()))?;
        if let Value::Object(extra) = extra {
            object.extend(extra);
        }
        Ok(body)
    }

    async fn post_action(&self, action: &str, body: Value) -> Result<Value, CatalogError> {
        let url = url::Url::parse(&format!("{}/action/{}", self.endpoint, action))?;
        let response = self
            .client
            .post(url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CatalogError::BackendResponse {
                backend: BACKEND.to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(response.json().await?)
    }

    async fn find_with_filter(&self, filter: Value) -> Result<Vec<CatalogRecord>, CatalogError> {
        debug!(filter = %filter, "catalog find");
        let body = self.action_body(json!({ "filter": filter }))?;
        let response = self.post_action("find", body).await?;

        let documents = response
            .get("documents")
            .cloned()
            .ok_or_else(|| CatalogError::BackendResponse {
                backend: BACKEND.to_string(),
                details: "find response missing documents".to_string(),
            })?;

        Ok(serde_json::from_value(documents)?)
    }
}

#[async_trait]
impl CatalogStore for DataApiStore {
    async fn insert(&self, record: &CatalogRecord) -> Result<(), CatalogError> {
        let body = self.action_body(json!({ "document": record }))?;
        let response = self.post_action("insertOne", body).await?;

        if response.get("insertedId").is_none() {
            return Err(CatalogError::BackendResponse {
                backend: BACKEND.to_string(),
                details: "insertOne response missing insertedId".to_string(),
            });
        }
        Ok(())
    }

    async fn find(&self, query: &QueryNode) -> Result<Vec<CatalogRecord>, CatalogError> {
        self.find_with_filter(query.to_filter()).await
    }

    async fn all(&self) -> Result<Vec<CatalogRecord>, CatalogError> {
        self.find_with_filter(json!({})).await
    }
}
