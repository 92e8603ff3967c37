//! Per-index handle: metadata, stats, document reads and deletions.

use crate::client::{ClientError, HttpClient, TaskInfo};
use crate::documents::Document;
use crate::index::types::{DocumentsPage, DocumentsQuery, IndexInfo, IndexStats};
use crate::metrics::IngestMetrics;
use futures_util::future::try_join_all;
use serde_json::json;
use std::sync::Arc;

/// Handle to one index on the engine.
///
/// Handles are cheap to clone and share the HTTP connection pool and ingestion metrics of the
/// [`crate::client::Client`] that created them.
#[derive(Clone)]
pub struct Index {
    pub(crate) uid: String,
    pub(crate) http: HttpClient,
    pub(crate) metrics: Arc<IngestMetrics>,
}

impl Index {
    /// Build a handle over an existing transport.
    pub fn new(uid: impl Into<String>, http: HttpClient, metrics: Arc<IngestMetrics>) -> Self {
        Self {
            uid: uid.into(),
            http,
            metrics,
        }
    }

    /// Index identifier.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub(crate) fn path(&self, suffix: &str) -> String {
        format!("indexes/{}{suffix}", self.uid)
    }

    /// Fetch index metadata.
    pub async fn fetch_info(&self) -> Result<IndexInfo, ClientError> {
        self.http.get_json(&self.path(""), &[]).await
    }

    /// Primary key currently set on the index.
    pub async fn get_primary_key(&self) -> Result<Option<String>, ClientError> {
        Ok(self.fetch_info().await?.primary_key)
    }

    /// Document counts and field distribution.
    pub async fn get_stats(&self) -> Result<IndexStats, ClientError> {
        self.http.get_json(&self.path("/stats"), &[]).await
    }

    /// Fetch one document by primary key value.
    pub async fn get_document(&self, document_id: &str) -> Result<Document, ClientError> {
        self.http
            .get_json(&self.path(&format!("/documents/{document_id}")), &[])
            .await
    }

    /// Fetch a page of documents. Filtered queries use the `fetch` endpoint.
    pub async fn get_documents(
        &self,
        query: &DocumentsQuery,
    ) -> Result<DocumentsPage, ClientError> {
        if query.filter.is_some() {
            return self
                .http
                .post_json(&self.path("/documents/fetch"), &[], query)
                .await;
        }
        self.http
            .get_json(&self.path("/documents"), &query.query_pairs())
            .await
    }

    /// Delete one document by primary key value.
    pub async fn delete_document(&self, document_id: &str) -> Result<TaskInfo, ClientError> {
        self.http
            .delete_json(&self.path(&format!("/documents/{document_id}")))
            .await
    }

    /// Delete several documents by primary key value.
    pub async fn delete_documents(&self, document_ids: &[String]) -> Result<TaskInfo, ClientError> {
        self.http
            .post_json(&self.path("/documents/delete-batch"), &[], document_ids)
            .await
    }

    /// Delete every document matching a filter expression.
    pub async fn delete_documents_by_filter(&self, filter: &str) -> Result<TaskInfo, ClientError> {
        self.http
            .post_json(
                &self.path("/documents/delete"),
                &[],
                &json!({ "filter": filter }),
            )
            .await
    }

    /// Issue one filtered deletion per expression concurrently; tasks come back in input order.
    pub async fn delete_documents_in_batches_by_filter(
        &self,
        filters: &[String],
    ) -> Result<Vec<TaskInfo>, ClientError> {
        let deletions = filters
            .iter()
            .map(|filter| self.delete_documents_by_filter(filter));
        try_join_all(deletions).await
    }

    /// Delete every document in the index.
    pub async fn delete_all_documents(&self) -> Result<TaskInfo, ClientError> {
        self.http.delete_json(&self.path("/documents")).await
    }
}
