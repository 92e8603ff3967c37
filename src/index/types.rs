//! Response and query types for index-scoped endpoints.

use crate::documents::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index metadata as reported by `GET /indexes/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    /// Index identifier.
    pub uid: String,
    /// Primary key, once set or inferred.
    #[serde(default)]
    pub primary_key: Option<String>,
    /// RFC3339 creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// RFC3339 last update timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Document counts for an index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Number of stored documents.
    pub number_of_documents: u64,
    /// Whether the index is currently processing a task.
    pub is_indexing: bool,
    /// How many documents carry each field.
    #[serde(default)]
    pub field_distribution: BTreeMap<String, u64>,
}

/// Paging and projection options for [`crate::index::Index::get_documents`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentsQuery {
    /// Number of documents to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    /// Maximum number of documents to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Fields to include in each document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    /// Filter expression; requires the fields to be filterable on the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl DocumentsQuery {
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(fields) = &self.fields {
            pairs.push(("fields", fields.join(",")));
        }
        pairs
    }
}

/// One page of stored documents.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DocumentsPage {
    /// Documents on this page.
    pub results: Vec<Document>,
    /// Offset the page starts at.
    pub offset: usize,
    /// Page size requested.
    pub limit: usize,
    /// Total number of matching documents.
    pub total: u64,
}
