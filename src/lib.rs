#![deny(missing_docs)]

//! Client-side document ingestion for full-text search engines.
//!
//! Documents arrive as in-memory collections, files, or directories of JSON, NDJSON, or CSV.
//! They are decoded into a uniform [`documents::Document`] shape, optionally merged and split
//! into size-bounded batches, and submitted as asynchronous indexing tasks whose handles are
//! returned in submission order.

/// HTTP transport, task handles, and index lifecycle.
pub mod client;
/// Environment-driven configuration.
pub mod config;
/// Decoding, validation, merging, and batching of documents.
pub mod documents;
/// Per-index handles and ingestion operations.
pub mod index;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion counters.
pub mod metrics;

pub use client::{Client, ClientError, TaskInfo};
pub use documents::{Document, DocumentType, IngestError, IngestOptions};
pub use index::Index;
