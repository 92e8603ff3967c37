//! Index handles: metadata, reads, deletions, and document ingestion.

mod handle;
mod ingest;
pub mod types;

pub use handle::Index;
pub use types::{DocumentsPage, DocumentsQuery, IndexInfo, IndexStats};
