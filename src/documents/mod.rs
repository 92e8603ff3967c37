//! Document pipeline: decoding, shape validation, merging, and batching.

pub mod batch;
pub mod decode;
pub mod discover;
pub mod normalize;
pub mod raw;
pub mod types;

pub use batch::{expected_batch_count, partition, validate_batch_size};
pub use decode::{decode_documents, load_documents};
pub use discover::{SourceFile, discover_files};
pub use normalize::{combine, into_document, normalize_values};
pub use raw::RawUpload;
pub use types::{
    Document, DocumentError, DocumentType, IngestError, IngestOptions, Intent, Operation, Source,
    UnitFailure, parse_csv_delimiter,
};
