//! Core data types and error definitions for the ingestion pipeline.

use crate::client::{ClientError, TaskInfo};
use reqwest::Method;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// One record to index: an ordered mapping from field name to JSON value.
pub type Document = Map<String, Value>;

/// Source formats understood by the decoder and the raw-file passthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    /// A JSON array of objects.
    Json,
    /// One JSON object per line.
    Ndjson,
    /// Header row followed by delimited records.
    Csv,
}

impl DocumentType {
    /// Every supported type, in discovery order.
    pub const ALL: [DocumentType; 3] = [Self::Json, Self::Ndjson, Self::Csv];

    /// Token used on the command line and in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Ndjson => "ndjson",
            Self::Csv => "csv",
        }
    }

    /// File extension (without the dot) mapped to this type.
    pub fn extension(self) -> &'static str {
        self.as_str()
    }

    /// `Content-Type` header used when the engine parses the payload itself.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Ndjson => "application/x-ndjson",
            Self::Csv => "text/csv",
        }
    }

    /// Match an extension case-insensitively.
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.extension().eq_ignore_ascii_case(extension))
    }

    /// Infer the type from a path's extension without touching the filesystem.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension).ok_or_else(|| DocumentError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: extension.to_string(),
        })
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim().trim_start_matches('.')).ok_or_else(|| {
            DocumentError::Config(format!(
                "unknown document type `{s}`; expected one of json, ndjson, csv"
            ))
        })
    }
}

/// Parse a CSV delimiter: exactly one ASCII character that can separate fields.
pub fn parse_csv_delimiter(delimiter: &str) -> Result<u8, DocumentError> {
    let mut chars = delimiter.chars();
    let (Some(ch), None) = (chars.next(), chars.next()) else {
        return Err(DocumentError::Config(format!(
            "csv delimiter must be a single character, got {delimiter:?}"
        )));
    };
    if !ch.is_ascii() {
        return Err(DocumentError::Config(format!(
            "csv delimiter must be an ASCII character, got {delimiter:?}"
        )));
    }
    if matches!(ch, '"' | '\n' | '\r') {
        return Err(DocumentError::Config(format!("csv delimiter cannot be {delimiter:?}")));
    }
    Ok(ch as u8)
}

/// Caller-facing knobs shared by the file, raw-file, and directory operations.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Primary key forwarded to the engine; inferred server-side when absent.
    pub primary_key: Option<String>,
    /// Declared document type. Files fall back to their extension; directories to every
    /// supported extension.
    pub document_type: Option<DocumentType>,
    /// CSV delimiter; only valid for CSV content.
    pub csv_delimiter: Option<String>,
    /// Merge every file of a directory into one collection before submission.
    pub combine_documents: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            primary_key: None,
            document_type: None,
            csv_delimiter: None,
            combine_documents: true,
        }
    }
}

impl IngestOptions {
    /// Options with defaults: inferred type, comma delimiter, combined directories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the primary key.
    pub fn primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = Some(primary_key.into());
        self
    }

    /// Declare the document type.
    pub fn document_type(mut self, document_type: DocumentType) -> Self {
        self.document_type = Some(document_type);
        self
    }

    /// Set the CSV delimiter.
    pub fn csv_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.csv_delimiter = Some(delimiter.into());
        self
    }

    /// Choose between merged and per-file directory submission.
    pub fn combine_documents(mut self, combine: bool) -> Self {
        self.combine_documents = combine;
        self
    }

    /// Validate the delimiter against the content type it will apply to.
    ///
    /// `None` for `document_type` means the type is not known yet (directory scans over all
    /// extensions); the delimiter then only applies to the CSV files found.
    pub fn delimiter_for(
        &self,
        document_type: Option<DocumentType>,
    ) -> Result<Option<u8>, DocumentError> {
        let Some(raw) = self.csv_delimiter.as_deref() else {
            return Ok(None);
        };
        let delimiter = parse_csv_delimiter(raw)?;
        match document_type {
            Some(DocumentType::Csv) | None => Ok(Some(delimiter)),
            Some(other) => Err(DocumentError::Config(format!(
                "csv delimiter can only be used with csv documents, not {other}"
            ))),
        }
    }
}

/// Whether an operation inserts or upserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Add documents (`POST`).
    Add,
    /// Add or update documents (`PUT`).
    Update,
}

impl Intent {
    /// HTTP method the engine expects for this intent.
    pub fn method(self) -> Method {
        match self {
            Self::Add => Method::POST,
            Self::Update => Method::PUT,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
        }
    }
}

/// Shape of the input an operation accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// In-memory collection, one request.
    Collection,
    /// In-memory collection split into batches.
    CollectionInBatches,
    /// Decoded file, one request.
    File,
    /// Decoded file split into batches.
    FileInBatches,
    /// Undecoded file bytes.
    RawFile,
    /// Every matching file of a directory.
    Directory,
    /// Every matching file of a directory, split into batches.
    DirectoryInBatches,
}

impl Source {
    fn suffix(self) -> &'static str {
        match self {
            Self::Collection => "",
            Self::CollectionInBatches => "_in_batches",
            Self::File => "_from_file",
            Self::FileInBatches => "_from_file_in_batches",
            Self::RawFile => "_from_raw_file",
            Self::Directory => "_from_directory",
            Self::DirectoryInBatches => "_from_directory_in_batches",
        }
    }
}

/// Public operation that produced an [`IngestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Insert or upsert.
    pub intent: Intent,
    /// Input shape.
    pub source: Source,
}

impl Operation {
    pub(crate) const fn new(intent: Intent, source: Source) -> Self {
        Self { intent, source }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (intent, suffix) = (self.intent.as_str(), self.source.suffix());
        write!(f, "{intent}_documents{suffix}")
    }
}

/// One failed unit (file or batch) of a multi-unit operation.
#[derive(Debug)]
pub struct UnitFailure {
    /// File path or batch label.
    pub unit: String,
    /// Why that unit failed.
    pub error: DocumentError,
}

/// Cause of a failed ingestion unit.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Parameters are self-contradictory or out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Path extension is not one of the supported document types.
    #[error(
        "unsupported document format `{extension}` for {}; expected json, ndjson, or csv",
        path.display()
    )]
    UnsupportedFormat {
        /// Offending path.
        path: PathBuf,
        /// Extension found on the path (empty when missing).
        extension: String,
    },
    /// Decoded content does not have the required document shape.
    #[error("invalid document in {source_name}: {reason}")]
    InvalidDocument {
        /// File (and line or element) that held the bad record.
        source_name: String,
        /// What was wrong with it.
        reason: String,
    },
    /// Referenced file or directory does not exist.
    #[error("{} not found", path.display())]
    NotFound {
        /// Missing path.
        path: PathBuf,
    },
    /// Directory operation pointed at something that is not a directory.
    #[error("{} is not a directory", path.display())]
    NotADirectory {
        /// Offending path.
        path: PathBuf,
    },
    /// Directory holds no file matching the requested document type.
    #[error(
        "no {} files found in {}",
        document_type.map_or("json, ndjson, or csv", DocumentType::as_str),
        path.display()
    )]
    NoDocuments {
        /// Scanned directory.
        path: PathBuf,
        /// Requested type, `None` when every supported type was accepted.
        document_type: Option<DocumentType>,
    },
    /// Filesystem failure other than a missing path.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The engine or the transport rejected a submission.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The engine or the transport rejected documents read from a file or directory.
    #[error("{}: {source}", path.display())]
    Remote {
        /// File or directory the rejected documents came from.
        path: PathBuf,
        /// Underlying client error.
        #[source]
        source: ClientError,
    },
    /// Some units of a multi-unit operation failed while others were accepted.
    #[error(
        "{} unit(s) failed, {} task(s) accepted; first failure in {}: {}",
        failures.len(),
        submitted.len(),
        failures.first().map_or("<none>", |failure| failure.unit.as_str()),
        failures.first().map_or(String::new(), |failure| failure.error.to_string())
    )]
    Partial {
        /// Failed units in construction order.
        failures: Vec<UnitFailure>,
        /// Tasks accepted for the units that succeeded, in construction order.
        submitted: Vec<TaskInfo>,
    },
}

impl DocumentError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub(crate) fn invalid(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Attribute client failures, including those nested in a partial failure, to `path`.
    pub(crate) fn attributed_to(self, path: &Path) -> Self {
        match self {
            Self::Client(source) => Self::Remote {
                path: path.to_path_buf(),
                source,
            },
            Self::Partial {
                failures,
                submitted,
            } => Self::Partial {
                failures: failures
                    .into_iter()
                    .map(|failure| UnitFailure {
                        unit: failure.unit,
                        error: failure.error.attributed_to(path),
                    })
                    .collect(),
                submitted,
            },
            other => other,
        }
    }
}

/// Failure of a public ingestion operation, naming the operation and the cause.
#[derive(Debug, Error)]
#[error("{operation} failed: {source}")]
pub struct IngestError {
    /// Operation that failed.
    pub operation: Operation,
    /// Underlying cause.
    pub source: DocumentError,
}

impl IngestError {
    pub(crate) fn new(operation: Operation, source: impl Into<DocumentError>) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }

    /// Caller parameters are wrong; nothing was read or sent.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self.source,
            DocumentError::Config(_) | DocumentError::UnsupportedFormat { .. }
        )
    }

    /// Decoded content had the wrong shape; nothing was sent for that unit.
    pub fn is_content_error(&self) -> bool {
        matches!(self.source, DocumentError::InvalidDocument { .. })
    }

    /// The path was missing, not a directory, or held nothing to ingest.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.source,
            DocumentError::NotFound { .. }
                | DocumentError::NotADirectory { .. }
                | DocumentError::NoDocuments { .. }
        )
    }

    /// The request reached the engine (or tried to) and failed there.
    pub fn is_remote_error(&self) -> bool {
        matches!(
            self.source,
            DocumentError::Client(_) | DocumentError::Remote { .. }
        )
    }

    /// Tasks the engine accepted before the operation failed.
    pub fn submitted(&self) -> &[TaskInfo] {
        match &self.source {
            DocumentError::Partial { submitted, .. } => submitted,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_accepts_single_ascii() {
        assert_eq!(parse_csv_delimiter(";").expect("semicolon"), b';');
        assert_eq!(parse_csv_delimiter("\t").expect("tab"), b'\t');
    }

    #[test]
    fn delimiter_rejects_multi_char_and_emoji() {
        for bad in [";;", "😀", "", "\""] {
            assert!(
                matches!(parse_csv_delimiter(bad), Err(DocumentError::Config(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn delimiter_only_pairs_with_csv() {
        let options = IngestOptions::new().csv_delimiter(";");
        assert_eq!(
            options.delimiter_for(Some(DocumentType::Csv)).expect("csv"),
            Some(b';')
        );
        assert_eq!(options.delimiter_for(None).expect("any"), Some(b';'));
        assert!(matches!(
            options.delimiter_for(Some(DocumentType::Ndjson)),
            Err(DocumentError::Config(_))
        ));
        let without = IngestOptions::new().delimiter_for(Some(DocumentType::Json));
        assert_eq!(without.expect("none"), None);
    }

    #[test]
    fn document_type_from_path() {
        assert_eq!(
            DocumentType::from_path(Path::new("movies.NDJSON")).expect("ndjson"),
            DocumentType::Ndjson
        );
        match DocumentType::from_path(Path::new("test.bad")) {
            Err(DocumentError::UnsupportedFormat { extension, .. }) => assert_eq!(extension, "bad"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(DocumentType::from_path(Path::new("no_extension")).is_err());
    }

    #[test]
    fn document_type_parses_tokens() {
        let csv: DocumentType = "csv".parse().expect("csv");
        assert_eq!(csv, DocumentType::Csv);
        assert_eq!(
            ".json".parse::<DocumentType>().expect("json"),
            DocumentType::Json
        );
        assert!("xml".parse::<DocumentType>().is_err());
    }

    #[test]
    fn operation_names_match_public_methods() {
        let op = Operation::new(Intent::Update, Source::DirectoryInBatches);
        assert_eq!(op.to_string(), "update_documents_from_directory_in_batches");
        assert_eq!(
            Operation::new(Intent::Add, Source::Collection).to_string(),
            "add_documents"
        );
    }

    #[test]
    fn ingest_error_classifies_causes() {
        let op = Operation::new(Intent::Add, Source::File);
        let error = IngestError::new(op, DocumentError::Config("bad".into()));
        assert!(error.is_config_error());
        assert!(!error.is_remote_error());
        let message = error.to_string();
        assert!(message.starts_with("add_documents_from_file failed"));

        let missing = IngestError::new(
            op,
            DocumentError::io(
                Path::new("gone.json"),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ),
        );
        assert!(missing.is_not_found());
        assert!(missing.submitted().is_empty());
    }
}
