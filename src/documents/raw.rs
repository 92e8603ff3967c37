//! Raw-file passthrough: the engine parses the bytes, the client only validates the request shape.

use super::types::{DocumentError, DocumentType, parse_csv_delimiter};
use reqwest::Body;
use std::path::{Path, PathBuf};

/// A validated raw upload, ready to be opened and streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUpload {
    /// File to stream.
    pub path: PathBuf,
    /// Format the engine will parse, taken from the extension.
    pub document_type: DocumentType,
    /// Non-default CSV delimiter.
    pub csv_delimiter: Option<u8>,
}

impl RawUpload {
    /// Check extension and delimiter compatibility. Performs no I/O.
    pub fn prepare(
        path: &Path,
        declared: Option<DocumentType>,
        csv_delimiter: Option<&str>,
    ) -> Result<Self, DocumentError> {
        let document_type = DocumentType::from_path(path)?;
        if let Some(declared) = declared
            && declared != document_type
        {
            return Err(DocumentError::Config(format!(
                "declared document type {declared} does not match the .{} extension of {}",
                document_type.extension(),
                path.display()
            )));
        }

        let csv_delimiter = csv_delimiter.map(parse_csv_delimiter).transpose()?;
        if csv_delimiter.is_some() && document_type != DocumentType::Csv {
            return Err(DocumentError::Config(format!(
                "csv delimiter can only be used with csv files, not {}",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            document_type,
            csv_delimiter: csv_delimiter.filter(|delimiter| *delimiter != b','),
        })
    }

    /// `Content-Type` header for the upload.
    pub fn content_type(&self) -> &'static str {
        self.document_type.content_type()
    }

    /// Query parameters carrying the primary key and delimiter.
    pub fn query(&self, primary_key: Option<&str>) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(primary_key) = primary_key {
            query.push(("primaryKey", primary_key.to_string()));
        }
        if let Some(delimiter) = self.csv_delimiter {
            query.push(("csvDelimiter", char::from(delimiter).to_string()));
        }
        query
    }

    /// Open the file as a streaming request body, returning it with its length in bytes.
    pub async fn open(&self) -> Result<(Body, u64), DocumentError> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|source| DocumentError::io(&self.path, source))?;
        let metadata = file
            .metadata()
            .await
            .map_err(|source| DocumentError::io(&self.path, source))?;
        if !metadata.is_file() {
            return Err(DocumentError::NotFound {
                path: self.path.clone(),
            });
        }
        Ok((Body::from(file), metadata.len()))
    }
}
