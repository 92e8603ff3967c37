//! Decoding of JSON, NDJSON, and CSV sources into documents.

use super::normalize::{into_document, normalize_values, value_kind};
use super::types::{Document, DocumentError, DocumentType};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read a file and decode it as `document_type`.
///
/// The file is read in full; decoding happens after the read completes.
pub async fn load_documents(
    path: &Path,
    document_type: DocumentType,
    csv_delimiter: Option<u8>,
) -> Result<Vec<Document>, DocumentError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| DocumentError::io(path, source))?;
    let source_name = path.display().to_string();
    let documents = decode_documents(&bytes, document_type, csv_delimiter, &source_name)?;
    tracing::debug!(
        path = %source_name,
        document_type = %document_type,
        documents = documents.len(),
        "Decoded source file"
    );
    Ok(documents)
}

/// Decode an in-memory payload. `source_name` labels errors.
pub fn decode_documents(
    bytes: &[u8],
    document_type: DocumentType,
    csv_delimiter: Option<u8>,
    source_name: &str,
) -> Result<Vec<Document>, DocumentError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match document_type {
        DocumentType::Json => decode_json(bytes, source_name),
        DocumentType::Ndjson => decode_ndjson(bytes, source_name),
        DocumentType::Csv => decode_csv(bytes, csv_delimiter.unwrap_or(b','), source_name),
    }
}

fn decode_json(bytes: &[u8], source_name: &str) -> Result<Vec<Document>, DocumentError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|err| DocumentError::invalid(source_name, format!("malformed JSON: {err}")))?;
    match value {
        Value::Array(items) => normalize_values(items, source_name),
        other => {
            let kind = value_kind(&other);
            Err(DocumentError::invalid(
                source_name,
                format!("expected a JSON array of objects, found {kind}"),
            ))
        }
    }
}

fn decode_ndjson(bytes: &[u8], source_name: &str) -> Result<Vec<Document>, DocumentError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|err| DocumentError::invalid(source_name, format!("not valid UTF-8: {err}")))?;

    let mut documents = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let label = format!("{source_name}:{}", index + 1);
        let value: Value = serde_json::from_str(line)
            .map_err(|err| DocumentError::invalid(&label, format!("malformed JSON: {err}")))?;
        documents.push(into_document(value, &label)?);
    }
    Ok(documents)
}

fn decode_csv(
    bytes: &[u8],
    delimiter: u8,
    source_name: &str,
) -> Result<Vec<Document>, DocumentError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|err| csv_error(source_name, &err))?
        .clone();
    let mut seen = HashSet::new();
    for name in headers.iter() {
        if !seen.insert(name) {
            return Err(DocumentError::invalid(
                format!("{source_name}:1"),
                format!("duplicate column `{name}` in header"),
            ));
        }
    }

    let mut documents = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| csv_error(source_name, &err))?;
        let document: Document = headers
            .iter()
            .zip(record.iter())
            .map(|(field, cell)| (field.to_string(), Value::String(cell.to_string())))
            .collect();
        documents.push(document);
    }
    Ok(documents)
}

fn csv_error(source_name: &str, err: &csv::Error) -> DocumentError {
    match err.position() {
        Some(position) => DocumentError::invalid(
            format!("{source_name}:{}", position.line()),
            format!("malformed CSV: {err}"),
        ),
        None => DocumentError::invalid(source_name, format!("malformed CSV: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn movies(count: u64) -> Vec<Document> {
        (0..count)
            .map(|id| {
                json!({ "id": id, "title": format!("movie {id}"), "genre": "test" })
                    .as_object()
                    .cloned()
                    .expect("object")
            })
            .collect()
    }

    fn as_strings(documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .map(|doc| {
                doc.iter()
                    .map(|(key, value)| {
                        let text = match value {
                            Value::String(text) => text.clone(),
                            other => other.to_string(),
                        };
                        (key.clone(), Value::String(text))
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn json_round_trip() {
        let original = movies(3);
        let bytes = serde_json::to_vec(&original).expect("encode");
        let decoded =
            decode_documents(&bytes, DocumentType::Json, None, "movies.json").expect("decode");
        assert_eq!(decoded, original);
    }

    #[test]
    fn ndjson_round_trip_skips_blank_lines() {
        let original = movies(3);
        let mut text = String::new();
        for doc in &original {
            text.push_str(&serde_json::to_string(doc).expect("encode"));
            text.push_str("\n\n");
        }
        let bytes = text.as_bytes();
        let decoded =
            decode_documents(bytes, DocumentType::Ndjson, None, "movies.ndjson").expect("decode");
        assert_eq!(decoded, original);
    }

    #[test]
    fn csv_round_trip_keeps_strings() {
        let original = movies(3);
        let mut text = String::from("id;title;genre\n");
        for doc in &original {
            let title = doc["title"].as_str().unwrap_or_default();
            text.push_str(&format!("{};{title};test\n", doc["id"]));
        }
        let bytes = text.as_bytes();
        let decoded =
            decode_documents(bytes, DocumentType::Csv, Some(b';'), "movies.csv").expect("decode");
        assert_eq!(decoded, as_strings(&original));
        let keys: Vec<_> = decoded[0].keys().cloned().collect();
        assert_eq!(keys, vec!["id", "title", "genre"]);
    }

    #[test]
    fn csv_defaults_to_comma_and_handles_quotes() {
        let text = b"id,overview\n1,\"a, b\"\n";
        let decoded =
            decode_documents(text, DocumentType::Csv, None, "quoted.csv").expect("decode");
        assert_eq!(decoded[0]["overview"], json!("a, b"));
    }

    #[test]
    fn csv_ragged_row_is_invalid_document() {
        let text = b"id,title\n1,first\n2\n";
        let error =
            decode_documents(text, DocumentType::Csv, None, "ragged.csv").expect_err("ragged");
        match error {
            DocumentError::InvalidDocument { source_name, .. } => {
                assert!(source_name.starts_with("ragged.csv"), "{source_name}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn csv_duplicate_header_is_invalid_document() {
        let text = b"id,title,title\n1,first,second\n";
        let error = decode_documents(text, DocumentType::Csv, None, "dupes.csv")
            .expect_err("duplicate header");
        match error {
            DocumentError::InvalidDocument {
                source_name,
                reason,
            } => {
                assert_eq!(source_name, "dupes.csv:1");
                assert!(reason.contains("`title`"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bare_object_is_invalid_document() {
        let bytes = serde_json::to_vec(&json!({ "id": 1, "name": "test" })).expect("encode");
        let error =
            decode_documents(&bytes, DocumentType::Json, None, "test.json").expect_err("object");
        match error {
            DocumentError::InvalidDocument {
                source_name,
                reason,
            } => {
                assert_eq!(source_name, "test.json");
                assert!(reason.contains("an object"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ndjson_scalar_line_is_attributed() {
        let text = b"{\"id\": 1}\n42\n";
        let error =
            decode_documents(text, DocumentType::Ndjson, None, "lines.ndjson").expect_err("scalar");
        match error {
            DocumentError::InvalidDocument { source_name, .. } => {
                assert_eq!(source_name, "lines.ndjson:2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bom_is_ignored() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(br#"[{"id": 1}]"#);
        let decoded =
            decode_documents(&bytes, DocumentType::Json, None, "bom.json").expect("decode");
        assert_eq!(decoded.len(), 1);
    }

    #[tokio::test]
    async fn load_documents_reads_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("temp file");
        file.write_all(br#"[{"id": 1}, {"id": 2}]"#).expect("write");

        let decoded = load_documents(file.path(), DocumentType::Json, None)
            .await
            .expect("load");
        assert_eq!(decoded.len(), 2);
    }

    #[tokio::test]
    async fn load_documents_missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = load_documents(&dir.path().join("missing.json"), DocumentType::Json, None)
            .await
            .expect_err("missing");
        assert!(matches!(error, DocumentError::NotFound { .. }));
    }
}
