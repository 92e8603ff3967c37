//! Enumeration of source files inside a directory.

use super::types::{DocumentError, DocumentType};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A file selected for ingestion together with the type it will be decoded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Location on disk.
    pub path: PathBuf,
    /// Decoder to use.
    pub document_type: DocumentType,
}

/// List the immediate files of `dir` matching `document_type` (or any supported type).
///
/// Files are returned sorted by name. An empty result is an error.
pub async fn discover_files(
    dir: &Path,
    document_type: Option<DocumentType>,
) -> Result<Vec<SourceFile>, DocumentError> {
    let root = dir.to_path_buf();
    let files = tokio::task::spawn_blocking(move || scan_directory(&root, document_type))
        .await
        .map_err(|err| DocumentError::Io {
            path: dir.to_path_buf(),
            source: std::io::Error::other(err),
        })??;

    if files.is_empty() {
        return Err(DocumentError::NoDocuments {
            path: dir.to_path_buf(),
            document_type,
        });
    }
    tracing::debug!(dir = %dir.display(), files = files.len(), "Discovered source files");
    Ok(files)
}

fn scan_directory(
    root: &Path,
    document_type: Option<DocumentType>,
) -> Result<Vec<SourceFile>, DocumentError> {
    let metadata = std::fs::metadata(root).map_err(|source| DocumentError::io(root, source))?;
    if !metadata.is_dir() {
        return Err(DocumentError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|err| DocumentError::Io {
            path: root.to_path_buf(),
            source: err.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(found) = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(DocumentType::from_extension)
        else {
            continue;
        };
        if document_type.is_some_and(|wanted| wanted != found) {
            continue;
        }

        files.push(SourceFile {
            path: entry.into_path(),
            document_type: found,
        });
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn filters_by_type_and_sorts() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("b.json"), "[]").expect("write");
        fs::write(dir.path().join("a.json"), "[]").expect("write");
        fs::write(dir.path().join("c.csv"), "id\n").expect("write");
        fs::write(dir.path().join("notes.txt"), "ignore me").expect("write");
        fs::create_dir(dir.path().join("nested.json")).expect("mkdir");

        let json_files = discover_files(dir.path(), Some(DocumentType::Json))
            .await
            .expect("json");
        let names: Vec<_> = json_files
            .iter()
            .filter_map(|file| file.path.file_name()?.to_str())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);

        let all = discover_files(dir.path(), None).await.expect("all");
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].document_type, DocumentType::Csv);
    }

    #[tokio::test]
    async fn no_matching_files_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("test.txt"), "nothing").expect("write");

        let error = discover_files(dir.path(), None).await.expect_err("empty");
        assert!(matches!(error, DocumentError::NoDocuments { document_type: None, .. }));
    }

    #[tokio::test]
    async fn missing_directory_is_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let error = discover_files(&dir.path().join("absent"), None)
            .await
            .expect_err("missing");
        assert!(matches!(error, DocumentError::NotFound { .. }));

        let file = dir.path().join("file.json");
        fs::write(&file, "[]").expect("write");
        let error = discover_files(&file, None).await.expect_err("file");
        assert!(matches!(error, DocumentError::NotADirectory { .. }));
    }
}
