//! Document additions and updates: from memory, files, raw files, and directories.
//!
//! Every operation validates its parameters before touching the filesystem or the network,
//! decodes sources before sending anything derived from them, and returns task handles in the
//! order their batches were built. Requests belonging to one call are dispatched concurrently.

use crate::client::TaskInfo;
use crate::documents::{
    Document, DocumentError, DocumentType, IngestError, IngestOptions, Intent, Operation,
    RawUpload, Source, SourceFile, UnitFailure, combine, discover_files, load_documents,
    partition, validate_batch_size,
};
use crate::index::Index;
use futures_util::future::{join_all, try_join_all};
use std::path::Path;

impl Index {
    /// Add a collection in one request.
    pub async fn add_documents(
        &self,
        documents: &[Document],
        primary_key: Option<&str>,
    ) -> Result<TaskInfo, IngestError> {
        self.submit_collection(Intent::Add, documents, primary_key).await
    }

    /// Add a collection split into batches of at most `batch_size` documents.
    pub async fn add_documents_in_batches(
        &self,
        documents: &[Document],
        batch_size: usize,
        primary_key: Option<&str>,
    ) -> Result<Vec<TaskInfo>, IngestError> {
        self.submit_collection_in_batches(Intent::Add, documents, batch_size, primary_key).await
    }

    /// Decode a file and add its documents in one request.
    pub async fn add_documents_from_file(
        &self,
        path: impl AsRef<Path>,
        options: &IngestOptions,
    ) -> Result<TaskInfo, IngestError> {
        self.submit_file(Intent::Add, path.as_ref(), options).await
    }

    /// Decode a file and add its documents in batches.
    pub async fn add_documents_from_file_in_batches(
        &self,
        path: impl AsRef<Path>,
        batch_size: usize,
        options: &IngestOptions,
    ) -> Result<Vec<TaskInfo>, IngestError> {
        self.submit_file_in_batches(Intent::Add, path.as_ref(), batch_size, options).await
    }

    /// Stream a file to the engine undecoded.
    pub async fn add_documents_from_raw_file(
        &self,
        path: impl AsRef<Path>,
        options: &IngestOptions,
    ) -> Result<TaskInfo, IngestError> {
        self.submit_raw_file(Intent::Add, path.as_ref(), options).await
    }

    /// Add every matching file of a directory.
    pub async fn add_documents_from_directory(
        &self,
        dir: impl AsRef<Path>,
        options: &IngestOptions,
    ) -> Result<Vec<TaskInfo>, IngestError> {
        self.submit_directory(Intent::Add, dir.as_ref(), None, options).await
    }

    /// Add every matching file of a directory in batches.
    pub async fn add_documents_from_directory_in_batches(
        &self,
        dir: impl AsRef<Path>,
        batch_size: usize,
        options: &IngestOptions,
    ) -> Result<Vec<TaskInfo>, IngestError> {
        self.submit_directory(Intent::Add, dir.as_ref(), Some(batch_size), options).await
    }

    /// Add or replace a collection in one request.
    pub async fn update_documents(
        &self,
        documents: &[Document],
        primary_key: Option<&str>,
    ) -> Result<TaskInfo, IngestError> {
        self.submit_collection(Intent::Update, documents, primary_key).await
    }

    /// Add or replace a collection in batches.
    pub async fn update_documents_in_batches(
        &self,
        documents: &[Document],
        batch_size: usize,
        primary_key: Option<&str>,
    ) -> Result<Vec<TaskInfo>, IngestError> {
        self.submit_collection_in_batches(Intent::Update, documents, batch_size, primary_key).await
    }

    /// Decode a file and add or replace its documents in one request.
    pub async fn update_documents_from_file(
        &self,
        path: impl AsRef<Path>,
        options: &IngestOptions,
    ) -> Result<TaskInfo, IngestError> {
        self.submit_file(Intent::Update, path.as_ref(), options).await
    }

    /// Decode a file and add or replace its documents in batches.
    pub async fn update_documents_from_file_in_batches(
        &self,
        path: impl AsRef<Path>,
        batch_size: usize,
        options: &IngestOptions,
    ) -> Result<Vec<TaskInfo>, IngestError> {
        self.submit_file_in_batches(Intent::Update, path.as_ref(), batch_size, options).await
    }

    /// Stream a file to the engine undecoded, replacing existing documents.
    pub async fn update_documents_from_raw_file(
        &self,
        path: impl AsRef<Path>,
        options: &IngestOptions,
    ) -> Result<TaskInfo, IngestError> {
        self.submit_raw_file(Intent::Update, path.as_ref(), options).await
    }

    /// Add or replace every matching file of a directory.
    pub async fn update_documents_from_directory(
        &self,
        dir: impl AsRef<Path>,
        options: &IngestOptions,
    ) -> Result<Vec<TaskInfo>, IngestError> {
        self.submit_directory(Intent::Update, dir.as_ref(), None, options).await
    }

    /// Add or replace every matching file of a directory in batches.
    pub async fn update_documents_from_directory_in_batches(
        &self,
        dir: impl AsRef<Path>,
        batch_size: usize,
        options: &IngestOptions,
    ) -> Result<Vec<TaskInfo>, IngestError> {
        self.submit_directory(Intent::Update, dir.as_ref(), Some(batch_size), options).await
    }

    async fn submit_collection(
        &self,
        intent: Intent,
        documents: &[Document],
        primary_key: Option<&str>,
    ) -> Result<TaskInfo, IngestError> {
        let operation = Operation::new(intent, Source::Collection);
        let task = self
            .send_documents(intent, documents, primary_key)
            .await
            .map_err(|err| IngestError::new(operation, err))?;
        self.log_completed(operation, documents.len(), std::slice::from_ref(&task));
        Ok(task)
    }

    async fn submit_collection_in_batches(
        &self,
        intent: Intent,
        documents: &[Document],
        batch_size: usize,
        primary_key: Option<&str>,
    ) -> Result<Vec<TaskInfo>, IngestError> {
        let operation = Operation::new(intent, Source::CollectionInBatches);
        let tasks = self
            .send_in_batches(intent, documents, batch_size, primary_key)
            .await
            .map_err(|err| IngestError::new(operation, err))?;
        self.log_completed(operation, documents.len(), &tasks);
        Ok(tasks)
    }

    async fn submit_file(
        &self,
        intent: Intent,
        path: &Path,
        options: &IngestOptions,
    ) -> Result<TaskInfo, IngestError> {
        let operation = Operation::new(intent, Source::File);
        let fail = move |err: DocumentError| IngestError::new(operation, err);

        let documents = read_file(path, options).await.map_err(fail)?;
        let task = self
            .send_documents(intent, &documents, options.primary_key.as_deref())
            .await
            .map_err(|err| fail(err.attributed_to(path)))?;
        self.log_completed(operation, documents.len(), std::slice::from_ref(&task));
        Ok(task)
    }

    async fn submit_file_in_batches(
        &self,
        intent: Intent,
        path: &Path,
        batch_size: usize,
        options: &IngestOptions,
    ) -> Result<Vec<TaskInfo>, IngestError> {
        let operation = Operation::new(intent, Source::FileInBatches);
        let fail = move |err: DocumentError| IngestError::new(operation, err);

        validate_batch_size(batch_size).map_err(fail)?;
        let documents = read_file(path, options).await.map_err(fail)?;
        let primary_key = options.primary_key.as_deref();
        let tasks = self
            .send_in_batches(intent, &documents, batch_size, primary_key)
            .await
            .map_err(|err| fail(err.attributed_to(path)))?;
        self.log_completed(operation, documents.len(), &tasks);
        Ok(tasks)
    }

    async fn submit_raw_file(
        &self,
        intent: Intent,
        path: &Path,
        options: &IngestOptions,
    ) -> Result<TaskInfo, IngestError> {
        let operation = Operation::new(intent, Source::RawFile);
        let fail = move |err: DocumentError| IngestError::new(operation, err);

        let delimiter = options.csv_delimiter.as_deref();
        let upload = RawUpload::prepare(path, options.document_type, delimiter).map_err(fail)?;
        let (body, bytes) = upload.open().await.map_err(fail)?;
        let query = upload.query(options.primary_key.as_deref());
        let endpoint = self.path("/documents");
        let content_type = upload.content_type();

        let sent = self
            .http
            .send_raw::<TaskInfo>(intent.method(), &endpoint, &query, body, content_type)
            .await;
        match sent {
            Ok(task) => {
                self.metrics.record_raw_upload(bytes);
                tracing::info!(
                    index = %self.uid,
                    operation = %operation,
                    path = %path.display(),
                    bytes,
                    task_uid = task.task_uid,
                    "Raw file submitted"
                );
                Ok(task)
            }
            Err(err) => {
                self.metrics.record_failure();
                Err(fail(DocumentError::from(err).attributed_to(path)))
            }
        }
    }

    async fn submit_directory(
        &self,
        intent: Intent,
        dir: &Path,
        batch_size: Option<usize>,
        options: &IngestOptions,
    ) -> Result<Vec<TaskInfo>, IngestError> {
        let source = if batch_size.is_some() {
            Source::DirectoryInBatches
        } else {
            Source::Directory
        };
        let operation = Operation::new(intent, source);
        let fail = move |err: DocumentError| IngestError::new(operation, err);

        if let Some(batch_size) = batch_size {
            validate_batch_size(batch_size).map_err(fail)?;
        }
        let delimiter = options.delimiter_for(options.document_type).map_err(fail)?;
        let files = discover_files(dir, options.document_type)
            .await
            .map_err(fail)?;
        let primary_key = options.primary_key.as_deref();

        let tasks = if options.combine_documents {
            let loads = files
                .iter()
                .map(|file| load_documents(&file.path, file.document_type, delimiter));
            let collections = try_join_all(loads).await.map_err(fail)?;
            let documents = combine(collections);
            tracing::debug!(
                index = %self.uid,
                files = files.len(),
                documents = documents.len(),
                "Combined directory sources"
            );
            let origin = match files.as_slice() {
                [file] => file.path.as_path(),
                _ => dir,
            };
            let tasks = self
                .send_unit(intent, &documents, batch_size, primary_key)
                .await
                .map_err(|err| fail(err.attributed_to(origin)))?;
            self.log_completed(operation, documents.len(), &tasks);
            tasks
        } else {
            let ingests = files
                .iter()
                .map(|file| self.ingest_file(intent, file, delimiter, batch_size, primary_key));
            let outcomes = join_all(ingests).await;
            let labelled = files
                .iter()
                .map(|file| file.path.display().to_string())
                .zip(outcomes);
            let tasks = collect_outcomes(labelled).map_err(|err| {
                if let DocumentError::Partial { failures, .. } = &err {
                    tracing::warn!(
                        index = %self.uid,
                        operation = %operation,
                        failed = failures.len(),
                        files = files.len(),
                        "Directory ingestion partially failed"
                    );
                }
                fail(attribute_lone_file(err, &files))
            })?;
            tracing::info!(
                index = %self.uid,
                operation = %operation,
                files = files.len(),
                tasks = tasks.len(),
                "Directory submitted"
            );
            tasks
        };
        Ok(tasks)
    }

    async fn ingest_file(
        &self,
        intent: Intent,
        file: &SourceFile,
        delimiter: Option<u8>,
        batch_size: Option<usize>,
        primary_key: Option<&str>,
    ) -> Result<Vec<TaskInfo>, DocumentError> {
        let documents = load_documents(&file.path, file.document_type, delimiter).await?;
        self.send_unit(intent, &documents, batch_size, primary_key).await
    }

    async fn send_unit(
        &self,
        intent: Intent,
        documents: &[Document],
        batch_size: Option<usize>,
        primary_key: Option<&str>,
    ) -> Result<Vec<TaskInfo>, DocumentError> {
        match batch_size {
            Some(batch_size) => {
                self.send_in_batches(intent, documents, batch_size, primary_key).await
            }
            None => {
                let task = self.send_documents(intent, documents, primary_key).await?;
                Ok(vec![task])
            }
        }
    }

    async fn send_in_batches(
        &self,
        intent: Intent,
        documents: &[Document],
        batch_size: usize,
        primary_key: Option<&str>,
    ) -> Result<Vec<TaskInfo>, DocumentError> {
        let batches: Vec<&[Document]> = partition(documents, batch_size)?.collect();
        let sends = batches
            .iter()
            .map(|batch| self.send_documents(intent, batch, primary_key));
        let outcomes = join_all(sends).await;
        let mut labelled = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            labelled.push((format!("batch {index}"), outcome.map(|task| vec![task])));
        }
        collect_outcomes(labelled)
    }

    async fn send_documents(
        &self,
        intent: Intent,
        documents: &[Document],
        primary_key: Option<&str>,
    ) -> Result<TaskInfo, DocumentError> {
        let query = primary_key_query(primary_key);
        let endpoint = self.path("/documents");
        let sent = self
            .http
            .send_json::<_, TaskInfo>(intent.method(), &endpoint, &query, documents)
            .await;
        match sent {
            Ok(task) => {
                self.metrics.record_batch(documents.len() as u64);
                tracing::debug!(
                    index = %self.uid,
                    documents = documents.len(),
                    task_uid = task.task_uid,
                    "Documents submitted"
                );
                Ok(task)
            }
            Err(err) => {
                self.metrics.record_failure();
                Err(err.into())
            }
        }
    }

    fn log_completed(&self, operation: Operation, documents: usize, tasks: &[TaskInfo]) {
        tracing::info!(
            index = %self.uid,
            operation = %operation,
            documents,
            tasks = tasks.len(),
            "Documents submitted"
        );
    }
}

/// Config checks, then read and decode a single source file.
async fn read_file(path: &Path, options: &IngestOptions) -> Result<Vec<Document>, DocumentError> {
    let document_type = match options.document_type {
        Some(document_type) => document_type,
        None => DocumentType::from_path(path)?,
    };
    let delimiter = options.delimiter_for(Some(document_type))?;
    load_documents(path, document_type, delimiter).await
}

fn primary_key_query(primary_key: Option<&str>) -> Vec<(&'static str, String)> {
    primary_key
        .map(|key| vec![("primaryKey", key.to_string())])
        .unwrap_or_default()
}

/// Name the file behind a client failure that reached the top of a one-file directory run.
///
/// Failures of multi-file runs are already labelled with their file by [`collect_outcomes`].
fn attribute_lone_file(error: DocumentError, files: &[SourceFile]) -> DocumentError {
    match (error, files) {
        (DocumentError::Client(source), [file]) => DocumentError::Remote {
            path: file.path.clone(),
            source,
        },
        (error, _) => error,
    }
}

/// Merge per-unit outcomes, keeping accepted tasks in unit order.
///
/// A lone failing unit reports its own cause; otherwise failures are gathered into
/// [`DocumentError::Partial`] alongside the tasks that were accepted.
fn collect_outcomes<I>(outcomes: I) -> Result<Vec<TaskInfo>, DocumentError>
where
    I: IntoIterator<Item = (String, Result<Vec<TaskInfo>, DocumentError>)>,
{
    let mut units = 0usize;
    let mut submitted = Vec::new();
    let mut failures = Vec::new();

    for (unit, outcome) in outcomes {
        units += 1;
        match outcome {
            Ok(tasks) => submitted.extend(tasks),
            Err(DocumentError::Partial {
                failures: nested,
                submitted: accepted,
            }) => {
                submitted.extend(accepted);
                for failure in nested {
                    failures.push(UnitFailure {
                        unit: format!("{unit} {}", failure.unit),
                        error: failure.error,
                    });
                }
            }
            Err(error) => failures.push(UnitFailure { unit, error }),
        }
    }

    if failures.is_empty() {
        return Ok(submitted);
    }
    if units == 1
        && failures.len() == 1
        && submitted.is_empty()
        && let Some(failure) = failures.pop()
    {
        return Err(failure.error);
    }
    Err(DocumentError::Partial {
        failures,
        submitted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, TaskStatus};
    use reqwest::StatusCode;

    fn task(uid: u64) -> TaskInfo {
        TaskInfo {
            task_uid: uid,
            index_uid: Some("movies".into()),
            status: TaskStatus::Enqueued,
            task_type: "documentAdditionOrUpdate".into(),
            enqueued_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    fn rejected() -> DocumentError {
        DocumentError::Client(ClientError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"message":"bad payload","code":"bad_request","type":"invalid_request"}"#,
        ))
    }

    #[test]
    fn outcomes_keep_unit_order() {
        let tasks = collect_outcomes(vec![
            ("a".to_string(), Ok(vec![task(3)])),
            ("b".to_string(), Ok(vec![task(1), task(2)])),
        ])
        .expect("all accepted");
        let uids: Vec<_> = tasks.iter().map(|task| task.task_uid).collect();
        assert_eq!(uids, vec![3, 1, 2]);
    }

    #[test]
    fn single_failure_is_reported_directly() {
        let outcomes = vec![("only".to_string(), Err(rejected()))];
        let error = collect_outcomes(outcomes).expect_err("failed");
        assert!(matches!(error, DocumentError::Client(ClientError::Api { .. })));
    }

    #[test]
    fn mixed_outcomes_become_partial() {
        let nested = DocumentError::Partial {
            failures: vec![UnitFailure {
                unit: "batch 1".into(),
                error: rejected(),
            }],
            submitted: vec![task(9)],
        };
        let invalid = DocumentError::invalid("b.json", "not an array");
        let error = collect_outcomes(vec![
            ("a.json".to_string(), Ok(vec![task(1)])),
            ("b.json".to_string(), Err(invalid)),
            ("c.json".to_string(), Err(nested)),
        ])
        .expect_err("partial");

        match error {
            DocumentError::Partial {
                failures,
                submitted,
            } => {
                let units: Vec<_> = failures
                    .iter()
                    .map(|failure| failure.unit.as_str())
                    .collect();
                assert_eq!(units, vec!["b.json", "c.json batch 1"]);
                let uids: Vec<_> = submitted.iter().map(|task| task.task_uid).collect();
                assert_eq!(uids, vec![1, 9]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn lone_file_failure_names_the_file() {
        let files = vec![SourceFile {
            path: "data/movies.json".into(),
            document_type: DocumentType::Json,
        }];
        let error = attribute_lone_file(rejected(), &files);
        let message = error.to_string();
        assert!(message.starts_with("data/movies.json: "), "{message}");

        let two = vec![files[0].clone(), files[0].clone()];
        let error = attribute_lone_file(rejected(), &two);
        assert!(matches!(error, DocumentError::Client(_)));
    }

    #[test]
    fn no_units_is_empty_success() {
        let none: Vec<(String, Result<Vec<TaskInfo>, DocumentError>)> = Vec::new();
        assert!(collect_outcomes(none).expect("empty").is_empty());
    }
}
