//! Top-level client: index lifecycle and task tracking.

use crate::client::http::HttpClient;
use crate::client::tasks;
use crate::client::types::{ClientError, Task, TaskInfo, TaskStatus};
use crate::config::Config;
use crate::index::{Index, IndexInfo};
use crate::metrics::{IngestMetrics, MetricsSnapshot};
use futures_util::future::try_join_all;
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Entry point for talking to one search engine.
///
/// Owns the HTTP transport and the ingestion metrics shared by every [`Index`] it hands out.
/// Build it once from an explicit [`Config`] and clone the handles it returns as needed.
#[derive(Clone)]
pub struct Client {
    http: HttpClient,
    metrics: Arc<IngestMetrics>,
    poll_interval: Duration,
    task_timeout: Duration,
    default_batch_size: usize,
}

impl Client {
    /// Construct a client from configuration.
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        Ok(Self {
            http: HttpClient::new(config)?,
            metrics: Arc::new(IngestMetrics::new()),
            poll_interval: config.task_poll_interval(),
            task_timeout: config.task_timeout(),
            default_batch_size: config.default_batch_size,
        })
    }

    /// Underlying transport.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Batch size configured for callers that do not choose one.
    pub fn default_batch_size(&self) -> usize {
        self.default_batch_size
    }

    /// Handle to an index. No request is made.
    pub fn index(&self, uid: impl Into<String>) -> Index {
        Index::new(uid, self.http.clone(), Arc::clone(&self.metrics))
    }

    /// Snapshot of ingestion counters across every index handle of this client.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Enqueue creation of an index.
    pub async fn create_index(
        &self,
        uid: &str,
        primary_key: Option<&str>,
    ) -> Result<TaskInfo, ClientError> {
        let body = json!({ "uid": uid, "primaryKey": primary_key });
        let task: TaskInfo = self.http.post_json("indexes", &[], &body).await?;
        tracing::debug!(
            index = uid,
            task_uid = task.task_uid,
            "Index creation enqueued"
        );
        Ok(task)
    }

    /// Fetch metadata for an index.
    pub async fn get_index(&self, uid: &str) -> Result<IndexInfo, ClientError> {
        self.index(uid).fetch_info().await
    }

    /// Enqueue an update of an index's primary key.
    pub async fn update_index(
        &self,
        uid: &str,
        primary_key: &str,
    ) -> Result<TaskInfo, ClientError> {
        let body = json!({ "primaryKey": primary_key });
        self.http.patch_json(&format!("indexes/{uid}"), &body).await
    }

    /// Enqueue deletion of an index.
    pub async fn delete_index(&self, uid: &str) -> Result<TaskInfo, ClientError> {
        self.http.delete_json(&format!("indexes/{uid}")).await
    }

    /// Delete an index and wait for the outcome; `false` when it did not exist.
    pub async fn delete_index_if_exists(&self, uid: &str) -> Result<bool, ClientError> {
        let task = match self.delete_index(uid).await {
            Ok(task) => task,
            Err(err) if err.status() == Some(StatusCode::NOT_FOUND) => return Ok(false),
            Err(err) => return Err(err),
        };

        let finished = self.wait_for_task(task.task_uid).await?;
        match (finished.status, finished.error) {
            (TaskStatus::Succeeded, _) => Ok(true),
            (_, Some(error)) if error.code.as_deref() == Some("index_not_found") => Ok(false),
            (status, error) => Err(ClientError::Generic(format!(
                "deleting index {uid} ended with status {status:?}: {}",
                error.map(|error| error.message).unwrap_or_default()
            ))),
        }
    }

    /// Fetch a task's current state.
    pub async fn get_task(&self, task_uid: u64) -> Result<Task, ClientError> {
        tasks::get_task(&self.http, task_uid).await
    }

    /// Poll a task until it reaches a terminal status, using the configured interval and timeout.
    pub async fn wait_for_task(&self, task_uid: u64) -> Result<Task, ClientError> {
        tasks::wait_for_task(&self.http, task_uid, self.poll_interval, self.task_timeout).await
    }

    /// Wait on several tasks concurrently; results follow the input order.
    pub async fn wait_for_tasks(&self, handles: &[TaskInfo]) -> Result<Vec<Task>, ClientError> {
        let waits = handles
            .iter()
            .map(|handle| self.wait_for_task(handle.task_uid));
        try_join_all(waits).await
    }
}
