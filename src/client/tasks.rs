//! Polling helpers for asynchronous engine tasks.

use crate::client::http::HttpClient;
use crate::client::types::{ClientError, Task};
use std::time::Duration;
use tokio::time::Instant;

/// Fetch the current state of a task.
pub async fn get_task(http: &HttpClient, task_uid: u64) -> Result<Task, ClientError> {
    http.get_json(&format!("tasks/{task_uid}"), &[]).await
}

/// Poll a task until it reaches a terminal status.
///
/// Returns the final task resource whether it succeeded, failed, or was canceled; callers
/// inspect [`Task::status`] and [`Task::error`]. Gives up with [`ClientError::TaskTimeout`]
/// once `timeout` has elapsed.
pub async fn wait_for_task(
    http: &HttpClient,
    task_uid: u64,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<Task, ClientError> {
    let started = Instant::now();
    loop {
        let task = get_task(http, task_uid).await?;
        if task.status.is_terminal() {
            tracing::debug!(task_uid, status = ?task.status, "Task reached terminal status");
            return Ok(task);
        }

        let waited = started.elapsed();
        if waited >= timeout {
            return Err(ClientError::TaskTimeout {
                task_uid,
                waited_ms: waited.as_millis() as u64,
            });
        }
        tokio::time::sleep(poll_interval.min(timeout - waited)).await;
    }
}
