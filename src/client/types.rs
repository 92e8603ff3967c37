//! Shared types used by the HTTP client and task helpers.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with the search engine.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid search engine URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Response body could not be decoded into the expected shape.
    #[error("Failed to decode engine response: {0}")]
    Json(#[from] serde_json::Error),
    /// Engine answered with a non-success status.
    #[error("Search engine rejected the request ({status}): {message}")]
    Api {
        /// HTTP status returned by the engine.
        status: StatusCode,
        /// Human readable message from the engine's error payload.
        message: String,
        /// Machine readable error code, when the payload carried one.
        code: Option<String>,
        /// Error category reported by the engine (`invalid_request`, `internal`, ...).
        error_type: Option<String>,
        /// Documentation link attached to the error.
        link: Option<String>,
    },
    /// A task did not reach a terminal status in time.
    #[error("Task {task_uid} did not finish within {waited_ms} ms")]
    TaskTimeout {
        /// Identifier of the task being awaited.
        task_uid: u64,
        /// Time spent polling before giving up.
        waited_ms: u64,
    },
    /// Unexpected failure that fits no other category.
    #[error("{0}")]
    Generic(String),
}

impl ClientError {
    /// Build an [`ClientError::Api`] from a status and raw response body.
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<EngineError>(body) {
            Ok(payload) => Self::Api {
                status,
                message: payload.message,
                code: payload.code,
                error_type: payload.error_type,
                link: payload.link,
            },
            Err(_) => Self::Api {
                status,
                message: body.trim().to_string(),
                code: None,
                error_type: None,
                link: None,
            },
        }
    }

    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(err) => err.status(),
            _ => None,
        }
    }

    /// Whether repeating the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_connect() || err.is_timeout(),
            Self::Api { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

/// Error payload used by the engine for failed requests and failed tasks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineError {
    /// Human readable description.
    pub message: String,
    /// Machine readable code.
    #[serde(default)]
    pub code: Option<String>,
    /// Error category.
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
    /// Documentation link.
    #[serde(default)]
    pub link: Option<String>,
}

/// Lifecycle state of an asynchronous task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepted and waiting in the queue.
    Enqueued,
    /// Currently being applied.
    Processing,
    /// Finished successfully.
    Succeeded,
    /// Finished with an error.
    Failed,
    /// Canceled before completion.
    Canceled,
}

impl TaskStatus {
    /// Whether the task will no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// Handle returned by every mutating call, identifying the enqueued task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    /// Engine-assigned task identifier.
    pub task_uid: u64,
    /// Index the task applies to, absent for global tasks.
    #[serde(default)]
    pub index_uid: Option<String>,
    /// Status at enqueue time.
    pub status: TaskStatus,
    /// Task kind (`documentAdditionOrUpdate`, `indexCreation`, ...).
    #[serde(rename = "type")]
    pub task_type: String,
    /// RFC3339 enqueue timestamp.
    pub enqueued_at: String,
}

/// Full task resource as reported by `GET /tasks/{uid}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Engine-assigned task identifier.
    pub uid: u64,
    /// Index the task applies to.
    #[serde(default)]
    pub index_uid: Option<String>,
    /// Current status.
    pub status: TaskStatus,
    /// Task kind.
    #[serde(rename = "type")]
    pub task_type: String,
    /// Kind-specific details such as received and indexed document counts.
    #[serde(default)]
    pub details: Option<Map<String, Value>>,
    /// Failure description for failed tasks.
    #[serde(default)]
    pub error: Option<EngineError>,
    /// ISO-8601 processing duration.
    #[serde(default)]
    pub duration: Option<String>,
    /// RFC3339 enqueue timestamp.
    pub enqueued_at: String,
    /// RFC3339 start timestamp.
    #[serde(default)]
    pub started_at: Option<String>,
    /// RFC3339 completion timestamp.
    #[serde(default)]
    pub finished_at: Option<String>,
}
