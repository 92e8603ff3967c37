//! Search engine HTTP integration.

pub mod engine;
pub mod http;
pub mod tasks;
pub mod types;

pub use engine::Client;
pub use http::HttpClient;
pub use types::{ClientError, EngineError, Task, TaskInfo, TaskStatus};
