use std::{env, fs, sync::Once};

use docfeed::{Client, IngestOptions, TaskInfo, client::TaskStatus, config::Config};
use serde_json::{Value, json};

static INIT: Once = Once::new();

fn set_default_env(key: &str, value: &str) {
    let needs_value = env::var(key).map(|v| v.trim().is_empty()).unwrap_or(true);
    if needs_value {
        // SAFETY: Runs once before any test reads the environment.
        unsafe {
            env::set_var(key, value);
        }
    }
}

fn live_client() -> Client {
    INIT.call_once(|| {
        set_default_env("DOCFEED_URL", "http://127.0.0.1:7700");
        set_default_env("DOCFEED_API_KEY", "masterKey");
        set_default_env("DOCFEED_TASK_TIMEOUT_MS", "30000");
    });
    let config = Config::from_env().expect("live configuration");
    Client::new(&config).expect("client")
}

fn write_movies(path: &std::path::Path, id_start: u64) {
    let movies: Vec<Value> = (id_start..id_start + 50)
        .map(|id| json!({ "id": id, "title": "test", "genre": "test" }))
        .collect();
    fs::write(path, serde_json::to_vec(&movies).expect("encode")).expect("write");
}

async fn settle(client: &Client, tasks: &[TaskInfo]) {
    for task in client.wait_for_tasks(tasks).await.expect("tasks settle") {
        assert_eq!(task.status, TaskStatus::Succeeded, "task failed: {task:?}");
    }
}

async fn fresh_index(client: &Client, uid: &str) {
    client.delete_index_if_exists(uid).await.expect("cleanup");
    let created = client.create_index(uid, Some("id")).await.expect("create");
    settle(client, &[created]).await;
}

#[tokio::test]
#[ignore = "Requires a live search engine"]
async fn live_directory_ingestion_indexes_every_document() {
    let client = live_client();
    let dir = tempfile::tempdir().expect("temp dir");
    write_movies(&dir.path().join("movies1.json"), 0);
    write_movies(&dir.path().join("movies2.json"), 50);

    for (uid, combine) in [
        ("docfeed_live_combined", true),
        ("docfeed_live_separate", false),
    ] {
        fresh_index(&client, uid).await;
        let index = client.index(uid);
        let options = IngestOptions::new().combine_documents(combine);
        let tasks = index
            .add_documents_from_directory(dir.path(), &options)
            .await
            .expect("directory ingestion");
        assert_eq!(tasks.len(), if combine { 1 } else { 2 });
        settle(&client, &tasks).await;

        let stats = index.get_stats().await.expect("stats");
        assert_eq!(stats.number_of_documents, 100, "{uid}");
        client.delete_index_if_exists(uid).await.expect("cleanup");
    }
}

#[tokio::test]
#[ignore = "Requires a live search engine"]
async fn live_raw_csv_upload_with_delimiter() {
    let client = live_client();
    let uid = "docfeed_live_raw";
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("movies.csv");
    fs::write(&path, "id;title\n1;first\n2;second\n").expect("write");

    fresh_index(&client, uid).await;
    let index = client.index(uid);
    let task = index
        .update_documents_from_raw_file(&path, &IngestOptions::new().csv_delimiter(";"))
        .await
        .expect("raw upload");
    settle(&client, &[task]).await;

    let document = index.get_document("2").await.expect("document");
    assert_eq!(document.get("title"), Some(&json!("second")));
    client.delete_index_if_exists(uid).await.expect("cleanup");
}
