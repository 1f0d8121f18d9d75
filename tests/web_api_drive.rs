//! Web API Drive Tests
//!
//! Integration tests for the drive endpoints.

use std::sync::Arc;

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use filedrive::blob::MemoryBlobStore;
use filedrive::config::{QuotaConfig, WebConfig};
use filedrive::web::handlers::AppState;
use filedrive::web::router::create_router;
use filedrive::{Database, DriveService};
use serde_json::{json, Value};

/// Create a test server with an in-memory database and blob store.
async fn create_test_server_with_store(
    config: WebConfig,
    quota: QuotaConfig,
) -> (TestServer, Arc<MemoryBlobStore>) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let blobs = Arc::new(MemoryBlobStore::new());
    let drive = DriveService::new(db, blobs.clone(), quota);

    let router = create_router(Arc::new(AppState::new(drive)), &config);
    let server = TestServer::new(router).expect("Failed to create test server");

    (server, blobs)
}

async fn create_test_server_with(config: WebConfig, quota: QuotaConfig) -> TestServer {
    create_test_server_with_store(config, quota).await.0
}

async fn create_test_server() -> TestServer {
    create_test_server_with(WebConfig::default(), QuotaConfig::default()).await
}

fn file_part(name: &str, bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name(name.to_string())
        .mime_type("application/octet-stream")
}

/// Upload a file and return the response data.
///
/// Fields go in the order browser clients send them: `file`, then `parent_id`.
async fn upload_file(server: &TestServer, name: &str, bytes: &[u8], parent: Option<&str>) -> Value {
    let mut form = MultipartForm::new().add_part("file", file_part(name, bytes));
    if let Some(parent) = parent {
        form = form.add_text("parent_id", parent.to_string());
    }

    let response = server.post("/api/upload").multipart(form).await;
    response.assert_status_ok();
    response.json::<Value>()["data"].clone()
}

async fn create_folder(server: &TestServer, name: &str, parent: Option<&str>) -> Value {
    let response = server
        .post("/api/folder")
        .json(&json!({ "name": name, "parent_id": parent }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["data"].clone()
}

async fn browse(server: &TestServer, query: &str) -> Value {
    let response = server.get(&format!("/api/browse{query}")).await;
    response.assert_status_ok();
    response.json::<Value>()["data"].clone()
}

fn names(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect()
}

fn id_of(item: &Value) -> String {
    item["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_upload_and_browse_root() {
    let server = create_test_server().await;

    let file = upload_file(&server, "hello.txt", b"hello", None).await;
    assert_eq!(file["name"], "hello.txt");
    assert_eq!(file["size"], 5);
    assert!(file["parent_id"].is_null());
    assert_eq!(file["is_starred"], false);
    assert!(file.get("storage_key").is_none());

    let listing = browse(&server, "").await;
    assert_eq!(names(&listing["files"]), vec!["hello.txt"]);
    assert!(listing["folders"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_into_folder() {
    let server = create_test_server().await;

    let folder = create_folder(&server, "Photos", None).await;
    let folder_id = id_of(&folder);

    let file = upload_file(&server, "cat.jpg", b"meow", Some(&folder_id)).await;
    assert_eq!(file["parent_id"], folder_id.as_str());

    let inside = browse(&server, &format!("?parent_id={folder_id}")).await;
    assert_eq!(names(&inside["files"]), vec!["cat.jpg"]);

    let root = browse(&server, "?parent_id=null").await;
    assert!(root["files"].as_array().unwrap().is_empty());
    assert_eq!(names(&root["folders"]), vec!["Photos"]);
}

#[tokio::test]
async fn test_upload_file_before_parent_id() {
    let server = create_test_server().await;

    let folder = create_folder(&server, "F", None).await;
    let folder_id = id_of(&folder);

    let form = MultipartForm::new()
        .add_part("file", file_part("b.txt", b"abc"))
        .add_text("parent_id", folder_id.clone());
    let response = server.post("/api/upload").multipart(form).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["parent_id"], folder_id.as_str());

    let inside = browse(&server, &format!("?parent_id={folder_id}")).await;
    assert_eq!(names(&inside["files"]), vec!["b.txt"]);
    let root = browse(&server, "").await;
    assert!(root["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_parent_id_before_file() {
    let server = create_test_server().await;

    let folder = create_folder(&server, "F", None).await;
    let folder_id = id_of(&folder);

    let form = MultipartForm::new()
        .add_text("parent_id", folder_id.clone())
        .add_part("file", file_part("b.txt", b"abc"));
    let response = server.post("/api/upload").multipart(form).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["parent_id"], folder_id.as_str());

    let inside = browse(&server, &format!("?parent_id={folder_id}")).await;
    assert_eq!(names(&inside["files"]), vec!["b.txt"]);
}

#[tokio::test]
async fn test_upload_empty_or_null_parent_is_root() {
    let server = create_test_server().await;

    for (name, parent) in [("empty.txt", ""), ("null.txt", "null")] {
        let file = upload_file(&server, name, b"x", Some(parent)).await;
        assert!(file["parent_id"].is_null());
    }

    let root = browse(&server, "").await;
    assert_eq!(names(&root["files"]), vec!["empty.txt", "null.txt"]);
}

#[tokio::test]
async fn test_upload_invalid_parent_after_file_discards_content() {
    let (server, blobs) =
        create_test_server_with_store(WebConfig::default(), QuotaConfig::default()).await;

    let form = MultipartForm::new()
        .add_part("file", file_part("b.txt", b"abc"))
        .add_text("parent_id", "not-a-uuid");
    let response = server.post("/api/upload").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_FAILED");
    assert!(blobs.is_empty().await);

    let root = browse(&server, "").await;
    assert!(root["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_missing_parent_after_file_discards_content() {
    let (server, blobs) =
        create_test_server_with_store(WebConfig::default(), QuotaConfig::default()).await;

    let form = MultipartForm::new()
        .add_part("file", file_part("b.txt", b"abc"))
        .add_text("parent_id", uuid::Uuid::new_v4().to_string());
    let response = server.post("/api/upload").multipart(form).await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(blobs.is_empty().await);
}

#[tokio::test]
async fn test_upload_two_files_rejected() {
    let (server, blobs) =
        create_test_server_with_store(WebConfig::default(), QuotaConfig::default()).await;

    let form = MultipartForm::new()
        .add_part("file", file_part("one.txt", b"1"))
        .add_part("file", file_part("two.txt", b"2"));
    let response = server.post("/api/upload").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(blobs.is_empty().await);
}

#[tokio::test]
async fn test_upload_without_file() {
    let server = create_test_server().await;

    let form = MultipartForm::new().add_text("parent_id", "");
    let response = server.post("/api/upload").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_upload_to_missing_parent() {
    let server = create_test_server().await;

    let form = MultipartForm::new()
        .add_text("parent_id", uuid::Uuid::new_v4().to_string())
        .add_part("file", file_part("lost.txt", b"lost"));
    let response = server.post("/api/upload").multipart(form).await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_upload_too_large() {
    let config = WebConfig {
        max_upload_size_mb: 1,
        ..Default::default()
    };
    let server = create_test_server_with(config, QuotaConfig::default()).await;

    let form = MultipartForm::new().add_part("file", file_part("big.bin", &vec![0u8; 2 * 1024 * 1024]));
    let response = server.post("/api/upload").multipart(form).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.json::<Value>()["error"]["code"], "PAYLOAD_TOO_LARGE");

    let listing = browse(&server, "").await;
    assert!(listing["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_quota_exceeded() {
    let quota = QuotaConfig {
        limit_bytes: 4,
        enforce: true,
    };
    let server = create_test_server_with(WebConfig::default(), quota).await;

    let form = MultipartForm::new().add_part("file", file_part("five.txt", b"12345"));
    let response = server.post("/api/upload").multipart(form).await;

    response.assert_status(StatusCode::INSUFFICIENT_STORAGE);
    assert_eq!(response.json::<Value>()["error"]["code"], "QUOTA_EXCEEDED");

    let storage = server.get("/api/storage").await.json::<Value>();
    assert_eq!(storage["data"]["used"], 0);
}

#[tokio::test]
async fn test_create_folder_validation() {
    let server = create_test_server().await;

    let response = server
        .post("/api/folder")
        .json(&json!({ "name": "   " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_FAILED");

    let response = server
        .post("/api/folder")
        .json(&json!({ "name": "a/b" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/folder")
        .json(&json!({ "name": "ok", "parent_id": "not-a-uuid" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_rename_file_and_folder() {
    let server = create_test_server().await;

    let file = upload_file(&server, "draft.txt", b"text", None).await;
    let folder = create_folder(&server, "Old", None).await;

    let response = server
        .put(&format!("/api/rename/file/{}", id_of(&file)))
        .json(&json!({ "name": "final.txt" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["name"], "final.txt");

    let response = server
        .put(&format!("/api/rename/folder/{}", id_of(&folder)))
        .json(&json!({ "name": "New" }))
        .await;
    response.assert_status_ok();

    let listing = browse(&server, "").await;
    assert_eq!(names(&listing["files"]), vec!["final.txt"]);
    assert_eq!(names(&listing["folders"]), vec!["New"]);
}

#[tokio::test]
async fn test_rename_errors() {
    let server = create_test_server().await;

    let response = server
        .put(&format!("/api/rename/file/{}", uuid::Uuid::new_v4()))
        .json(&json!({ "name": "x.txt" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server
        .put(&format!("/api/rename/photo/{}", uuid::Uuid::new_v4()))
        .json(&json!({ "name": "x.txt" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .put("/api/rename/file/123")
        .json(&json!({ "name": "x.txt" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_toggle_star() {
    let server = create_test_server().await;

    let file = upload_file(&server, "fav.txt", b"fav", None).await;
    let url = format!("/api/star/file/{}", id_of(&file));

    let response = server.post(&url).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["is_starred"], true);

    let starred = browse(&server, "?view=starred").await;
    assert_eq!(names(&starred["files"]), vec!["fav.txt"]);

    let response = server.post(&url).await;
    assert_eq!(response.json::<Value>()["data"]["is_starred"], false);

    let starred = browse(&server, "?view=starred").await;
    assert!(starred["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_trash_and_restore_folder() {
    let server = create_test_server().await;

    let folder = create_folder(&server, "Work", None).await;
    let folder_id = id_of(&folder);
    upload_file(&server, "report.pdf", b"%PDF-", Some(&folder_id)).await;

    let response = server.delete(&format!("/api/trash/folder/{folder_id}")).await;
    response.assert_status_ok();
    response.assert_json(&json!({ "data": { "status": "ok" } }));

    let root = browse(&server, "").await;
    assert!(root["folders"].as_array().unwrap().is_empty());
    let trash = browse(&server, "?view=trash").await;
    assert_eq!(names(&trash["folders"]), vec!["Work"]);
    assert_eq!(names(&trash["files"]), vec!["report.pdf"]);

    let storage = server.get("/api/storage").await.json::<Value>();
    assert_eq!(storage["data"]["used"], 0);

    let response = server
        .delete(&format!("/api/trash/folder/{folder_id}?restore=true"))
        .await;
    response.assert_status_ok();

    let inside = browse(&server, &format!("?parent_id={folder_id}")).await;
    assert_eq!(names(&inside["files"]), vec!["report.pdf"]);
    let trash = browse(&server, "?view=trash").await;
    assert!(trash["files"].as_array().unwrap().is_empty());
    assert!(trash["folders"].as_array().unwrap().is_empty());

    let storage = server.get("/api/storage").await.json::<Value>();
    assert_eq!(storage["data"]["used"], 5);
}

#[tokio::test]
async fn test_trash_missing_item() {
    let server = create_test_server().await;

    let response = server
        .delete(&format!("/api/trash/file/{}", uuid::Uuid::new_v4()))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_download_inline_and_attachment() {
    let server = create_test_server().await;

    let file = upload_file(&server, "note.txt", b"hello world", None).await;
    let url = format!("/api/file/{}/content", id_of(&file));

    let response = server.get(&url).await;
    response.assert_status_ok();
    response.assert_text("hello world");
    assert_eq!(response.header(CONTENT_DISPOSITION), "inline");
    assert_eq!(response.header(CONTENT_LENGTH), "11");
    assert!(response
        .header(CONTENT_TYPE)
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let response = server.get(&format!("{url}?download=true")).await;
    response.assert_status_ok();
    assert_eq!(
        response.header(CONTENT_DISPOSITION),
        "attachment; filename=\"note.txt\""
    );
    assert_eq!(response.as_bytes().as_ref(), b"hello world");
}

#[tokio::test]
async fn test_download_trashed_file() {
    let server = create_test_server().await;

    let file = upload_file(&server, "gone.txt", b"gone", None).await;
    let id = id_of(&file);
    server.delete(&format!("/api/trash/file/{id}")).await.assert_status_ok();

    let response = server.get(&format!("/api/file/{id}/content")).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recent_view_order() {
    let server = create_test_server().await;

    upload_file(&server, "1.txt", b"1", None).await;
    upload_file(&server, "2.txt", b"2", None).await;
    upload_file(&server, "3.txt", b"3", None).await;

    let recent = browse(&server, "?view=recent").await;
    assert_eq!(names(&recent["files"]), vec!["3.txt", "2.txt", "1.txt"]);

    // Unknown views fall back to browsing the parent.
    let fallback = browse(&server, "?view=everything").await;
    assert_eq!(names(&fallback["files"]), vec!["1.txt", "2.txt", "3.txt"]);
}

#[tokio::test]
async fn test_storage_usage() {
    let quota = QuotaConfig {
        limit_bytes: 1024,
        enforce: false,
    };
    let server = create_test_server_with(WebConfig::default(), quota).await;

    upload_file(&server, "a.bin", &[1u8; 100], None).await;
    upload_file(&server, "b.bin", &[2u8; 24], None).await;

    let response = server.get("/api/storage").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "data": { "used": 124, "limit": 1024 } }));
}
