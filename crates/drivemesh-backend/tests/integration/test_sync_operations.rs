//! Integration tests for upload/download operations against the drive API
//!
//! Verifies end-to-end behavior of file upload and download operations
//! against a wiremock-based mock server.

use drivemesh_backend::{client::GraphClient, provider::GraphBackendClient, upload};
use drivemesh_core::ports::BackendClient;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::common;

// ============================================================================
// Download tests
// ============================================================================

#[tokio::test]
async fn download_file_returns_content() {
    let (server, client) = common::setup_graph_mock().await;

    let file_content = b"Hello, world! This is test content.";
    common::mount_download(&server, "download-001", file_content).await;

    let data = client
        .download_file("download-001", None)
        .await
        .expect("download failed");

    assert_eq!(data, file_content);
}

#[tokio::test]
async fn download_large_file() {
    let (server, client) = common::setup_graph_mock().await;

    let file_content: Vec<u8> = (0..1_048_576).map(|i| (i % 256) as u8).collect();
    common::mount_download(&server, "large-001", &file_content).await;

    let data = client
        .download_file("large-001", None)
        .await
        .expect("large download failed");

    assert_eq!(data.len(), 1_048_576);
    assert_eq!(data, file_content);
}

#[tokio::test]
async fn download_empty_file() {
    let (server, client) = common::setup_graph_mock().await;

    common::mount_download(&server, "empty-001", &[]).await;

    let data = client
        .download_file("empty-001", None)
        .await
        .expect("empty download failed");

    assert!(data.is_empty());
}

#[tokio::test]
async fn download_returns_error_on_404() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/drive/items/nonexistent/content"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"code": "itemNotFound", "message": "Item not found"}
        })))
        .mount(&server)
        .await;

    let client = GraphClient::with_base_url("test-token", server.uri());
    let result = client.download_file("nonexistent", None).await;
    assert!(result.is_err());
}

// ============================================================================
// Upload tests
// ============================================================================

#[tokio::test]
async fn upload_small_object() {
    let (server, client) = common::setup_graph_mock().await;

    common::mount_upload_small(&server, "/Documents/test.txt", "upload-001", "test.txt").await;

    let data = b"Small file content for upload test".to_vec();
    let result = upload::upload_small(&client, "/Documents/test.txt", data)
        .await
        .expect("small upload failed");

    assert_eq!(result.remote_id, "upload-001");
    assert_eq!(result.size, 1024);
    assert_eq!(result.etag, "\"etag-001\"");
}

// ============================================================================
// BackendClient trait-level tests
// ============================================================================

#[tokio::test]
async fn backend_client_get_item_returns_remote_item() {
    let server = MockServer::start().await;
    common::mount_get_item(&server, "item-001", 2048).await;

    let client = GraphClient::with_base_url("placeholder", server.uri());
    let backend = GraphBackendClient::new(client);

    let item = backend
        .get_item("test-access-token", "item-001")
        .await
        .expect("get_item failed");

    assert_eq!(item.remote_id, "item-001");
    assert_eq!(item.size, 2048);
}

#[tokio::test]
async fn backend_client_get_item_returns_not_found_on_404() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/drive/items/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = GraphClient::with_base_url("placeholder", server.uri());
    let backend = GraphBackendClient::new(client);

    let result = backend.get_item("token", "missing").await;
    assert!(matches!(
        result,
        Err(drivemesh_core::ports::BackendError::NotFound(_))
    ));
}

#[tokio::test]
async fn backend_client_get_drive_maps_quota_fields() {
    let (server, client) = common::setup_graph_mock().await;
    let _ = &server;
    let backend = GraphBackendClient::new(client);

    let info = backend.get_drive("test-access-token").await.expect("get_drive failed");
    assert_eq!(info.total_space, 5_368_709_120);
    assert_eq!(info.used_space, 1_073_741_824);
}
