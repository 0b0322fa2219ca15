//! Shared test helpers for backend API integration tests
//!
//! Provides wiremock-based mock server setup for the drive API. Each helper
//! mounts the necessary mock endpoints and returns a configured GraphClient
//! pointing at the mock server.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use drivemesh_backend::client::GraphClient;

/// Sets up a mock server with a `/me/drive` quota endpoint and returns a
/// `(MockServer, GraphClient)` tuple.
pub async fn setup_graph_mock() -> (MockServer, GraphClient) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/drive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "drive-test-001",
            "quota": {
                "total": 5368709120_u64,
                "used": 1073741824_u64,
                "remaining": 4294967296_u64
            }
        })))
        .mount(&server)
        .await;

    let client = GraphClient::with_base_url("test-access-token", server.uri());

    (server, client)
}

/// Mounts a file download endpoint for a specific item ID.
pub async fn mount_download(server: &MockServer, item_id: &str, content: &[u8]) {
    let path_str = format!("/me/drive/items/{}/content", item_id);
    Mock::given(method("GET"))
        .and(path(&path_str))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(content.to_vec())
                .append_header("Content-Type", "application/octet-stream"),
        )
        .mount(server)
        .await;
}

/// Mounts a small file upload endpoint that accepts PUT requests.
pub async fn mount_upload_small(
    server: &MockServer,
    remote_path: &str,
    response_id: &str,
    response_name: &str,
) {
    let path_str = format!("/me/drive/root:{}:/content", remote_path);
    Mock::given(method("PUT"))
        .and(path(&path_str))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": response_id,
            "name": response_name,
            "size": 1024,
            "eTag": "\"etag-001\"",
            "parentReference": {
                "id": "parent-001",
                "path": "/drive/root:/Documents"
            }
        })))
        .mount(server)
        .await;
}

/// Mounts a metadata endpoint (`GET /me/drive/items/{id}`) for one item.
pub async fn mount_get_item(server: &MockServer, item_id: &str, size: u64) {
    let path_str = format!("/me/drive/items/{}", item_id);
    Mock::given(method("GET"))
        .and(path(&path_str))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": item_id,
            "size": size,
            "eTag": "\"etag-get\""
        })))
        .mount(server)
        .await;
}
