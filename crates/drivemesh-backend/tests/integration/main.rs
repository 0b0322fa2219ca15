//! Integration tests for drivemesh-backend
//!
//! Uses wiremock to simulate the drive API and verifies end-to-end behavior
//! of the GraphClient, GraphBackendClient, and upload operations.

mod common;

mod test_sync_operations;
