//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`BackendClient`] - wire operations against one backend drive (upload/
//!   download/delete/metadata), plus [`AuthFlow`] for OAuth.
//! - [`MetadataStore`] - persistent storage for every domain entity.

pub mod backend_client;
pub mod metadata_store;

pub use backend_client::{
    AuthFlow, AuthorizationRequest, BackendClient, BackendError, ByteRange, DriveInfo, RemoteItem,
    TokenPair,
};
pub use metadata_store::MetadataStore;
