//! DriveMesh Cache - SQLite-backed `MetadataStore`
//!
//! The only crate that knows SQL. Every other crate depends on the
//! `MetadataStore` trait from `drivemesh-core` and is free of any storage
//! detail; this crate's job is to make that trait's contract hold against a
//! real file, with the migrations and connection pooling that entails.

pub mod error;
pub mod pool;
pub mod repository;

pub use error::CacheError;
pub use pool::DatabasePool;
pub use repository::SqliteMetadataStore;
