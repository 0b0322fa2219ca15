//! Core domain logic for the storage engine.
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Account`, `Bucket`, `Object`, `Chunk`, `VirtualDirectory`,
//!   `VirtualFile`, `Task`, and the VFS side tables (`TrashEntry`, `StarredEntry`,
//!   `RecentEntry`)
//! - **Use cases** - `AccountRegistry`, orchestrating account selection and token
//!   refresh ahead of every backend call
//! - **Port definitions** - Traits for adapters: `BackendClient`, `AuthFlow`, `MetadataStore`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that adapter crates implement: `drivemesh-backend`
//! implements `BackendClient`/`AuthFlow` against a concrete cloud API, and
//! `drivemesh-cache` implements `MetadataStore` against SQLite. Use cases orchestrate
//! domain entities through port interfaces only, so they stay testable against
//! in-memory fakes.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
