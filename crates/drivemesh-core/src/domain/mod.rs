//! Domain entities and business logic
//!
//! This module contains the core domain types for the storage engine:
//! - Newtypes for type-safe identifiers and validated domain values
//! - Account: registered backend accounts and their OAuth/token state
//! - Bucket/Object/Chunk: the object storage model and its placement
//! - VirtualDirectory/VirtualFile: the VFS overlay
//! - Starred/Trash/Recent: VFS side tables
//! - Task: asynchronous VFS/sync/audit operation tracking
//! - Domain-specific error types

pub mod account;
pub mod bucket;
pub mod chunk;
pub mod errors;
pub mod newtypes;
pub mod object;
pub mod task;
pub mod trash;
pub mod vfs;

pub use account::{Account, AccountStatus};
pub use bucket::Bucket;
pub use chunk::{Chunk, ChunkStatus};
pub use errors::{CoreError, DomainError};
pub use newtypes::*;
pub use object::{Object, Placement};
pub use task::{Task, TaskStatus, TaskType};
pub use trash::{RecentEntry, StarredEntry, TrashEntry, TrashedKind, TRASH_RETENTION_DAYS};
pub use vfs::{DirectoryId, FileId, VirtualDirectory, VirtualFile};
