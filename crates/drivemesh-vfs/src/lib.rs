//! VFS: the hierarchical path overlay on top of the Object Engine, plus
//! its side tables (Trash, Starred, Recent, Search) and the Task Engine
//! that drives recursive directory mutations.

pub mod search;
pub mod social;
pub mod task_engine;
pub mod trash;
pub mod vfs;

#[cfg(test)]
mod test_support;

pub use search::{SearchService, TypeFacet};
pub use social::{RecentService, StarredService};
pub use task_engine::{DeleteDirectoryOutcome, TaskEngine};
pub use trash::TrashService;
pub use vfs::{VfsEntry, VfsService};
