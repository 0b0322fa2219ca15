//! Metadata Store port
//!
//! The persistence boundary for every domain entity. `drivemesh-cache`
//! implements this trait against SQLite; the core and every other crate
//! depend only on the trait.

use async_trait::async_trait;

use crate::domain::{
    Account, AccountId, Bucket, BucketName, Chunk, DirectoryId, FileId, ObjectKey, RecentEntry,
    StarredEntry, Task, TaskId, TrashEntry, VirtualDirectory, VirtualFile,
};
use crate::domain::object::Object;

#[async_trait]
pub trait MetadataStore: Send + Sync {
    // --- Buckets ---
    async fn create_bucket(&self, bucket: &Bucket) -> anyhow::Result<()>;
    async fn get_bucket(&self, name: &BucketName) -> anyhow::Result<Option<Bucket>>;
    async fn list_buckets(&self) -> anyhow::Result<Vec<Bucket>>;
    async fn update_bucket(&self, bucket: &Bucket) -> anyhow::Result<()>;
    async fn delete_bucket(&self, name: &BucketName) -> anyhow::Result<()>;

    // --- Objects ---
    async fn put_object(&self, object: &Object) -> anyhow::Result<()>;
    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> anyhow::Result<Option<Object>>;
    async fn list_objects(&self, bucket: &BucketName, prefix: Option<&str>) -> anyhow::Result<Vec<Object>>;
    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> anyhow::Result<()>;

    // --- Chunks ---
    async fn put_chunk(&self, chunk: &Chunk) -> anyhow::Result<()>;
    async fn list_chunks(&self, bucket: &BucketName, key: &ObjectKey) -> anyhow::Result<Vec<Chunk>>;
    async fn delete_chunks(&self, bucket: &BucketName, key: &ObjectKey) -> anyhow::Result<()>;

    // --- Accounts ---
    async fn create_account(&self, account: &Account) -> anyhow::Result<()>;
    async fn get_account(&self, id: &AccountId) -> anyhow::Result<Option<Account>>;
    async fn get_account_by_email(&self, email: &str) -> anyhow::Result<Option<Account>>;
    async fn list_accounts(&self) -> anyhow::Result<Vec<Account>>;
    async fn update_account(&self, account: &Account) -> anyhow::Result<()>;
    async fn delete_account(&self, id: &AccountId) -> anyhow::Result<()>;

    // --- VFS: directories ---
    async fn create_directory(&self, dir: &VirtualDirectory) -> anyhow::Result<()>;
    async fn get_directory(&self, id: &DirectoryId) -> anyhow::Result<Option<VirtualDirectory>>;
    async fn get_directory_by_path(&self, path: &str) -> anyhow::Result<Option<VirtualDirectory>>;
    async fn list_child_directories(&self, parent_id: &DirectoryId) -> anyhow::Result<Vec<VirtualDirectory>>;
    async fn update_directory(&self, dir: &VirtualDirectory) -> anyhow::Result<()>;
    async fn delete_directory(&self, id: &DirectoryId) -> anyhow::Result<()>;

    // --- VFS: files ---
    async fn create_file(&self, file: &VirtualFile) -> anyhow::Result<()>;
    async fn get_file(&self, id: &FileId) -> anyhow::Result<Option<VirtualFile>>;
    async fn get_file_by_path(&self, path: &str) -> anyhow::Result<Option<VirtualFile>>;
    async fn list_child_files(&self, parent_id: &DirectoryId) -> anyhow::Result<Vec<VirtualFile>>;
    async fn update_file(&self, file: &VirtualFile) -> anyhow::Result<()>;
    async fn delete_file(&self, id: &FileId) -> anyhow::Result<()>;

    // --- Starred / Trash / Recent ---
    async fn star(&self, entry: &StarredEntry) -> anyhow::Result<()>;
    async fn unstar(&self, node_id: &str) -> anyhow::Result<()>;
    async fn list_starred(&self) -> anyhow::Result<Vec<StarredEntry>>;

    async fn trash(&self, entry: &TrashEntry) -> anyhow::Result<()>;
    async fn list_trash(&self) -> anyhow::Result<Vec<TrashEntry>>;
    async fn remove_from_trash(&self, node_id: &str) -> anyhow::Result<()>;

    async fn record_recent(&self, entry: &RecentEntry) -> anyhow::Result<()>;
    async fn list_recent(&self, limit: u32) -> anyhow::Result<Vec<RecentEntry>>;

    // --- Tasks ---
    async fn create_task(&self, task: &Task) -> anyhow::Result<()>;
    async fn get_task(&self, id: &TaskId) -> anyhow::Result<Option<Task>>;
    async fn update_task(&self, task: &Task) -> anyhow::Result<()>;
}
