//! Shared in-memory fakes and a ready-to-use [`ObjectEngine`] for this
//! crate's unit tests.

#![cfg(test)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use drivemesh_balancer::{LoadBalancer, Strategy};
use drivemesh_core::domain::newtypes::AccountId;
use drivemesh_core::domain::object::Object;
use drivemesh_core::domain::{
    Account, Bucket, BucketName, Chunk, DirectoryId, Email, FileId, ObjectKey, RecentEntry,
    StarredEntry, Task, TaskId, TrashEntry, VirtualDirectory, VirtualFile,
};
use drivemesh_core::ports::{
    AuthFlow, AuthorizationRequest, BackendClient, BackendError, ByteRange, DriveInfo, MetadataStore,
    RemoteItem, TokenPair,
};
use drivemesh_core::usecases::AccountRegistry;
use drivemesh_engine::ObjectEngine;

pub struct FakeBackend {
    pub blobs: StdMutex<HashMap<String, Vec<u8>>>,
    pub next_id: StdMutex<u64>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            blobs: StdMutex::new(HashMap::new()),
            next_id: StdMutex::new(0),
        }
    }
}

#[async_trait]
impl BackendClient for FakeBackend {
    async fn upload_small(&self, _token: &str, remote_path: &str, content: Vec<u8>) -> Result<RemoteItem, BackendError> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let id = format!("remote-{next_id}");
        let size = content.len() as u64;
        self.blobs.lock().unwrap().insert(id.clone(), content);
        Ok(RemoteItem { remote_id: id, remote_path: remote_path.to_string(), size, etag: "\"e\"".into() })
    }

    async fn create_upload_session(&self, _: &str, _: &str, _: u64) -> Result<String, BackendError> {
        unimplemented!("not exercised by these tests")
    }

    async fn upload_session_part(&self, _: &str, _: ByteRange, _: u64, _: Vec<u8>) -> Result<Option<RemoteItem>, BackendError> {
        unimplemented!("not exercised by these tests")
    }

    async fn download(&self, _token: &str, remote_id: &str, _range: Option<ByteRange>) -> Result<Vec<u8>, BackendError> {
        self.blobs
            .lock()
            .unwrap()
            .get(remote_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(remote_id.to_string()))
    }

    async fn delete(&self, _token: &str, remote_id: &str) -> Result<(), BackendError> {
        self.blobs.lock().unwrap().remove(remote_id);
        Ok(())
    }

    async fn get_item(&self, _: &str, _: &str) -> Result<RemoteItem, BackendError> {
        unimplemented!("not exercised by these tests")
    }

    async fn get_thumbnail(&self, _: &str, _: &str) -> Result<Vec<u8>, BackendError> {
        unimplemented!("not exercised by these tests")
    }

    async fn get_drive(&self, _: &str) -> Result<DriveInfo, BackendError> {
        unimplemented!("not exercised by these tests")
    }
}

pub struct NoopAuth;

#[async_trait]
impl AuthFlow for NoopAuth {
    fn authorization_url(&self, _: &str, _: &str, _: &str) -> AuthorizationRequest {
        unimplemented!("not exercised by these tests")
    }
    async fn exchange_code(&self, _: &str, _: &str, _: &str, _: &str, _: &str, _: &str) -> anyhow::Result<TokenPair> {
        unimplemented!("not exercised by these tests")
    }
    async fn refresh(&self, _: &str, _: &str, _: &str, _: &str) -> anyhow::Result<TokenPair> {
        unimplemented!("not exercised by these tests")
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub accounts: StdMutex<HashMap<AccountId, Account>>,
    pub buckets: StdMutex<HashMap<BucketName, Bucket>>,
    pub objects: StdMutex<HashMap<(BucketName, ObjectKey), Object>>,
    pub chunks: StdMutex<HashMap<(BucketName, ObjectKey), Vec<Chunk>>>,
    pub directories: StdMutex<HashMap<DirectoryId, VirtualDirectory>>,
    pub files: StdMutex<HashMap<FileId, VirtualFile>>,
    pub starred: StdMutex<HashMap<String, StarredEntry>>,
    pub trash: StdMutex<HashMap<String, TrashEntry>>,
    pub recent: StdMutex<Vec<RecentEntry>>,
    pub tasks: StdMutex<HashMap<TaskId, Task>>,
}

impl FakeStore {
    pub fn new() -> Self {
        let mut directories = HashMap::new();
        let root = VirtualDirectory::new_root();
        directories.insert(root.id().clone(), root);
        Self {
            directories: StdMutex::new(directories),
            ..Default::default()
        }
    }

    pub fn with_bucket(self, bucket: Bucket) -> Self {
        self.buckets.lock().unwrap().insert(bucket.name().clone(), bucket);
        self
    }

    pub fn with_account(self, account: Account) -> Self {
        self.accounts.lock().unwrap().insert(*account.id(), account);
        self
    }
}

#[async_trait]
impl MetadataStore for FakeStore {
    async fn create_bucket(&self, bucket: &Bucket) -> anyhow::Result<()> {
        self.buckets.lock().unwrap().insert(bucket.name().clone(), bucket.clone());
        Ok(())
    }
    async fn get_bucket(&self, name: &BucketName) -> anyhow::Result<Option<Bucket>> {
        Ok(self.buckets.lock().unwrap().get(name).cloned())
    }
    async fn list_buckets(&self) -> anyhow::Result<Vec<Bucket>> {
        Ok(self.buckets.lock().unwrap().values().cloned().collect())
    }
    async fn update_bucket(&self, bucket: &Bucket) -> anyhow::Result<()> {
        self.buckets.lock().unwrap().insert(bucket.name().clone(), bucket.clone());
        Ok(())
    }
    async fn delete_bucket(&self, name: &BucketName) -> anyhow::Result<()> {
        self.buckets.lock().unwrap().remove(name);
        Ok(())
    }

    async fn put_object(&self, object: &Object) -> anyhow::Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert((object.bucket().clone(), object.key().clone()), object.clone());
        Ok(())
    }
    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> anyhow::Result<Option<Object>> {
        Ok(self.objects.lock().unwrap().get(&(bucket.clone(), key.clone())).cloned())
    }
    async fn list_objects(&self, bucket: &BucketName, prefix: Option<&str>) -> anyhow::Result<Vec<Object>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.bucket() == bucket)
            .filter(|o| prefix.map(|p| o.key().as_str().starts_with(p)).unwrap_or(true))
            .cloned()
            .collect())
    }
    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(&(bucket.clone(), key.clone()));
        Ok(())
    }

    async fn put_chunk(&self, chunk: &Chunk) -> anyhow::Result<()> {
        let mut chunks = self.chunks.lock().unwrap();
        let entry = chunks.entry((chunk.bucket().clone(), chunk.key().clone())).or_default();
        entry.retain(|c| c.chunk_index() != chunk.chunk_index());
        entry.push(chunk.clone());
        Ok(())
    }
    async fn list_chunks(&self, bucket: &BucketName, key: &ObjectKey) -> anyhow::Result<Vec<Chunk>> {
        Ok(self.chunks.lock().unwrap().get(&(bucket.clone(), key.clone())).cloned().unwrap_or_default())
    }
    async fn delete_chunks(&self, bucket: &BucketName, key: &ObjectKey) -> anyhow::Result<()> {
        self.chunks.lock().unwrap().remove(&(bucket.clone(), key.clone()));
        Ok(())
    }

    async fn create_account(&self, account: &Account) -> anyhow::Result<()> {
        self.accounts.lock().unwrap().insert(*account.id(), account.clone());
        Ok(())
    }
    async fn get_account(&self, id: &AccountId) -> anyhow::Result<Option<Account>> {
        Ok(self.accounts.lock().unwrap().get(id).cloned())
    }
    async fn get_account_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        Ok(self.accounts.lock().unwrap().values().find(|a| a.email().as_str() == email).cloned())
    }
    async fn list_accounts(&self) -> anyhow::Result<Vec<Account>> {
        Ok(self.accounts.lock().unwrap().values().cloned().collect())
    }
    async fn update_account(&self, account: &Account) -> anyhow::Result<()> {
        self.accounts.lock().unwrap().insert(*account.id(), account.clone());
        Ok(())
    }
    async fn delete_account(&self, id: &AccountId) -> anyhow::Result<()> {
        self.accounts.lock().unwrap().remove(id);
        Ok(())
    }

    async fn create_directory(&self, dir: &VirtualDirectory) -> anyhow::Result<()> {
        self.directories.lock().unwrap().insert(dir.id().clone(), dir.clone());
        Ok(())
    }
    async fn get_directory(&self, id: &DirectoryId) -> anyhow::Result<Option<VirtualDirectory>> {
        Ok(self.directories.lock().unwrap().get(id).cloned())
    }
    async fn get_directory_by_path(&self, path: &str) -> anyhow::Result<Option<VirtualDirectory>> {
        Ok(self.directories.lock().unwrap().values().find(|d| d.path().as_str() == path).cloned())
    }
    async fn list_child_directories(&self, parent_id: &DirectoryId) -> anyhow::Result<Vec<VirtualDirectory>> {
        Ok(self
            .directories
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.parent_id() == Some(parent_id))
            .cloned()
            .collect())
    }
    async fn update_directory(&self, dir: &VirtualDirectory) -> anyhow::Result<()> {
        self.directories.lock().unwrap().insert(dir.id().clone(), dir.clone());
        Ok(())
    }
    async fn delete_directory(&self, id: &DirectoryId) -> anyhow::Result<()> {
        self.directories.lock().unwrap().remove(id);
        Ok(())
    }

    async fn create_file(&self, file: &VirtualFile) -> anyhow::Result<()> {
        self.files.lock().unwrap().insert(file.id().clone(), file.clone());
        Ok(())
    }
    async fn get_file(&self, id: &FileId) -> anyhow::Result<Option<VirtualFile>> {
        Ok(self.files.lock().unwrap().get(id).cloned())
    }
    async fn get_file_by_path(&self, path: &str) -> anyhow::Result<Option<VirtualFile>> {
        Ok(self.files.lock().unwrap().values().find(|f| f.path().as_str() == path).cloned())
    }
    async fn list_child_files(&self, parent_id: &DirectoryId) -> anyhow::Result<Vec<VirtualFile>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.parent_id() == parent_id)
            .cloned()
            .collect())
    }
    async fn update_file(&self, file: &VirtualFile) -> anyhow::Result<()> {
        self.files.lock().unwrap().insert(file.id().clone(), file.clone());
        Ok(())
    }
    async fn delete_file(&self, id: &FileId) -> anyhow::Result<()> {
        self.files.lock().unwrap().remove(id);
        Ok(())
    }

    async fn star(&self, entry: &StarredEntry) -> anyhow::Result<()> {
        self.starred.lock().unwrap().insert(entry.node_id().to_string(), entry.clone());
        Ok(())
    }
    async fn unstar(&self, node_id: &str) -> anyhow::Result<()> {
        self.starred.lock().unwrap().remove(node_id);
        Ok(())
    }
    async fn list_starred(&self) -> anyhow::Result<Vec<StarredEntry>> {
        Ok(self.starred.lock().unwrap().values().cloned().collect())
    }

    async fn trash(&self, entry: &TrashEntry) -> anyhow::Result<()> {
        self.trash.lock().unwrap().insert(entry.node_id().to_string(), entry.clone());
        Ok(())
    }
    async fn list_trash(&self) -> anyhow::Result<Vec<TrashEntry>> {
        Ok(self.trash.lock().unwrap().values().cloned().collect())
    }
    async fn remove_from_trash(&self, node_id: &str) -> anyhow::Result<()> {
        self.trash.lock().unwrap().remove(node_id);
        Ok(())
    }

    async fn record_recent(&self, entry: &RecentEntry) -> anyhow::Result<()> {
        let mut recent = self.recent.lock().unwrap();
        recent.retain(|e| e.file_id() != entry.file_id());
        recent.push(entry.clone());
        Ok(())
    }
    async fn list_recent(&self, limit: u32) -> anyhow::Result<Vec<RecentEntry>> {
        let mut recent = self.recent.lock().unwrap().clone();
        recent.sort_by(|a, b| b.accessed_at().cmp(&a.accessed_at()));
        recent.truncate(limit as usize);
        Ok(recent)
    }

    async fn create_task(&self, task: &Task) -> anyhow::Result<()> {
        self.tasks.lock().unwrap().insert(task.id().clone(), task.clone());
        Ok(())
    }
    async fn get_task(&self, id: &TaskId) -> anyhow::Result<Option<Task>> {
        Ok(self.tasks.lock().unwrap().get(id).cloned())
    }
    async fn update_task(&self, task: &Task) -> anyhow::Result<()> {
        self.tasks.lock().unwrap().insert(task.id().clone(), task.clone());
        Ok(())
    }
}

pub fn active_account(priority: u32) -> Account {
    let mut account = Account::new(
        "Test",
        Email::new(format!("acct-{priority}@example.com")).unwrap(),
        "cid",
        "secret",
        "tenant",
        priority,
    );
    account.set_tokens("tok", "refresh", chrono::Utc::now() + chrono::Duration::hours(1));
    account.update_quota(0, 1_000_000_000);
    account
}

/// Builds an [`ObjectEngine`] wired to a fresh [`FakeBackend`] over the
/// given store, with no chunk threshold (everything goes through the
/// small-object path) and no local fallback.
pub fn object_engine(store: Arc<dyn MetadataStore>) -> Arc<ObjectEngine> {
    let backend: Arc<dyn BackendClient> = Arc::new(FakeBackend::new());
    let registry = Arc::new(AccountRegistry::new(store.clone(), Arc::new(NoopAuth)));
    let balancer = Arc::new(LoadBalancer::new(Strategy::LeastUsed));
    Arc::new(ObjectEngine::new(store, backend, registry, balancer, 1 << 30, 1 << 20, None::<PathBuf>))
}
