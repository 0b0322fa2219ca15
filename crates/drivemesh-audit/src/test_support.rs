//! Shared in-memory fakes for this crate's unit tests.

#![cfg(test)]

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use drivemesh_core::domain::newtypes::AccountId;
use drivemesh_core::domain::object::Object;
use drivemesh_core::domain::{
    Account, Bucket, BucketName, Chunk, DirectoryId, FileId, ObjectKey, RecentEntry, StarredEntry,
    Task, TaskId, TrashEntry, VirtualDirectory, VirtualFile,
};
use drivemesh_core::ports::{
    AuthFlow, AuthorizationRequest, BackendClient, BackendError, ByteRange, DriveInfo,
    MetadataStore, RemoteItem, TokenPair,
};

/// A backend whose item table is primed up front; `get_item` answers from
/// it directly rather than simulating uploads.
pub struct FakeBackend {
    pub items: StdMutex<HashMap<String, RemoteItem>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            items: StdMutex::new(HashMap::new()),
        }
    }

    pub fn with_item(self, remote_id: &str) -> Self {
        self.items.lock().unwrap().insert(
            remote_id.to_string(),
            RemoteItem {
                remote_id: remote_id.to_string(),
                remote_path: format!("path/{remote_id}"),
                size: 10,
                etag: "\"e\"".into(),
            },
        );
        self
    }
}

#[async_trait]
impl BackendClient for FakeBackend {
    async fn upload_small(&self, _: &str, _: &str, _: Vec<u8>) -> Result<RemoteItem, BackendError> {
        unimplemented!("not exercised by these tests")
    }

    async fn create_upload_session(&self, _: &str, _: &str, _: u64) -> Result<String, BackendError> {
        unimplemented!("not exercised by these tests")
    }

    async fn upload_session_part(&self, _: &str, _: ByteRange, _: u64, _: Vec<u8>) -> Result<Option<RemoteItem>, BackendError> {
        unimplemented!("not exercised by these tests")
    }

    async fn download(&self, _: &str, _: &str, _: Option<ByteRange>) -> Result<Vec<u8>, BackendError> {
        unimplemented!("not exercised by these tests")
    }

    async fn delete(&self, _: &str, _: &str) -> Result<(), BackendError> {
        unimplemented!("not exercised by these tests")
    }

    async fn get_item(&self, _token: &str, remote_id: &str) -> Result<RemoteItem, BackendError> {
        self.items
            .lock()
            .unwrap()
            .get(remote_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(remote_id.to_string()))
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
        unimplemented!("accounts in these tests always carry a fresh token")
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub accounts: StdMutex<HashMap<AccountId, Account>>,
    pub buckets: StdMutex<HashMap<BucketName, Bucket>>,
    pub objects: StdMutex<HashMap<(BucketName, ObjectKey), Object>>,
    pub chunks: StdMutex<HashMap<(BucketName, ObjectKey), Vec<Chunk>>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(self, bucket: Bucket) -> Self {
        self.buckets.lock().unwrap().insert(bucket.name().clone(), bucket);
        self
    }

    pub fn with_account(self, account: Account) -> Self {
        self.accounts.lock().unwrap().insert(*account.id(), account);
        self
    }

    pub fn with_object(self, object: Object) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert((object.bucket().clone(), object.key().clone()), object);
        self
    }

    pub fn with_chunk(self, chunk: Chunk) -> Self {
        self.chunks
            .lock()
            .unwrap()
            .entry((chunk.bucket().clone(), chunk.key().clone()))
            .or_default()
            .push(chunk);
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

    async fn create_directory(&self, _: &VirtualDirectory) -> anyhow::Result<()> { Ok(()) }
    async fn get_directory(&self, _: &DirectoryId) -> anyhow::Result<Option<VirtualDirectory>> { Ok(None) }
    async fn get_directory_by_path(&self, _: &str) -> anyhow::Result<Option<VirtualDirectory>> { Ok(None) }
    async fn list_child_directories(&self, _: &DirectoryId) -> anyhow::Result<Vec<VirtualDirectory>> { Ok(vec![]) }
    async fn update_directory(&self, _: &VirtualDirectory) -> anyhow::Result<()> { Ok(()) }
    async fn delete_directory(&self, _: &DirectoryId) -> anyhow::Result<()> { Ok(()) }

    async fn create_file(&self, _: &VirtualFile) -> anyhow::Result<()> { Ok(()) }
    async fn get_file(&self, _: &FileId) -> anyhow::Result<Option<VirtualFile>> { Ok(None) }
    async fn get_file_by_path(&self, _: &str) -> anyhow::Result<Option<VirtualFile>> { Ok(None) }
    async fn list_child_files(&self, _: &DirectoryId) -> anyhow::Result<Vec<VirtualFile>> { Ok(vec![]) }
    async fn update_file(&self, _: &VirtualFile) -> anyhow::Result<()> { Ok(()) }
    async fn delete_file(&self, _: &FileId) -> anyhow::Result<()> { Ok(()) }

    async fn star(&self, _: &StarredEntry) -> anyhow::Result<()> { Ok(()) }
    async fn unstar(&self, _: &str) -> anyhow::Result<()> { Ok(()) }
    async fn list_starred(&self) -> anyhow::Result<Vec<StarredEntry>> { Ok(vec![]) }

    async fn trash(&self, _: &TrashEntry) -> anyhow::Result<()> { Ok(()) }
    async fn list_trash(&self) -> anyhow::Result<Vec<TrashEntry>> { Ok(vec![]) }
    async fn remove_from_trash(&self, _: &str) -> anyhow::Result<()> { Ok(()) }

    async fn record_recent(&self, _: &RecentEntry) -> anyhow::Result<()> { Ok(()) }
    async fn list_recent(&self, _: u32) -> anyhow::Result<Vec<RecentEntry>> { Ok(vec![]) }

    async fn create_task(&self, _: &Task) -> anyhow::Result<()> { Ok(()) }
    async fn get_task(&self, _: &TaskId) -> anyhow::Result<Option<Task>> { Ok(None) }
    async fn update_task(&self, _: &Task) -> anyhow::Result<()> { Ok(()) }
}

pub fn active_account(priority: u32) -> Account {
    let mut account = Account::new(
        "Test",
        drivemesh_core::domain::Email::new(format!("acct-{priority}@example.com")).unwrap(),
        "cid",
        "secret",
        "tenant",
        priority,
    );
    account.set_tokens("tok", "refresh", chrono::Utc::now() + chrono::Duration::hours(1));
    account.update_quota(0, 1_000_000_000);
    account
}
