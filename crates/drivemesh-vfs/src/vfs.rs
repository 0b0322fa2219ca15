//! VFS: the hierarchical path-to-object overlay.
//!
//! `VirtualDirectory`/`VirtualFile` form one global path tree (the bucket
//! given to `upload_file`/`copy_file` only selects which Object Engine
//! bucket backs the file's bytes, per the domain model's "bucket is not
//! part of the path" design). Recursive subtree mutations (`move_directory`,
//! `copy_directory`, a non-empty `delete_directory`) live in
//! [`crate::task_engine`]; everything here either touches a single node or
//! is a read.

use std::sync::Arc;

use uuid::Uuid;

use drivemesh_core::domain::newtypes::{BucketName, ObjectKey, VirtualPath};
use drivemesh_core::domain::{CoreError, DirectoryId, RecentEntry, VirtualDirectory, VirtualFile};
use drivemesh_core::ports::MetadataStore;
use drivemesh_engine::{ObjectEngine, SeekableRead};

/// One entry in a directory listing.
pub enum VfsEntry {
    Directory(VirtualDirectory),
    File(VirtualFile),
}

impl VfsEntry {
    pub fn name(&self) -> &str {
        match self {
            VfsEntry::Directory(d) => d.name(),
            VfsEntry::File(f) => f.name(),
        }
    }

    pub fn path(&self) -> &VirtualPath {
        match self {
            VfsEntry::Directory(d) => d.path(),
            VfsEntry::File(f) => f.path(),
        }
    }
}

pub struct VfsService {
    store: Arc<dyn MetadataStore>,
    engine: Arc<ObjectEngine>,
}

impl VfsService {
    pub fn new(store: Arc<dyn MetadataStore>, engine: Arc<ObjectEngine>) -> Self {
        Self { store, engine }
    }

    /// Ensures every ancestor directory of `path` exists, creating the
    /// missing ones, and returns the `DirectoryId` of `path`'s immediate
    /// parent (root if `path` has no parent segment).
    pub(crate) async fn ensure_ancestor_directories(&self, path: &VirtualPath) -> Result<DirectoryId, CoreError> {
        let segments = path.segments();
        if segments.len() <= 1 {
            return Ok(DirectoryId::root());
        }

        let mut current_path = VirtualPath::root();
        let mut current_id = DirectoryId::root();
        for seg in &segments[..segments.len() - 1] {
            current_path = current_path.join(seg).map_err(CoreError::Domain)?;
            current_id = match self
                .store
                .get_directory_by_path(current_path.as_str())
                .await
                .map_err(internal)?
            {
                Some(dir) => dir.id().clone(),
                None => {
                    let dir = VirtualDirectory::new(current_id, seg.to_string(), current_path.clone());
                    let id = dir.id().clone();
                    self.store.create_directory(&dir).await.map_err(internal)?;
                    id
                }
            };
        }
        Ok(current_id)
    }

    async fn check_path_free(&self, path: &VirtualPath) -> Result<(), CoreError> {
        if self.store.get_directory_by_path(path.as_str()).await.map_err(internal)?.is_some()
            || self.store.get_file_by_path(path.as_str()).await.map_err(internal)?.is_some()
        {
            return Err(CoreError::PathExists(path.to_string()));
        }
        Ok(())
    }

    pub async fn upload_file(
        &self,
        bucket: &BucketName,
        path: &VirtualPath,
        content: Vec<u8>,
        mime_type: &str,
    ) -> Result<VirtualFile, CoreError> {
        if path.is_root() {
            return Err(CoreError::InvalidRequest("cannot upload to the root path".into()));
        }
        self.check_path_free(path).await?;

        let parent_id = self.ensure_ancestor_directories(path).await?;
        let key = ObjectKey::new(format!("vfs/{}", Uuid::new_v4())).map_err(CoreError::Domain)?;
        let object = self.engine.upload(bucket, &key, content, mime_type).await?;

        let name = path.name().expect("non-root path has a name");
        let file = VirtualFile::new(parent_id, name, path.clone(), bucket.to_string(), key.to_string(), object.size());
        self.store.create_file(&file).await.map_err(internal)?;
        Ok(file)
    }

    pub async fn download_file(
        &self,
        path: &VirtualPath,
    ) -> Result<(VirtualFile, Box<dyn SeekableRead>), CoreError> {
        let file = self.get_file(path).await?;
        let bucket = BucketName::new(file.object_bucket().to_string()).map_err(CoreError::Domain)?;
        let key = ObjectKey::new(file.object_key().to_string()).map_err(CoreError::Domain)?;
        let (_, reader) = self.engine.download(&bucket, &key).await?;

        self.store
            .record_recent(&RecentEntry::new(file.id().clone()))
            .await
            .map_err(internal)?;

        Ok((file, reader))
    }

    pub async fn get_file(&self, path: &VirtualPath) -> Result<VirtualFile, CoreError> {
        self.store
            .get_file_by_path(path.as_str())
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::PathNotFound(path.to_string()))
    }

    pub async fn get_directory(&self, path: &VirtualPath) -> Result<VirtualDirectory, CoreError> {
        self.store
            .get_directory_by_path(path.as_str())
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::PathNotFound(path.to_string()))
    }

    pub async fn list_directory(&self, path: &VirtualPath, recursive: bool) -> Result<Vec<VfsEntry>, CoreError> {
        let dir = self.get_directory(path).await?;
        let mut entries = Vec::new();
        self.collect_directory(dir.id(), recursive, &mut entries).await?;
        Ok(entries)
    }

    async fn collect_directory(
        &self,
        dir_id: &DirectoryId,
        recursive: bool,
        out: &mut Vec<VfsEntry>,
    ) -> Result<(), CoreError> {
        let child_dirs = self.store.list_child_directories(dir_id).await.map_err(internal)?;
        let child_files = self.store.list_child_files(dir_id).await.map_err(internal)?;

        for file in child_files {
            out.push(VfsEntry::File(file));
        }
        for dir in child_dirs {
            let child_id = dir.id().clone();
            out.push(VfsEntry::Directory(dir));
            if recursive {
                Box::pin(self.collect_directory(&child_id, true, out)).await?;
            }
        }
        Ok(())
    }

    pub async fn create_directory(&self, path: &VirtualPath) -> Result<VirtualDirectory, CoreError> {
        if path.is_root() {
            return Err(CoreError::InvalidRequest("the root directory always exists".into()));
        }
        self.check_path_free(path).await?;

        let parent_id = self.ensure_ancestor_directories(path).await?;
        let name = path.name().expect("non-root path has a name");
        let dir = VirtualDirectory::new(parent_id, name, path.clone());
        self.store.create_directory(&dir).await.map_err(internal)?;
        Ok(dir)
    }

    pub async fn move_file(&self, src: &VirtualPath, dst: &VirtualPath) -> Result<VirtualFile, CoreError> {
        self.check_path_free(dst).await?;
        let mut file = self.get_file(src).await?;

        let parent_id = self.ensure_ancestor_directories(dst).await?;
        let name = dst.name().ok_or_else(|| CoreError::InvalidRequest("destination has no name".into()))?;
        file.relocate(parent_id, name, dst.clone());
        self.store.update_file(&file).await.map_err(internal)?;
        Ok(file)
    }

    pub async fn copy_file(
        &self,
        bucket: &BucketName,
        src: &VirtualPath,
        dst: &VirtualPath,
    ) -> Result<VirtualFile, CoreError> {
        self.check_path_free(dst).await?;
        let src_file = self.get_file(src).await?;

        let src_bucket = BucketName::new(src_file.object_bucket().to_string()).map_err(CoreError::Domain)?;
        let src_key = ObjectKey::new(src_file.object_key().to_string()).map_err(CoreError::Domain)?;
        let (src_object, mut reader) = self.engine.download(&src_bucket, &src_key).await?;

        let mut content = Vec::with_capacity(src_object.size() as usize);
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| CoreError::Internal(e.to_string()))?;
            if n == 0 {
                break;
            }
            content.extend_from_slice(&buf[..n]);
        }

        let new_key = ObjectKey::new(format!("vfs/{}", Uuid::new_v4())).map_err(CoreError::Domain)?;
        let new_object = self.engine.upload(bucket, &new_key, content, src_object.mime_type()).await?;

        let parent_id = self.ensure_ancestor_directories(dst).await?;
        let name = dst.name().ok_or_else(|| CoreError::InvalidRequest("destination has no name".into()))?;
        let file = VirtualFile::new(parent_id, name, dst.clone(), bucket.to_string(), new_key.to_string(), new_object.size());
        self.store.create_file(&file).await.map_err(internal)?;
        Ok(file)
    }

    /// Hard-deletes the file: removes its blob via the Object Engine then
    /// its metadata row. Trash-routed deletion is a separate, explicit path
    /// in [`crate::trash`]; this one never recovers.
    pub async fn delete_file(&self, path: &VirtualPath) -> Result<(), CoreError> {
        let file = self.get_file(path).await?;
        let bucket = BucketName::new(file.object_bucket().to_string()).map_err(CoreError::Domain)?;
        let key = ObjectKey::new(file.object_key().to_string()).map_err(CoreError::Domain)?;
        self.engine.delete(&bucket, &key).await?;
        self.store.delete_file(file.id()).await.map_err(internal)
    }
}

pub(crate) fn internal(err: anyhow::Error) -> CoreError {
    CoreError::Internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivemesh_core::domain::Bucket;

    use crate::test_support::{object_engine, FakeStore};

    fn path(s: &str) -> VirtualPath {
        VirtualPath::new(s.to_string()).unwrap()
    }

    fn service() -> VfsService {
        let store: Arc<dyn MetadataStore> =
            Arc::new(FakeStore::new().with_bucket(Bucket::new(BucketName::new("bucket".into()).unwrap())));
        let engine = object_engine(store.clone());
        VfsService::new(store, engine)
    }

    fn bucket() -> BucketName {
        BucketName::new("bucket".to_string()).unwrap()
    }

    #[tokio::test]
    async fn upload_file_creates_missing_intermediate_directories() {
        let vfs = service();
        let file = vfs.upload_file(&bucket(), &path("/docs/a.txt"), b"hi".to_vec(), "text/plain").await.unwrap();
        assert_eq!(file.name(), "a.txt");

        let dir = vfs.get_directory(&path("/docs")).await.unwrap();
        assert_eq!(dir.name(), "docs");
    }

    #[tokio::test]
    async fn upload_file_rejects_an_existing_path() {
        let vfs = service();
        vfs.upload_file(&bucket(), &path("/a.txt"), b"hi".to_vec(), "text/plain").await.unwrap();
        let err = vfs.upload_file(&bucket(), &path("/a.txt"), b"bye".to_vec(), "text/plain").await.unwrap_err();
        assert!(matches!(err, CoreError::PathExists(_)));
    }

    #[tokio::test]
    async fn download_file_returns_the_uploaded_bytes() {
        let vfs = service();
        vfs.upload_file(&bucket(), &path("/a.txt"), b"hello".to_vec(), "text/plain").await.unwrap();

        let (file, mut reader) = vfs.download_file(&path("/a.txt")).await.unwrap();
        assert_eq!(file.name(), "a.txt");

        let mut buf = [0u8; 16];
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[tokio::test]
    async fn list_directory_merges_files_and_subdirectories() {
        let vfs = service();
        vfs.upload_file(&bucket(), &path("/a.txt"), b"1".to_vec(), "text/plain").await.unwrap();
        vfs.create_directory(&path("/docs")).await.unwrap();

        let root = VirtualPath::root();
        let entries = vfs.list_directory(&root, false).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn list_directory_recursive_descends_into_children() {
        let vfs = service();
        vfs.upload_file(&bucket(), &path("/docs/a.txt"), b"1".to_vec(), "text/plain").await.unwrap();
        vfs.upload_file(&bucket(), &path("/docs/nested/b.txt"), b"2".to_vec(), "text/plain").await.unwrap();

        let entries = vfs.list_directory(&VirtualPath::root(), true).await.unwrap();
        // docs, docs/a.txt, docs/nested, docs/nested/b.txt
        assert_eq!(entries.len(), 4);
    }

    #[tokio::test]
    async fn create_directory_rejects_an_existing_path() {
        let vfs = service();
        vfs.create_directory(&path("/docs")).await.unwrap();
        let err = vfs.create_directory(&path("/docs")).await.unwrap_err();
        assert!(matches!(err, CoreError::PathExists(_)));
    }

    #[tokio::test]
    async fn move_file_relocates_without_touching_the_object() {
        let vfs = service();
        let original = vfs.upload_file(&bucket(), &path("/a.txt"), b"1".to_vec(), "text/plain").await.unwrap();

        let moved = vfs.move_file(&path("/a.txt"), &path("/docs/b.txt")).await.unwrap();
        assert_eq!(moved.name(), "b.txt");
        assert_eq!(moved.object_key(), original.object_key());
        assert!(vfs.get_file(&path("/a.txt")).await.is_err());
    }

    #[tokio::test]
    async fn move_file_rejects_an_existing_destination() {
        let vfs = service();
        vfs.upload_file(&bucket(), &path("/a.txt"), b"1".to_vec(), "text/plain").await.unwrap();
        vfs.upload_file(&bucket(), &path("/b.txt"), b"2".to_vec(), "text/plain").await.unwrap();

        let err = vfs.move_file(&path("/a.txt"), &path("/b.txt")).await.unwrap_err();
        assert!(matches!(err, CoreError::PathExists(_)));
    }

    #[tokio::test]
    async fn copy_file_creates_a_distinct_object() {
        let vfs = service();
        let original = vfs.upload_file(&bucket(), &path("/a.txt"), b"hello".to_vec(), "text/plain").await.unwrap();

        let copy = vfs.copy_file(&bucket(), &path("/a.txt"), &path("/b.txt")).await.unwrap();
        assert_ne!(copy.object_key(), original.object_key());

        let (_, mut reader) = vfs.download_file(&path("/b.txt")).await.unwrap();
        let mut buf = [0u8; 16];
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[tokio::test]
    async fn delete_file_removes_metadata_and_blob() {
        let vfs = service();
        vfs.upload_file(&bucket(), &path("/a.txt"), b"1".to_vec(), "text/plain").await.unwrap();

        vfs.delete_file(&path("/a.txt")).await.unwrap();
        assert!(vfs.get_file(&path("/a.txt")).await.is_err());
    }
}
