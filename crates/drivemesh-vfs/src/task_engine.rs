//! The Task Engine: recursive VFS subtree mutations that outlive one
//! request/response cycle.
//!
//! `move_directory`/`copy_directory` always run as a [`Task`]; a
//! `delete_directory` only spawns one when the directory actually has
//! children. Validation (path conflicts, the move-into-own-descendant
//! cycle check) happens synchronously before the task is created, so a
//! caller gets an immediate error with no side effects and no dangling
//! task row. Overlapping recursive operations on the same subtree are not
//! serialized against each other; callers are expected to avoid that, per
//! the same "last writer wins" rule the rest of the system uses.

use std::sync::Arc;

use tracing::{error, info, warn};

use drivemesh_core::domain::newtypes::{BucketName, ObjectKey, VirtualPath};
use drivemesh_core::domain::{CoreError, DirectoryId, Task, TaskId, TaskType, VirtualDirectory, VirtualFile};
use drivemesh_core::ports::MetadataStore;
use drivemesh_engine::ObjectEngine;

use crate::vfs::internal;

pub enum DeleteDirectoryOutcome {
    /// The directory was empty and removed inline.
    Deleted,
    /// The directory had children; a recursive delete was scheduled.
    Scheduled(TaskId),
}

struct Subtree {
    dirs: Vec<VirtualDirectory>,
    files: Vec<VirtualFile>,
}

pub struct TaskEngine {
    store: Arc<dyn MetadataStore>,
    engine: Arc<ObjectEngine>,
}

impl TaskEngine {
    pub fn new(store: Arc<dyn MetadataStore>, engine: Arc<ObjectEngine>) -> Self {
        Self { store, engine }
    }

    pub async fn get_task(&self, id: &TaskId) -> Result<Option<Task>, CoreError> {
        self.store.get_task(id).await.map_err(internal)
    }

    /// Collects every descendant directory and file under `root`. `root`
    /// itself is not included; traversal order is unspecified.
    async fn collect_subtree(store: &Arc<dyn MetadataStore>, root: &DirectoryId) -> anyhow::Result<Subtree> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        let mut queue = vec![root.clone()];

        while let Some(dir_id) = queue.pop() {
            for file in store.list_child_files(&dir_id).await? {
                files.push(file);
            }
            for dir in store.list_child_directories(&dir_id).await? {
                queue.push(dir.id().clone());
                dirs.push(dir);
            }
        }

        Ok(Subtree { dirs, files })
    }

    async fn create_task(&self, task_type: TaskType) -> Result<Task, CoreError> {
        let task = Task::new(task_type);
        self.store.create_task(&task).await.map_err(internal)?;
        Ok(task)
    }

    pub async fn move_directory(&self, src: &VirtualPath, dst: &VirtualPath) -> Result<TaskId, CoreError> {
        if dst.is_within(src) {
            return Err(CoreError::InvalidRequest(
                "destination cannot be a descendant of source".into(),
            ));
        }
        if self.store.get_directory_by_path(dst.as_str()).await.map_err(internal)?.is_some()
            || self.store.get_file_by_path(dst.as_str()).await.map_err(internal)?.is_some()
        {
            return Err(CoreError::PathExists(dst.to_string()));
        }
        let mut src_dir = self
            .store
            .get_directory_by_path(src.as_str())
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::PathNotFound(src.to_string()))?;

        let mut task = self.create_task(TaskType::Move).await?;
        let task_id = task.id().clone();
        let store = self.store.clone();
        let src_root = src.clone();
        let dst_root = dst.clone();

        tokio::spawn(async move {
            task.start();
            let _ = store.update_task(&task).await;

            let result = async {
                let subtree = Self::collect_subtree(&store, src_dir.id()).await?;
                let total = subtree.dirs.len() + subtree.files.len() + 1;
                let mut done = 0usize;

                for mut dir in subtree.dirs {
                    relocate_under(&src_root, &dst_root, &mut dir)?;
                    store.update_directory(&dir).await?;
                    done += 1;
                    report_progress(&store, &mut task, done, total).await;
                }
                for mut file in subtree.files {
                    relocate_file_under(&src_root, &dst_root, &mut file)?;
                    store.update_file(&file).await?;
                    done += 1;
                    report_progress(&store, &mut task, done, total).await;
                }

                let parent_name = dst_root.name().unwrap_or_default().to_string();
                let parent_id = parent_of(&store, &dst_root).await?;
                src_dir.relocate(parent_id, parent_name, dst_root.clone());
                store.update_directory(&src_dir).await?;
                anyhow::Ok(())
            }
            .await;

            match result {
                Ok(()) => {
                    task.complete(format!("moved {} to {}", src_root, dst_root));
                    info!(task = %task.id(), "move_directory completed");
                }
                Err(err) => {
                    error!(task = %task.id(), error = %err, "move_directory failed");
                    task.fail(err.to_string());
                }
            }
            let _ = store.update_task(&task).await;
        });

        Ok(task_id)
    }

    pub async fn copy_directory(
        &self,
        bucket: &BucketName,
        src: &VirtualPath,
        dst: &VirtualPath,
    ) -> Result<TaskId, CoreError> {
        if self.store.get_directory_by_path(dst.as_str()).await.map_err(internal)?.is_some()
            || self.store.get_file_by_path(dst.as_str()).await.map_err(internal)?.is_some()
        {
            return Err(CoreError::PathExists(dst.to_string()));
        }
        let src_dir = self
            .store
            .get_directory_by_path(src.as_str())
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::PathNotFound(src.to_string()))?;

        let mut task = self.create_task(TaskType::Copy).await?;
        let task_id = task.id().clone();
        let store = self.store.clone();
        let engine = self.engine.clone();
        let bucket = bucket.clone();
        let src_root = src.clone();
        let dst_root = dst.clone();

        tokio::spawn(async move {
            task.start();
            let _ = store.update_task(&task).await;

            let result = async {
                let new_root_id = ensure_directory_chain(&store, &dst_root).await?;
                let subtree = Self::collect_subtree(&store, src_dir.id()).await?;
                let total = subtree.dirs.len() + subtree.files.len() + 1;
                let mut done = 0usize;

                for dir in &subtree.dirs {
                    let rel = rebase(&src_root, &dst_root, dir.path())?;
                    ensure_directory_chain(&store, &rel).await?;
                    done += 1;
                    report_progress(&store, &mut task, done, total).await;
                }
                for file in &subtree.files {
                    let new_path = rebase(&src_root, &dst_root, file.path())?;
                    let parent_id = parent_of(&store, &new_path).await?;
                    let name = new_path.name().unwrap_or_default().to_string();

                    let object_bucket = BucketName::new(file.object_bucket().to_string())?;
                    let object_key = ObjectKey::new(file.object_key().to_string())?;
                    let (object, mut reader) = engine.download(&object_bucket, &object_key).await?;

                    let mut content = Vec::with_capacity(object.size() as usize);
                    let mut buf = [0u8; 64 * 1024];
                    loop {
                        use drivemesh_engine::SeekableRead;
                        let n = reader.read(&mut buf).await?;
                        if n == 0 {
                            break;
                        }
                        content.extend_from_slice(&buf[..n]);
                    }

                    let new_key = ObjectKey::new(format!("vfs/{}", uuid::Uuid::new_v4()))?;
                    let new_object = engine.upload(&bucket, &new_key, content, object.mime_type()).await?;
                    let new_file = VirtualFile::new(parent_id, name, new_path, bucket.to_string(), new_key.to_string(), new_object.size());
                    store.create_file(&new_file).await?;

                    done += 1;
                    report_progress(&store, &mut task, done, total).await;
                }

                done += 1;
                report_progress(&store, &mut task, done, total).await;
                let _ = new_root_id;
                anyhow::Ok(())
            }
            .await;

            match result {
                Ok(()) => {
                    task.complete(format!("copied {} to {}", src_root, dst_root));
                    info!(task = %task.id(), "copy_directory completed");
                }
                Err(err) => {
                    error!(task = %task.id(), error = %err, "copy_directory failed");
                    task.fail(err.to_string());
                }
            }
            let _ = store.update_task(&task).await;
        });

        Ok(task_id)
    }

    pub async fn delete_directory(&self, path: &VirtualPath, recursive: bool) -> Result<DeleteDirectoryOutcome, CoreError> {
        let dir = self
            .store
            .get_directory_by_path(path.as_str())
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::PathNotFound(path.to_string()))?;

        let child_dirs = self.store.list_child_directories(dir.id()).await.map_err(internal)?;
        let child_files = self.store.list_child_files(dir.id()).await.map_err(internal)?;
        if child_dirs.is_empty() && child_files.is_empty() {
            self.store.delete_directory(dir.id()).await.map_err(internal)?;
            return Ok(DeleteDirectoryOutcome::Deleted);
        }
        if !recursive {
            return Err(CoreError::DirNotEmpty(path.to_string()));
        }

        let mut task = self.create_task(TaskType::Delete).await?;
        let task_id = task.id().clone();
        let store = self.store.clone();
        let engine = self.engine.clone();
        let path = path.clone();
        let dir_id = dir.id().clone();

        tokio::spawn(async move {
            task.start();
            let _ = store.update_task(&task).await;

            let result = async {
                let subtree = Self::collect_subtree(&store, &dir_id).await?;
                let total = subtree.dirs.len() + subtree.files.len() + 1;
                let mut done = 0usize;

                for file in &subtree.files {
                    let bucket = BucketName::new(file.object_bucket().to_string())?;
                    let key = ObjectKey::new(file.object_key().to_string())?;
                    if let Err(err) = engine.delete(&bucket, &key).await {
                        warn!(file = %file.path(), error = %err, "best-effort blob delete failed during directory delete");
                    }
                    store.delete_file(file.id()).await?;
                    done += 1;
                    report_progress(&store, &mut task, done, total).await;
                }

                // Deepest directories first so a store that enforces empty-parent
                // invariants on delete never sees a directory with live children.
                let mut dirs = subtree.dirs;
                dirs.sort_by_key(|d| std::cmp::Reverse(d.path().segments().len()));
                for dir in dirs {
                    store.delete_directory(dir.id()).await?;
                    done += 1;
                    report_progress(&store, &mut task, done, total).await;
                }

                store.delete_directory(&dir_id).await?;
                done += 1;
                report_progress(&store, &mut task, done, total).await;
                anyhow::Ok(())
            }
            .await;

            match result {
                Ok(()) => {
                    task.complete(format!("deleted {path}"));
                    info!(task = %task.id(), "delete_directory completed");
                }
                Err(err) => {
                    error!(task = %task.id(), error = %err, "delete_directory failed");
                    task.fail(err.to_string());
                }
            }
            let _ = store.update_task(&task).await;
        });

        Ok(DeleteDirectoryOutcome::Scheduled(task_id))
    }
}

async fn report_progress(store: &Arc<dyn MetadataStore>, task: &mut Task, done: usize, total: usize) {
    let percent = if total == 0 { 100 } else { ((done * 100) / total).min(100) as u8 };
    task.set_progress(percent);
    let _ = store.update_task(task).await;
}

async fn parent_of(store: &Arc<dyn MetadataStore>, path: &VirtualPath) -> anyhow::Result<DirectoryId> {
    match path.parent() {
        None => Ok(DirectoryId::root()),
        Some(parent) if parent.is_root() => Ok(DirectoryId::root()),
        Some(parent) => Ok(store
            .get_directory_by_path(parent.as_str())
            .await?
            .map(|d| d.id().clone())
            .unwrap_or_else(DirectoryId::root)),
    }
}

/// Creates every directory along `path` that does not already exist and
/// returns the leaf's id.
async fn ensure_directory_chain(store: &Arc<dyn MetadataStore>, path: &VirtualPath) -> anyhow::Result<DirectoryId> {
    if path.is_root() {
        return Ok(DirectoryId::root());
    }
    if let Some(existing) = store.get_directory_by_path(path.as_str()).await? {
        return Ok(existing.id().clone());
    }

    let parent_id = match path.parent() {
        Some(parent) => Box::pin(ensure_directory_chain(store, &parent)).await?,
        None => DirectoryId::root(),
    };
    let name = path.name().unwrap_or_default().to_string();
    let dir = VirtualDirectory::new(parent_id, name, path.clone());
    let id = dir.id().clone();
    store.create_directory(&dir).await?;
    Ok(id)
}

/// Rewrites `dir`'s path/name in place as if the `src_root` subtree had
/// been relocated to `dst_root`, without touching the store.
fn relocate_under(src_root: &VirtualPath, dst_root: &VirtualPath, dir: &mut VirtualDirectory) -> anyhow::Result<()> {
    let new_path = rebase(src_root, dst_root, dir.path())?;
    let name = new_path.name().unwrap_or_default().to_string();
    // A descendant directory's parent_id is untouched by the move: it still
    // points at the same immediate parent, which keeps its own id and is
    // rewritten independently. Only its cached path/name prefix changes.
    dir.relocate(dir.parent_id().cloned().unwrap_or_else(DirectoryId::root), name, new_path);
    Ok(())
}

fn relocate_file_under(src_root: &VirtualPath, dst_root: &VirtualPath, file: &mut VirtualFile) -> anyhow::Result<()> {
    let new_path = rebase(src_root, dst_root, file.path())?;
    let name = new_path.name().unwrap_or_default().to_string();
    file.relocate(file.parent_id().clone(), name, new_path);
    Ok(())
}

/// Replaces the `src_root` prefix of `path` with `dst_root`.
fn rebase(src_root: &VirtualPath, dst_root: &VirtualPath, path: &VirtualPath) -> anyhow::Result<VirtualPath> {
    let suffix = path.as_str().strip_prefix(src_root.as_str()).ok_or_else(|| {
        anyhow::anyhow!("{} is not under {}", path, src_root)
    })?;
    let joined = format!("{}{}", dst_root.as_str(), suffix);
    VirtualPath::new(joined).map_err(anyhow::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivemesh_core::domain::Bucket;
    use drivemesh_core::domain::TaskStatus;

    use crate::test_support::{object_engine, FakeStore};
    use crate::vfs::VfsService;

    fn path(s: &str) -> VirtualPath {
        VirtualPath::new(s.to_string()).unwrap()
    }

    fn bucket() -> BucketName {
        BucketName::new("bucket".to_string()).unwrap()
    }

    fn engines() -> (TaskEngine, VfsService, Arc<dyn MetadataStore>) {
        let store: Arc<dyn MetadataStore> =
            Arc::new(FakeStore::new().with_bucket(Bucket::new(bucket())));
        let engine = object_engine(store.clone());
        (TaskEngine::new(store.clone(), engine.clone()), VfsService::new(store.clone(), engine), store)
    }

    async fn wait_for_task(store: &Arc<dyn MetadataStore>, id: &TaskId) -> Task {
        for _ in 0..200 {
            let task = store.get_task(id).await.unwrap().unwrap();
            if task.status().is_terminal() {
                return task;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("task {id} did not reach a terminal state in time");
    }

    #[tokio::test]
    async fn move_directory_rejects_moving_into_its_own_descendant() {
        let (tasks, vfs, _store) = engines();
        vfs.create_directory(&path("/a")).await.unwrap();
        vfs.create_directory(&path("/a/b")).await.unwrap();

        let err = tasks.move_directory(&path("/a"), &path("/a/b/c")).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn move_directory_relocates_the_whole_subtree() {
        let (tasks, vfs, store) = engines();
        vfs.create_directory(&path("/a")).await.unwrap();
        vfs.upload_file(&bucket(), &path("/a/f.txt"), b"1".to_vec(), "text/plain").await.unwrap();
        vfs.create_directory(&path("/a/b")).await.unwrap();

        let task_id = tasks.move_directory(&path("/a"), &path("/z")).await.unwrap();
        let task = wait_for_task(&store, &task_id).await;
        assert_eq!(*task.status(), TaskStatus::Completed);

        assert!(vfs.get_directory(&path("/z")).await.is_ok());
        assert!(vfs.get_directory(&path("/z/b")).await.is_ok());
        assert!(vfs.get_file(&path("/z/f.txt")).await.is_ok());
        assert!(vfs.get_directory(&path("/a")).await.is_err());
    }

    #[tokio::test]
    async fn copy_directory_replicates_files_under_a_new_object() {
        let (tasks, vfs, store) = engines();
        vfs.create_directory(&path("/a")).await.unwrap();
        let original = vfs.upload_file(&bucket(), &path("/a/f.txt"), b"hi".to_vec(), "text/plain").await.unwrap();

        let task_id = tasks.copy_directory(&bucket(), &path("/a"), &path("/z")).await.unwrap();
        let task = wait_for_task(&store, &task_id).await;
        assert_eq!(*task.status(), TaskStatus::Completed);

        let copy = vfs.get_file(&path("/z/f.txt")).await.unwrap();
        assert_ne!(copy.object_key(), original.object_key());
        assert!(vfs.get_file(&path("/a/f.txt")).await.is_ok());
    }

    #[tokio::test]
    async fn delete_directory_non_recursive_fails_when_not_empty() {
        let (tasks, vfs, _store) = engines();
        vfs.create_directory(&path("/a")).await.unwrap();
        vfs.upload_file(&bucket(), &path("/a/f.txt"), b"1".to_vec(), "text/plain").await.unwrap();

        let err = tasks.delete_directory(&path("/a"), false).await.unwrap_err();
        assert!(matches!(err, CoreError::DirNotEmpty(_)));
    }

    #[tokio::test]
    async fn delete_directory_empty_completes_inline() {
        let (tasks, vfs, _store) = engines();
        vfs.create_directory(&path("/a")).await.unwrap();

        let outcome = tasks.delete_directory(&path("/a"), false).await.unwrap();
        assert!(matches!(outcome, DeleteDirectoryOutcome::Deleted));
        assert!(vfs.get_directory(&path("/a")).await.is_err());
    }

    #[tokio::test]
    async fn delete_directory_recursive_removes_the_whole_subtree() {
        let (tasks, vfs, store) = engines();
        vfs.create_directory(&path("/a")).await.unwrap();
        vfs.upload_file(&bucket(), &path("/a/f.txt"), b"1".to_vec(), "text/plain").await.unwrap();
        vfs.create_directory(&path("/a/b")).await.unwrap();

        let outcome = tasks.delete_directory(&path("/a"), true).await.unwrap();
        let DeleteDirectoryOutcome::Scheduled(task_id) = outcome else {
            panic!("expected a scheduled task for a non-empty directory");
        };
        let task = wait_for_task(&store, &task_id).await;
        assert_eq!(*task.status(), TaskStatus::Completed);

        assert!(vfs.get_directory(&path("/a")).await.is_err());
        assert!(vfs.get_directory(&path("/a/b")).await.is_err());
        assert!(vfs.get_file(&path("/a/f.txt")).await.is_err());
    }
}
