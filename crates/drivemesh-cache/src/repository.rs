//! SQLite implementation of the `MetadataStore` port.
//!
//! ## Type mapping
//!
//! | Domain type                  | SQL type | Strategy                                   |
//! |-------------------------------|----------|---------------------------------------------|
//! | `BucketName`, `ObjectKey`, ... | TEXT     | `.as_str()` / `.to_string()` on write, `FromStr`/`json!` on read |
//! | `DateTime<Utc>`               | TEXT     | `to_rfc3339()` / `parse_from_rfc3339()` with a `NaiveDateTime` fallback |
//! | `Placement`, `AccountStatus`, `ChunkStatus`, ... | TEXT | the exact JSON `serde` would produce, stored verbatim |
//! | `Account`, `Task`, `VirtualFile`, ... | (multiple columns) | reassembled via a `serde_json::json!` object fed through `serde_json::from_value`, since these structs have private fields with no all-argument constructor |
//!
//! Reassembling via JSON rather than a public constructor means a row always
//! reconstructs a value indistinguishable from what was written, including
//! fields (like an `Account`'s token pair) that the domain's own
//! `with_id`-style constructors don't accept.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use drivemesh_core::domain::object::{Object, Placement};
use drivemesh_core::domain::{
    Account, Bucket, BucketName, Chunk, DirectoryId, FileId, ObjectKey, RecentEntry, StarredEntry,
    Task, TaskId, TrashEntry, TrashedKind, VirtualDirectory, VirtualFile,
};
use drivemesh_core::domain::newtypes::AccountId;

use crate::error::CacheError;

/// SQLite-backed implementation of `drivemesh_core::ports::MetadataStore`.
pub struct SqliteMetadataStore {
    pool: SqlitePool,
}

impl SqliteMetadataStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Datetime helpers
// ============================================================================

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, CacheError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                .map(|ndt| ndt.and_utc())
        })
        .map_err(|e| CacheError::SerializationError(format!("invalid datetime '{s}': {e}")))
}

fn parse_optional_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>, CacheError> {
    match s {
        Some(ref v) if !v.is_empty() => parse_datetime(v).map(Some),
        _ => Ok(None),
    }
}

fn opt_rfc3339(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(|dt| dt.to_rfc3339())
}

// ============================================================================
// Row mapping: Bucket
// ============================================================================

fn bucket_from_row(row: &SqliteRow) -> Result<Bucket, CacheError> {
    let name: String = row.get("name");
    let object_count: i64 = row.get("object_count");
    let total_size: i64 = row.get("total_size");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let name = BucketName::from_str(&name)
        .map_err(|e| CacheError::SerializationError(format!("invalid BucketName '{name}': {e}")))?;

    Ok(Bucket::with_timestamps(
        name,
        object_count as u64,
        total_size as u64,
        parse_datetime(&created_at)?,
        parse_datetime(&updated_at)?,
    ))
}

// ============================================================================
// Row mapping: Object / Chunk
//
// `placement` and `status` columns already hold the exact JSON text serde
// would produce for those fields, so reassembly is a straight `json!` merge
// of the scalar columns plus that parsed value.
// ============================================================================

fn object_from_row(row: &SqliteRow) -> Result<Object, CacheError> {
    let bucket: String = row.get("bucket");
    let key: String = row.get("key");
    let size: i64 = row.get("size");
    let etag: String = row.get("etag");
    let mime_type: String = row.get("mime_type");
    let placement_str: String = row.get("placement");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let placement: Value = serde_json::from_str(&placement_str)
        .map_err(|e| CacheError::SerializationError(format!("invalid placement JSON: {e}")))?;

    let object_json = json!({
        "bucket": bucket,
        "key": key,
        "size": size as u64,
        "etag": etag,
        "mime_type": mime_type,
        "placement": placement,
        "created_at": parse_datetime(&created_at)?.to_rfc3339(),
        "updated_at": parse_datetime(&updated_at)?.to_rfc3339(),
    });

    serde_json::from_value(object_json)
        .map_err(|e| CacheError::SerializationError(format!("failed to reconstruct Object: {e}")))
}

fn chunk_from_row(row: &SqliteRow) -> Result<Chunk, CacheError> {
    let bucket: String = row.get("bucket");
    let key: String = row.get("key");
    let chunk_index: i64 = row.get("chunk_index");
    let placement_str: String = row.get("placement");
    let length: i64 = row.get("length");
    let status_str: String = row.get("status");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let placement: Value = serde_json::from_str(&placement_str)
        .map_err(|e| CacheError::SerializationError(format!("invalid placement JSON: {e}")))?;
    let status: Value = serde_json::from_str(&status_str)
        .map_err(|e| CacheError::SerializationError(format!("invalid chunk status JSON: {e}")))?;

    let chunk_json = json!({
        "bucket": bucket,
        "key": key,
        "chunk_index": chunk_index as u32,
        "placement": placement,
        "length": length as u64,
        "status": status,
        "created_at": parse_datetime(&created_at)?.to_rfc3339(),
        "updated_at": parse_datetime(&updated_at)?.to_rfc3339(),
    });

    serde_json::from_value(chunk_json)
        .map_err(|e| CacheError::SerializationError(format!("failed to reconstruct Chunk: {e}")))
}

// ============================================================================
// Row mapping: Account
// ============================================================================

fn account_from_row(row: &SqliteRow) -> Result<Account, CacheError> {
    let id: String = row.get("id");
    let display_name: String = row.get("display_name");
    let email: String = row.get("email");
    let client_id: String = row.get("client_id");
    let client_secret: String = row.get("client_secret");
    let tenant_id: String = row.get("tenant_id");
    let refresh_token: Option<String> = row.get("refresh_token");
    let access_token: Option<String> = row.get("access_token");
    let token_expires: Option<String> = row.get("token_expires");
    let total_space: i64 = row.get("total_space");
    let used_space: i64 = row.get("used_space");
    let status_str: String = row.get("status");
    let priority: i64 = row.get("priority");
    let last_sync: Option<String> = row.get("last_sync");
    let created_at: String = row.get("created_at");

    let status: Value = serde_json::from_str(&status_str)
        .map_err(|e| CacheError::SerializationError(format!("invalid account status JSON: {e}")))?;

    let account_json = json!({
        "id": id,
        "display_name": display_name,
        "email": email,
        "client_id": client_id,
        "client_secret": client_secret,
        "tenant_id": tenant_id,
        "refresh_token": refresh_token,
        "access_token": access_token,
        "token_expires": opt_rfc3339(parse_optional_datetime(token_expires)?),
        "total_space": total_space as u64,
        "used_space": used_space as u64,
        "status": status,
        "priority": priority as u32,
        "last_sync": opt_rfc3339(parse_optional_datetime(last_sync)?),
        "created_at": parse_datetime(&created_at)?.to_rfc3339(),
    });

    serde_json::from_value(account_json)
        .map_err(|e| CacheError::SerializationError(format!("failed to reconstruct Account: {e}")))
}

// ============================================================================
// Row mapping: VirtualDirectory / VirtualFile
// ============================================================================

fn directory_from_row(row: &SqliteRow) -> Result<VirtualDirectory, CacheError> {
    let id: String = row.get("id");
    let parent_id: Option<String> = row.get("parent_id");
    let name: String = row.get("name");
    let path: String = row.get("path");
    let created_at: String = row.get("created_at");

    let dir_json = json!({
        "id": id,
        "parent_id": parent_id,
        "name": name,
        "path": path,
        "created_at": parse_datetime(&created_at)?.to_rfc3339(),
    });

    serde_json::from_value(dir_json).map_err(|e| {
        CacheError::SerializationError(format!("failed to reconstruct VirtualDirectory: {e}"))
    })
}

fn file_from_row(row: &SqliteRow) -> Result<VirtualFile, CacheError> {
    let id: String = row.get("id");
    let parent_id: String = row.get("parent_id");
    let name: String = row.get("name");
    let path: String = row.get("path");
    let object_bucket: String = row.get("object_bucket");
    let object_key: String = row.get("object_key");
    let size: i64 = row.get("size");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let file_json = json!({
        "id": id,
        "parent_id": parent_id,
        "name": name,
        "path": path,
        "object_bucket": object_bucket,
        "object_key": object_key,
        "size": size as u64,
        "created_at": parse_datetime(&created_at)?.to_rfc3339(),
        "updated_at": parse_datetime(&updated_at)?.to_rfc3339(),
    });

    serde_json::from_value(file_json).map_err(|e| {
        CacheError::SerializationError(format!("failed to reconstruct VirtualFile: {e}"))
    })
}

// ============================================================================
// Row mapping: Starred / Trash / Recent
// ============================================================================

fn starred_from_row(row: &SqliteRow) -> Result<StarredEntry, CacheError> {
    let node_id: String = row.get("node_id");
    let kind: String = row.get("kind");
    let starred_at: String = row.get("starred_at");

    let entry_json = json!({
        "node_id": node_id,
        "kind": kind,
        "starred_at": parse_datetime(&starred_at)?.to_rfc3339(),
    });

    serde_json::from_value(entry_json).map_err(|e| {
        CacheError::SerializationError(format!("failed to reconstruct StarredEntry: {e}"))
    })
}

fn trash_from_row(row: &SqliteRow) -> Result<TrashEntry, CacheError> {
    let node_id: String = row.get("node_id");
    let kind: String = row.get("kind");
    let original_parent_id: String = row.get("original_parent_id");
    let original_name: String = row.get("original_name");
    let trashed_at: String = row.get("trashed_at");

    let entry_json = json!({
        "node_id": node_id,
        "kind": kind,
        "original_parent_id": original_parent_id,
        "original_name": original_name,
        "trashed_at": parse_datetime(&trashed_at)?.to_rfc3339(),
    });

    serde_json::from_value(entry_json).map_err(|e| {
        CacheError::SerializationError(format!("failed to reconstruct TrashEntry: {e}"))
    })
}

fn recent_from_row(row: &SqliteRow) -> Result<RecentEntry, CacheError> {
    let file_id: String = row.get("file_id");
    let accessed_at: String = row.get("accessed_at");

    let entry_json = json!({
        "file_id": file_id,
        "accessed_at": parse_datetime(&accessed_at)?.to_rfc3339(),
    });

    serde_json::from_value(entry_json).map_err(|e| {
        CacheError::SerializationError(format!("failed to reconstruct RecentEntry: {e}"))
    })
}

// ============================================================================
// Row mapping: Task
// ============================================================================

fn task_from_row(row: &SqliteRow) -> Result<Task, CacheError> {
    let id: String = row.get("id");
    let task_type: String = row.get("task_type");
    let status: String = row.get("status");
    let progress: i64 = row.get("progress");
    let result: Option<String> = row.get("result");
    let error: Option<String> = row.get("error");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let task_json = json!({
        "id": id,
        "task_type": task_type,
        "status": status,
        "progress": progress as u8,
        "result": result,
        "error": error,
        "created_at": parse_datetime(&created_at)?.to_rfc3339(),
        "updated_at": parse_datetime(&updated_at)?.to_rfc3339(),
    });

    serde_json::from_value(task_json)
        .map_err(|e| CacheError::SerializationError(format!("failed to reconstruct Task: {e}")))
}

fn trashed_kind_to_string(kind: TrashedKind) -> String {
    match kind {
        TrashedKind::File => "file".to_string(),
        TrashedKind::Directory => "directory".to_string(),
    }
}

fn task_type_to_string(task_type: drivemesh_core::domain::TaskType) -> String {
    use drivemesh_core::domain::TaskType;
    match task_type {
        TaskType::Copy => "copy",
        TaskType::Move => "move",
        TaskType::Delete => "delete",
        TaskType::Sync => "sync",
        TaskType::Audit => "audit",
    }
    .to_string()
}

fn task_status_to_string(status: &drivemesh_core::domain::TaskStatus) -> String {
    use drivemesh_core::domain::TaskStatus;
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Running => "running",
        TaskStatus::Completed => "completed",
        TaskStatus::Failed => "failed",
        TaskStatus::Cancelled => "cancelled",
    }
    .to_string()
}

#[async_trait::async_trait]
impl drivemesh_core::ports::MetadataStore for SqliteMetadataStore {
    // --- Buckets ---

    async fn create_bucket(&self, bucket: &Bucket) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO buckets (name, object_count, total_size, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(bucket.name().as_str())
        .bind(bucket.object_count() as i64)
        .bind(bucket.total_size() as i64)
        .bind(bucket.created_at().to_rfc3339())
        .bind(bucket.updated_at().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::trace!(bucket = %bucket.name(), "created bucket row");
        Ok(())
    }

    async fn get_bucket(&self, name: &BucketName) -> anyhow::Result<Option<Bucket>> {
        let row = sqlx::query("SELECT * FROM buckets WHERE name = ?")
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(bucket_from_row).transpose().map_err(Into::into)
    }

    async fn list_buckets(&self) -> anyhow::Result<Vec<Bucket>> {
        let rows = sqlx::query("SELECT * FROM buckets ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(bucket_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    async fn update_bucket(&self, bucket: &Bucket) -> anyhow::Result<()> {
        self.create_bucket(bucket).await
    }

    async fn delete_bucket(&self, name: &BucketName) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM buckets WHERE name = ?")
            .bind(name.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- Objects ---

    async fn put_object(&self, object: &Object) -> anyhow::Result<()> {
        let placement = serde_json::to_string(object.placement())?;

        sqlx::query(
            "INSERT OR REPLACE INTO objects \
             (bucket, key, size, etag, mime_type, placement, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(object.bucket().as_str())
        .bind(object.key().as_str())
        .bind(object.size() as i64)
        .bind(object.etag())
        .bind(object.mime_type())
        .bind(placement)
        .bind(object.created_at().to_rfc3339())
        .bind(object.updated_at().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::trace!(bucket = %object.bucket(), key = %object.key(), "put object row");
        Ok(())
    }

    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> anyhow::Result<Option<Object>> {
        let row = sqlx::query("SELECT * FROM objects WHERE bucket = ? AND key = ?")
            .bind(bucket.as_str())
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(object_from_row).transpose().map_err(Into::into)
    }

    async fn list_objects(&self, bucket: &BucketName, prefix: Option<&str>) -> anyhow::Result<Vec<Object>> {
        let rows = match prefix {
            Some(p) => {
                sqlx::query("SELECT * FROM objects WHERE bucket = ? AND key LIKE ? ORDER BY key ASC")
                    .bind(bucket.as_str())
                    .bind(format!("{p}%"))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM objects WHERE bucket = ? ORDER BY key ASC")
                    .bind(bucket.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(object_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM objects WHERE bucket = ? AND key = ?")
            .bind(bucket.as_str())
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- Chunks ---

    async fn put_chunk(&self, chunk: &Chunk) -> anyhow::Result<()> {
        let placement = serde_json::to_string(chunk.placement())?;
        let status = serde_json::to_string(chunk.status())?;

        sqlx::query(
            "INSERT OR REPLACE INTO chunks \
             (bucket, key, chunk_index, placement, length, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(chunk.bucket().as_str())
        .bind(chunk.key().as_str())
        .bind(chunk.chunk_index() as i64)
        .bind(placement)
        .bind(chunk.length() as i64)
        .bind(status)
        .bind(chunk.created_at().to_rfc3339())
        .bind(chunk.updated_at().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_chunks(&self, bucket: &BucketName, key: &ObjectKey) -> anyhow::Result<Vec<Chunk>> {
        let rows = sqlx::query(
            "SELECT * FROM chunks WHERE bucket = ? AND key = ? ORDER BY chunk_index ASC",
        )
        .bind(bucket.as_str())
        .bind(key.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(chunk_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    async fn delete_chunks(&self, bucket: &BucketName, key: &ObjectKey) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM chunks WHERE bucket = ? AND key = ?")
            .bind(bucket.as_str())
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- Accounts ---

    async fn create_account(&self, account: &Account) -> anyhow::Result<()> {
        let status = serde_json::to_string(account.status())?;

        sqlx::query(
            "INSERT OR REPLACE INTO accounts \
             (id, display_name, email, client_id, client_secret, tenant_id, refresh_token, \
              access_token, token_expires, total_space, used_space, status, priority, \
              last_sync, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(account.id().to_string())
        .bind(account.display_name())
        .bind(account.email().as_str())
        .bind(account.client_id())
        .bind(account.client_secret())
        .bind(account.tenant_id())
        .bind(account.refresh_token())
        .bind(account.access_token())
        .bind(account.token_expires().map(|dt| dt.to_rfc3339()))
        .bind(account.total_space() as i64)
        .bind(account.used_space() as i64)
        .bind(status)
        .bind(account.priority() as i64)
        .bind(account.last_sync().map(|dt| dt.to_rfc3339()))
        .bind(account.created_at().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::trace!(account_id = %account.id(), "saved account row");
        Ok(())
    }

    async fn get_account(&self, id: &AccountId) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(account_from_row).transpose().map_err(Into::into)
    }

    async fn get_account_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(account_from_row).transpose().map_err(Into::into)
    }

    async fn list_accounts(&self) -> anyhow::Result<Vec<Account>> {
        let rows = sqlx::query("SELECT * FROM accounts ORDER BY priority DESC, created_at ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(account_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    async fn update_account(&self, account: &Account) -> anyhow::Result<()> {
        self.create_account(account).await
    }

    async fn delete_account(&self, id: &AccountId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- VFS: directories ---

    async fn create_directory(&self, dir: &VirtualDirectory) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO directories (id, parent_id, name, path, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(dir.id().to_string())
        .bind(dir.parent_id().map(|id| id.to_string()))
        .bind(dir.name())
        .bind(dir.path().as_str())
        .bind(dir.created_at().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_directory(&self, id: &DirectoryId) -> anyhow::Result<Option<VirtualDirectory>> {
        let row = sqlx::query("SELECT * FROM directories WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(directory_from_row).transpose().map_err(Into::into)
    }

    async fn get_directory_by_path(&self, path: &str) -> anyhow::Result<Option<VirtualDirectory>> {
        let row = sqlx::query("SELECT * FROM directories WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(directory_from_row).transpose().map_err(Into::into)
    }

    async fn list_child_directories(&self, parent_id: &DirectoryId) -> anyhow::Result<Vec<VirtualDirectory>> {
        let rows = sqlx::query("SELECT * FROM directories WHERE parent_id = ? ORDER BY name ASC")
            .bind(parent_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(directory_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    async fn update_directory(&self, dir: &VirtualDirectory) -> anyhow::Result<()> {
        self.create_directory(dir).await
    }

    async fn delete_directory(&self, id: &DirectoryId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM directories WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- VFS: files ---

    async fn create_file(&self, file: &VirtualFile) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO files \
             (id, parent_id, name, path, object_bucket, object_key, size, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(file.id().to_string())
        .bind(file.parent_id().to_string())
        .bind(file.name())
        .bind(file.path().as_str())
        .bind(file.object_bucket())
        .bind(file.object_key())
        .bind(file.size() as i64)
        .bind(file.created_at().to_rfc3339())
        .bind(file.updated_at().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_file(&self, id: &FileId) -> anyhow::Result<Option<VirtualFile>> {
        let row = sqlx::query("SELECT * FROM files WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(file_from_row).transpose().map_err(Into::into)
    }

    async fn get_file_by_path(&self, path: &str) -> anyhow::Result<Option<VirtualFile>> {
        let row = sqlx::query("SELECT * FROM files WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(file_from_row).transpose().map_err(Into::into)
    }

    async fn list_child_files(&self, parent_id: &DirectoryId) -> anyhow::Result<Vec<VirtualFile>> {
        let rows = sqlx::query("SELECT * FROM files WHERE parent_id = ? ORDER BY name ASC")
            .bind(parent_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(file_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    async fn update_file(&self, file: &VirtualFile) -> anyhow::Result<()> {
        self.create_file(file).await
    }

    async fn delete_file(&self, id: &FileId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- Starred / Trash / Recent ---

    async fn star(&self, entry: &StarredEntry) -> anyhow::Result<()> {
        sqlx::query("INSERT OR REPLACE INTO starred (node_id, kind, starred_at) VALUES (?, ?, ?)")
            .bind(entry.node_id())
            .bind(trashed_kind_to_string(entry.kind()))
            .bind(entry.starred_at().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn unstar(&self, node_id: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM starred WHERE node_id = ?")
            .bind(node_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_starred(&self) -> anyhow::Result<Vec<StarredEntry>> {
        let rows = sqlx::query("SELECT * FROM starred ORDER BY starred_at DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(starred_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    async fn trash(&self, entry: &TrashEntry) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO trash \
             (node_id, kind, original_parent_id, original_name, trashed_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entry.node_id())
        .bind(trashed_kind_to_string(entry.kind()))
        .bind(entry.original_parent_id().to_string())
        .bind(entry.original_name())
        .bind(entry.trashed_at().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_trash(&self) -> anyhow::Result<Vec<TrashEntry>> {
        let rows = sqlx::query("SELECT * FROM trash ORDER BY trashed_at ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(trash_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    async fn remove_from_trash(&self, node_id: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM trash WHERE node_id = ?")
            .bind(node_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_recent(&self, entry: &RecentEntry) -> anyhow::Result<()> {
        sqlx::query("INSERT OR REPLACE INTO recent (file_id, accessed_at) VALUES (?, ?)")
            .bind(entry.file_id().to_string())
            .bind(entry.accessed_at().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> anyhow::Result<Vec<RecentEntry>> {
        let rows = sqlx::query("SELECT * FROM recent ORDER BY accessed_at DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(recent_from_row).collect::<Result<_, _>>().map_err(Into::into)
    }

    // --- Tasks ---

    async fn create_task(&self, task: &Task) -> anyhow::Result<()> {
        let task_type = task_type_to_string(task.task_type());
        let status = task_status_to_string(task.status());

        sqlx::query(
            "INSERT OR REPLACE INTO tasks \
             (id, task_type, status, progress, result, error, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(task.id().to_string())
        .bind(task_type)
        .bind(status)
        .bind(task.progress() as i64)
        .bind(task.result())
        .bind(task.error())
        .bind(task.created_at().to_rfc3339())
        .bind(task.updated_at().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_task(&self, id: &TaskId) -> anyhow::Result<Option<Task>> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(task_from_row).transpose().map_err(Into::into)
    }

    async fn update_task(&self, task: &Task) -> anyhow::Result<()> {
        self.create_task(task).await
    }
}
