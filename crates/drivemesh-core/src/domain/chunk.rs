//! Chunk domain entity
//!
//! A Chunk is one piece of a striped Object. Each chunk is placed and
//! uploaded independently, which is what lets the Object Engine spread a
//! single large object's bytes across multiple backend accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{BucketName, ObjectKey};
use super::object::Placement;

/// Lifecycle state of one chunk's upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    #[default]
    Pending,
    Uploading,
    Uploaded,
    Error(String),
}

impl ChunkStatus {
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, ChunkStatus::Uploaded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ChunkStatus::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    bucket: BucketName,
    key: ObjectKey,
    chunk_index: u32,
    placement: Placement,
    length: u64,
    status: ChunkStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Chunk {
    pub fn new(
        bucket: BucketName,
        key: ObjectKey,
        chunk_index: u32,
        placement: Placement,
        length: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            bucket,
            key,
            chunk_index,
            placement,
            length,
            status: ChunkStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    pub fn key(&self) -> &ObjectKey {
        &self.key
    }

    pub fn chunk_index(&self) -> u32 {
        self.chunk_index
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn status(&self) -> &ChunkStatus {
        &self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn mark_uploading(&mut self) {
        self.status = ChunkStatus::Uploading;
        self.updated_at = Utc::now();
    }

    pub fn mark_uploaded(&mut self) {
        self.status = ChunkStatus::Uploaded;
        self.updated_at = Utc::now();
    }

    pub fn mark_error(&mut self, reason: impl Into<String>) {
        self.status = ChunkStatus::Error(reason.into());
        self.updated_at = Utc::now();
    }
}
