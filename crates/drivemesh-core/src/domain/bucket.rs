//! Bucket domain entity
//!
//! A Bucket is a top-level namespace for Objects, analogous to an S3
//! bucket. It tracks aggregate counters that the Object Engine keeps in
//! sync as objects are added and removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::BucketName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    name: BucketName,
    object_count: u64,
    total_size: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Bucket {
    pub fn new(name: BucketName) -> Self {
        let now = Utc::now();
        Self {
            name,
            object_count: 0,
            total_size: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_timestamps(
        name: BucketName,
        object_count: u64,
        total_size: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name,
            object_count,
            total_size,
            created_at,
            updated_at,
        }
    }

    pub fn name(&self) -> &BucketName {
        &self.name
    }

    pub fn object_count(&self) -> u64 {
        self.object_count
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_empty(&self) -> bool {
        self.object_count == 0
    }

    /// Records the addition of an object of the given size.
    pub fn record_object_added(&mut self, size: u64) {
        self.object_count += 1;
        self.total_size += size;
        self.updated_at = Utc::now();
    }

    /// Records the removal of an object of the given size.
    pub fn record_object_removed(&mut self, size: u64) {
        self.object_count = self.object_count.saturating_sub(1);
        self.total_size = self.total_size.saturating_sub(size);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> BucketName {
        BucketName::new(s.to_string()).unwrap()
    }

    #[test]
    fn new_bucket_is_empty() {
        let bucket = Bucket::new(name("my-bucket"));
        assert!(bucket.is_empty());
        assert_eq!(bucket.object_count(), 0);
        assert_eq!(bucket.total_size(), 0);
    }

    #[test]
    fn record_object_added_updates_counters() {
        let mut bucket = Bucket::new(name("my-bucket"));
        bucket.record_object_added(100);
        bucket.record_object_added(50);
        assert_eq!(bucket.object_count(), 2);
        assert_eq!(bucket.total_size(), 150);
        assert!(!bucket.is_empty());
    }

    #[test]
    fn record_object_removed_never_underflows() {
        let mut bucket = Bucket::new(name("my-bucket"));
        bucket.record_object_removed(100);
        assert_eq!(bucket.object_count(), 0);
        assert_eq!(bucket.total_size(), 0);
    }
}
