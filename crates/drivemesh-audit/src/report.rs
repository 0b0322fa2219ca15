//! The audit report: an append-only list of findings plus run status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reason::IssueType;

/// One piece of drift discovered during a walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub issue_type: IssueType,
    pub bucket: String,
    pub key: String,
    pub chunk_index: Option<u32>,
    pub account_id: Option<String>,
    pub remote_id: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Running,
    Completed,
}

/// Transient, in-memory record of one audit run. Never persisted:
/// a fresh audit always starts from an empty report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    status: ReportStatus,
    issues: Vec<Issue>,
    objects_scanned: u64,
    chunks_scanned: u64,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    summary: Option<String>,
}

impl Report {
    pub fn new() -> Self {
        Self {
            status: ReportStatus::Running,
            issues: Vec::new(),
            objects_scanned: 0,
            chunks_scanned: 0,
            started_at: Utc::now(),
            finished_at: None,
            summary: None,
        }
    }

    pub fn status(&self) -> ReportStatus {
        self.status
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn objects_scanned(&self) -> u64 {
        self.objects_scanned
    }

    pub fn chunks_scanned(&self) -> u64 {
        self.chunks_scanned
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn record_object_scanned(&mut self) {
        self.objects_scanned += 1;
    }

    pub fn record_chunk_scanned(&mut self) {
        self.chunks_scanned += 1;
    }

    /// Transitions to `completed`, stamping a textual summary. Audit
    /// reports never mutate metadata state; this only closes out the
    /// in-memory record of the run.
    pub fn complete(&mut self) {
        self.status = ReportStatus::Completed;
        self.finished_at = Some(Utc::now());
        self.summary = Some(format!(
            "scanned {} object(s) and {} chunk(s), found {} issue(s)",
            self.objects_scanned,
            self.chunks_scanned,
            self.issues.len()
        ));
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}
