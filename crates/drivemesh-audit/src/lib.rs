//! DriveMesh Audit - drift detection between metadata and backend storage
//!
//! Walks every persisted Object and Chunk, checking each remote reference
//! against the backend it claims to live on. Never mutates state; a run
//! produces a transient, in-process report.

pub mod auditor;
pub mod reason;
pub mod report;

#[cfg(test)]
mod test_support;

pub use auditor::{AuditAlreadyRunning, AuditService};
pub use reason::IssueType;
pub use report::{Issue, Report, ReportStatus};
