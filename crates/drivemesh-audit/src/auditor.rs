//! AuditService - on-demand drift detection over Objects and Chunks.
//!
//! Walks every persisted Object and Chunk, calling `BackendClient::get_item`
//! on each remote reference through the Account Registry (so a stale token
//! is refreshed the same way an upload or download would refresh it).
//! Never mutates metadata state; a finished report is a transient,
//! in-memory artifact.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use drivemesh_core::domain::object::Placement;
use drivemesh_core::domain::{AccountId, Task, TaskType};
use drivemesh_core::ports::{BackendClient, MetadataStore};
use drivemesh_core::usecases::AccountRegistry;

use crate::reason::IssueType;
use crate::report::{Issue, Report};

/// Returned by [`AuditService::start`] when an audit is already running.
#[derive(Debug, thiserror::Error)]
#[error("an audit is already in progress")]
pub struct AuditAlreadyRunning;

/// Coordinates at-most-one active audit walk and exposes its report.
pub struct AuditService {
    store: Arc<dyn MetadataStore>,
    backend: Arc<dyn BackendClient>,
    registry: Arc<AccountRegistry>,
    running: AtomicBool,
    report: RwLock<Option<Report>>,
}

impl AuditService {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        backend: Arc<dyn BackendClient>,
        registry: Arc<AccountRegistry>,
    ) -> Self {
        Self {
            store,
            backend,
            registry,
            running: AtomicBool::new(false),
            report: RwLock::new(None),
        }
    }

    /// Returns a clone of the current (or most recently completed) report,
    /// if an audit has ever been started.
    pub fn status(&self) -> Option<Report> {
        self.report.read().unwrap().clone()
    }

    /// Starts a walk in the background, returning immediately. Fails with
    /// `AuditAlreadyRunning` if a walk is already in flight; the singleton
    /// slot is a single `AtomicBool` CAS, not a lock, so rejection is
    /// immediate and allocation-free.
    pub fn start(self: &Arc<Self>) -> Result<(), AuditAlreadyRunning> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AuditAlreadyRunning);
        }

        *self.report.write().unwrap() = Some(Report::new());

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut task = Task::new(TaskType::Audit);
            task.start();
            if let Err(e) = this.store.create_task(&task).await {
                tracing::warn!(error = %e, "failed to persist audit task row");
            }

            let report = this.run().await;

            task.complete(
                report
                    .summary()
                    .unwrap_or("audit completed with no summary")
                    .to_string(),
            );
            if let Err(e) = this.store.update_task(&task).await {
                tracing::warn!(error = %e, "failed to persist finished audit task row");
            }

            *this.report.write().unwrap() = Some(report);
            this.running.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    async fn run(&self) -> Report {
        let mut report = Report::new();

        let buckets = match self.store.list_buckets().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "audit failed to list buckets");
                report.complete();
                return report;
            }
        };

        for bucket in &buckets {
            let objects = match self.store.list_objects(bucket.name(), None).await {
                Ok(objects) => objects,
                Err(e) => {
                    tracing::warn!(error = %e, bucket = %bucket.name(), "audit failed to list objects");
                    continue;
                }
            };

            for object in objects {
                report.record_object_scanned();

                match object.placement() {
                    Placement::Remote {
                        account_id,
                        remote_id,
                        ..
                    } => {
                        self.check_remote_item(
                            &mut report,
                            IssueType::MissingFile,
                            object.bucket().as_str(),
                            object.key().as_str(),
                            None,
                            *account_id,
                            remote_id.as_str(),
                        )
                        .await;
                    }
                    Placement::Local { .. } => {
                        // Local blobs have no remote reference to verify.
                    }
                    Placement::Striped => {
                        let chunks = match self
                            .store
                            .list_chunks(object.bucket(), object.key())
                            .await
                        {
                            Ok(chunks) => chunks,
                            Err(e) => {
                                tracing::warn!(error = %e, bucket = %object.bucket(), key = %object.key(), "audit failed to list chunks");
                                continue;
                            }
                        };

                        for chunk in chunks {
                            report.record_chunk_scanned();
                            if let Placement::Remote {
                                account_id,
                                remote_id,
                                ..
                            } = chunk.placement()
                            {
                                self.check_remote_item(
                                    &mut report,
                                    IssueType::MissingChunk,
                                    object.bucket().as_str(),
                                    object.key().as_str(),
                                    Some(chunk.chunk_index()),
                                    *account_id,
                                    remote_id.as_str(),
                                )
                                .await;
                            }
                        }
                    }
                }
            }
        }

        report.complete();
        report
    }

    #[allow(clippy::too_many_arguments)]
    async fn check_remote_item(
        &self,
        report: &mut Report,
        missing_type: IssueType,
        bucket: &str,
        key: &str,
        chunk_index: Option<u32>,
        account_id: AccountId,
        remote_id: &str,
    ) {
        let account = match self.registry.ensure_valid(&account_id).await {
            Ok(account) => account,
            Err(e) => {
                report.push(Issue {
                    issue_type: IssueType::Inaccessible,
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    chunk_index,
                    account_id: Some(account_id.to_string()),
                    remote_id: Some(remote_id.to_string()),
                    description: format!("could not obtain a valid token: {e}"),
                });
                return;
            }
        };

        let Some(access_token) = account.access_token() else {
            report.push(Issue {
                issue_type: IssueType::Inaccessible,
                bucket: bucket.to_string(),
                key: key.to_string(),
                chunk_index,
                account_id: Some(account_id.to_string()),
                remote_id: Some(remote_id.to_string()),
                description: "account has no access token on file".to_string(),
            });
            return;
        };

        match self.backend.get_item(access_token, remote_id).await {
            Ok(_) => {}
            Err(drivemesh_core::ports::BackendError::NotFound(msg)) => {
                report.push(Issue {
                    issue_type: missing_type,
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    chunk_index,
                    account_id: Some(account_id.to_string()),
                    remote_id: Some(remote_id.to_string()),
                    description: msg,
                });
            }
            Err(e) => {
                report.push(Issue {
                    issue_type: IssueType::Inaccessible,
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    chunk_index,
                    account_id: Some(account_id.to_string()),
                    remote_id: Some(remote_id.to_string()),
                    description: e.to_string(),
                });
            }
        }
    }
}
