//! Queue of admin writes that could not reach the database.
//!
//! When a non-transactional admin write fails with a transient backend
//! error, the mutation is queued instead of lost. A background job replays
//! the queue in FIFO order once the database is reachable again.
//! Reservations never go through this queue.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{CreateItemRequest, UpdateItemRequest, UpdateSettingsRequest};

/// A queued admin mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PendingMutation {
    UpdateSettings {
        request: UpdateSettingsRequest,
    },
    /// `item_id` is assigned when queued so the client can refer to it.
    CreateItem {
        item_id: Uuid,
        request: CreateItemRequest,
    },
    UpdateItem {
        item_id: Uuid,
        request: UpdateItemRequest,
    },
    DeleteItem {
        item_id: Uuid,
    },
}

impl PendingMutation {
    pub fn kind(&self) -> &'static str {
        match self {
            PendingMutation::UpdateSettings { .. } => "update_settings",
            PendingMutation::CreateItem { .. } => "create_item",
            PendingMutation::UpdateItem { .. } => "update_item",
            PendingMutation::DeleteItem { .. } => "delete_item",
        }
    }
}

/// The celebrant a queued write belongs to.
///
/// The account id is absent when the database could not be reached to map
/// the token subject to an account; replay resolves it then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOwner {
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub celebrant_id: Option<Uuid>,
}

impl WriteOwner {
    /// Owner whose account is already known.
    pub fn account(subject: impl Into<String>, celebrant_id: Uuid) -> Self {
        Self {
            subject: subject.into(),
            email: None,
            celebrant_id: Some(celebrant_id),
        }
    }

    /// Owner known only by the identity provider subject.
    pub fn subject(subject: impl Into<String>, email: Option<String>) -> Self {
        Self {
            subject: subject.into(),
            email,
            celebrant_id: None,
        }
    }
}

/// A mutation together with the celebrant it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingWrite {
    pub id: Uuid,
    pub owner: WriteOwner,
    pub mutation: PendingMutation,
    pub queued_at: DateTime<Utc>,
}

/// Outcome of applying one queued mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    /// The backend is still unavailable; keep the mutation.
    #[error("Transient failure: {0}")]
    Transient(String),
    /// The mutation can never succeed; drop it.
    #[error("Permanent failure: {0}")]
    Permanent(String),
}

/// Something that can apply queued mutations, usually the database.
#[async_trait::async_trait]
pub trait MutationSink: Send + Sync {
    async fn apply(&self, write: &PendingWrite) -> Result<(), ReplayError>;
}

/// Errors of the queue itself.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Failed to access queue file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to (de)serialize queue: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result of one replay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    pub dropped: usize,
    pub remaining: usize,
}

/// FIFO of pending writes, optionally persisted as JSON.
#[derive(Debug, Default)]
pub struct PendingWriteQueue {
    entries: Mutex<VecDeque<PendingWrite>>,
    persist_path: Option<PathBuf>,
}

impl PendingWriteQueue {
    /// Creates an in-memory queue.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a queue persisted at `path`, loading any entries left from a
    /// previous run.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => VecDeque::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => VecDeque::new(),
            Err(e) => return Err(e.into()),
        };

        if !entries.is_empty() {
            info!(count = entries.len(), path = %path.display(), "Loaded pending writes");
        }

        Ok(Self {
            entries: Mutex::new(entries),
            persist_path: Some(path),
        })
    }

    /// Appends a mutation once the queue including it has been persisted.
    ///
    /// A write that fails to persist is not queued at all.
    pub async fn enqueue(
        &self,
        owner: WriteOwner,
        mutation: PendingMutation,
    ) -> Result<PendingWrite, QueueError> {
        let write = PendingWrite {
            id: Uuid::new_v4(),
            owner,
            mutation,
            queued_at: Utc::now(),
        };

        let mut entries = self.entries.lock().await;
        if self.persist_path.is_some() {
            let mut staged = entries.clone();
            staged.push_back(write.clone());
            self.persist(&staged).await?;
        }
        entries.push_back(write.clone());

        info!(
            write_id = %write.id,
            subject = %write.owner.subject,
            op = write.mutation.kind(),
            queued = entries.len(),
            "Admin write queued for replay"
        );

        Ok(write)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Copy of the queued writes, oldest first.
    pub async fn snapshot(&self) -> Vec<PendingWrite> {
        self.entries.lock().await.iter().cloned().collect()
    }

    /// Replays queued writes in order.
    ///
    /// Applied writes are removed, permanently failing writes are dropped,
    /// and the first transient failure stops the pass with that write and
    /// everything after it still queued.
    pub async fn replay(&self, sink: &dyn MutationSink) -> Result<ReplayReport, QueueError> {
        let mut entries = self.entries.lock().await;
        let mut report = ReplayReport::default();

        if entries.is_empty() {
            return Ok(report);
        }

        while let Some(write) = entries.front() {
            match sink.apply(write).await {
                Ok(()) => {
                    report.applied += 1;
                    entries.pop_front();
                }
                Err(ReplayError::Permanent(reason)) => {
                    warn!(
                        write_id = %write.id,
                        op = write.mutation.kind(),
                        error = %reason,
                        "Dropping pending write"
                    );
                    report.dropped += 1;
                    entries.pop_front();
                }
                Err(ReplayError::Transient(reason)) => {
                    warn!(
                        write_id = %write.id,
                        error = %reason,
                        remaining = entries.len(),
                        "Replay interrupted, backend still unavailable"
                    );
                    break;
                }
            }
        }

        report.remaining = entries.len();
        if report.applied > 0 || report.dropped > 0 {
            self.persist(&entries).await?;
        }
        if report.remaining == 0 {
            info!(
                applied = report.applied,
                dropped = report.dropped,
                "Pending write queue drained"
            );
        }

        Ok(report)
    }

    async fn persist(&self, entries: &VecDeque<PendingWrite>) -> Result<(), QueueError> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// Sink that answers from a script and records what it applied.
    #[derive(Default)]
    struct ScriptedSink {
        outcomes: StdMutex<VecDeque<Result<(), ReplayError>>>,
        applied: StdMutex<Vec<Uuid>>,
    }

    impl ScriptedSink {
        fn with(outcomes: Vec<Result<(), ReplayError>>) -> Self {
            Self {
                outcomes: StdMutex::new(outcomes.into()),
                applied: StdMutex::new(Vec::new()),
            }
        }

        fn applied(&self) -> Vec<Uuid> {
            self.applied.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl MutationSink for ScriptedSink {
        async fn apply(&self, write: &PendingWrite) -> Result<(), ReplayError> {
            let outcome = self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()));
            if outcome.is_ok() {
                self.applied.lock().unwrap().push(write.id);
            }
            outcome
        }
    }

    fn delete(item_id: Uuid) -> PendingMutation {
        PendingMutation::DeleteItem { item_id }
    }

    fn owner(celebrant_id: Uuid) -> WriteOwner {
        WriteOwner::account("subject-1", celebrant_id)
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("pending-writes-{}.json", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_replay_in_order() {
        let queue = PendingWriteQueue::in_memory();
        let celebrant = Uuid::new_v4();
        let a = queue.enqueue(owner(celebrant), delete(Uuid::new_v4())).await.unwrap();
        let b = queue.enqueue(owner(celebrant), delete(Uuid::new_v4())).await.unwrap();
        let c = queue.enqueue(owner(celebrant), delete(Uuid::new_v4())).await.unwrap();

        let sink = ScriptedSink::default();
        let report = queue.replay(&sink).await.unwrap();

        assert_eq!(
            report,
            ReplayReport {
                applied: 3,
                dropped: 0,
                remaining: 0
            }
        );
        assert_eq!(sink.applied(), vec![a.id, b.id, c.id]);
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn test_replay_stops_on_transient_failure() {
        let queue = PendingWriteQueue::in_memory();
        let celebrant = Uuid::new_v4();
        let a = queue.enqueue(owner(celebrant), delete(Uuid::new_v4())).await.unwrap();
        let b = queue.enqueue(owner(celebrant), delete(Uuid::new_v4())).await.unwrap();
        let c = queue.enqueue(owner(celebrant), delete(Uuid::new_v4())).await.unwrap();

        let sink = ScriptedSink::with(vec![
            Ok(()),
            Err(ReplayError::Transient("connection refused".to_string())),
        ]);
        let report = queue.replay(&sink).await.unwrap();

        assert_eq!(report.applied, 1);
        assert_eq!(report.remaining, 2);
        assert_eq!(sink.applied(), vec![a.id]);

        let left: Vec<Uuid> = queue.snapshot().await.iter().map(|w| w.id).collect();
        assert_eq!(left, vec![b.id, c.id]);
    }

    #[tokio::test]
    async fn test_replay_drops_permanent_failure() {
        let queue = PendingWriteQueue::in_memory();
        let celebrant = Uuid::new_v4();
        let a = queue.enqueue(owner(celebrant), delete(Uuid::new_v4())).await.unwrap();
        let b = queue.enqueue(owner(celebrant), delete(Uuid::new_v4())).await.unwrap();

        let sink = ScriptedSink::with(vec![Err(ReplayError::Permanent(
            "item no longer exists".to_string(),
        ))]);
        let report = queue.replay(&sink).await.unwrap();

        assert_eq!(report.dropped, 1);
        assert_eq!(report.applied, 1);
        assert_eq!(report.remaining, 0);
        assert_eq!(sink.applied(), vec![b.id]);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_replay_empty_queue() {
        let queue = PendingWriteQueue::in_memory();
        let report = queue.replay(&ScriptedSink::default()).await.unwrap();
        assert_eq!(report, ReplayReport::default());
    }

    #[tokio::test]
    async fn test_persisted_queue_survives_reopen() {
        let path = temp_path();
        let item_id = Uuid::new_v4();

        {
            let queue = PendingWriteQueue::open(&path).await.unwrap();
            queue
                .enqueue(
                    WriteOwner::subject("subject-2", Some("sam@example.com".to_string())),
                    PendingMutation::UpdateItem {
                        item_id,
                        request: UpdateItemRequest {
                            title: Some("Renamed".to_string()),
                            ..Default::default()
                        },
                    },
                )
                .await
                .unwrap();
        }

        let reopened = PendingWriteQueue::open(&path).await.unwrap();
        let entries = reopened.snapshot().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].owner.subject, "subject-2");
        assert_eq!(entries[0].owner.celebrant_id, None);
        assert_eq!(entries[0].owner.email.as_deref(), Some("sam@example.com"));
        assert!(matches!(
            &entries[0].mutation,
            PendingMutation::UpdateItem { item_id: id, .. } if *id == item_id
        ));

        reopened.replay(&ScriptedSink::default()).await.unwrap();
        let drained = PendingWriteQueue::open(&path).await.unwrap();
        assert!(drained.is_empty().await);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_failed_persist_does_not_queue() {
        let path = std::env::temp_dir()
            .join(format!("missing-dir-{}", Uuid::new_v4()))
            .join("pending.json");
        let queue = PendingWriteQueue::open(&path).await.unwrap();

        let result = queue.enqueue(owner(Uuid::new_v4()), delete(Uuid::new_v4())).await;

        assert!(matches!(result, Err(QueueError::Io(_))));
        assert_eq!(queue.len().await, 0);
        assert!(queue.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let queue = PendingWriteQueue::open(temp_path()).await.unwrap();
        assert_eq!(queue.len().await, 0);
    }

    #[test]
    fn test_mutation_serialization_is_tagged() {
        let json = serde_json::to_value(delete(Uuid::nil())).unwrap();
        assert_eq!(json["op"], "delete_item");
        assert_eq!(delete(Uuid::nil()).kind(), "delete_item");
    }
}
