//! Replays queued admin writes once the database answers again.

use std::sync::Arc;

use domain::services::{MutationSink, PendingWriteQueue};
use metrics::gauge;
use sqlx::PgPool;
use tracing::{debug, info};

use super::scheduler::{Job, JobFrequency};

/// Probes the database and drains the pending write queue in FIFO order.
pub struct PendingWriteReplayJob {
    pool: PgPool,
    queue: Arc<PendingWriteQueue>,
    sink: Arc<dyn MutationSink>,
    interval_secs: u64,
}

impl PendingWriteReplayJob {
    pub fn new(
        pool: PgPool,
        queue: Arc<PendingWriteQueue>,
        sink: Arc<dyn MutationSink>,
        interval_secs: u64,
    ) -> Self {
        Self {
            pool,
            queue,
            sink,
            interval_secs,
        }
    }
}

#[async_trait::async_trait]
impl Job for PendingWriteReplayJob {
    fn name(&self) -> &'static str {
        "pending_write_replay"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<(), String> {
        let queued = self.queue.len().await;
        gauge!("pending_writes_queued").set(queued as f64);
        if queued == 0 {
            return Ok(());
        }

        if let Err(e) = persistence::db::ping(&self.pool).await {
            debug!(queued, error = %e, "Database still unavailable, replay postponed");
            return Ok(());
        }

        let report = self
            .queue
            .replay(self.sink.as_ref())
            .await
            .map_err(|e| e.to_string())?;

        gauge!("pending_writes_queued").set(report.remaining as f64);
        info!(
            applied = report.applied,
            dropped = report.dropped,
            remaining = report.remaining,
            "Pending write replay finished"
        );
        Ok(())
    }
}
