//! Long-running background task that drains the notification outbox
//! through the configured [`Mailer`].

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::db::{self, outbox};
use crate::mailer::Mailer;
use crate::models::NotificationStatus;

pub struct RelayState {
    pub pool: SqlitePool,
    pub mailer: Mailer,
    pub poll_interval: Duration,
    pub batch_size: i64,
    pub max_attempts: i64,
}

/// Outcome of one pass over the outbox.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
    pub sent: usize,
    pub retrying: usize,
    pub failed: usize,
}

/// Spawn-able relay loop; returns once `shutdown` is cancelled.
pub async fn run(state: Arc<RelayState>, shutdown: CancellationToken) {
    info!(
        "Notification relay starting (every {}s, batch {})",
        state.poll_interval.as_secs(),
        state.batch_size
    );

    loop {
        match deliver_pending(&state).await {
            Ok(report) if report != RelayReport::default() => {
                info!(
                    sent = report.sent,
                    retrying = report.retrying,
                    failed = report.failed,
                    "Outbox pass complete"
                );
            }
            Ok(_) => {}
            Err(e) => error!("Outbox pass error: {e}"),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(state.poll_interval) => {}
        }
    }

    info!("Notification relay stopped");
}

/// Send one batch of pending messages and record each outcome.
pub async fn deliver_pending(state: &RelayState) -> crate::errors::Result<RelayReport> {
    let batch = outbox::pending_batch(&state.pool, state.batch_size).await?;
    let mut report = RelayReport::default();

    for message in batch {
        match state
            .mailer
            .send(&message.recipient, &message.subject, &message.body)
            .await
        {
            Ok(()) => {
                outbox::mark_sent(&state.pool, message.id, db::unix_now()).await?;
                report.sent += 1;
            }
            Err(e) => {
                let reason = e.to_string();
                let status =
                    outbox::record_failure(&state.pool, message.id, &reason, state.max_attempts)
                        .await?;
                warn!(
                    notification = message.id,
                    recipient = %message.recipient,
                    ?status,
                    "Notification delivery failed: {reason}"
                );
                match status {
                    NotificationStatus::Failed => report.failed += 1,
                    _ => report.retrying += 1,
                }
            }
        }
    }

    Ok(report)
}
