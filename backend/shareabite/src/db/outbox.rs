//! Notification outbox queries.

use sqlx::SqliteExecutor;

use crate::errors::Result;
use crate::models::{Notification, NotificationStatus, OutgoingMessage};

const NOTIFICATION_COLUMNS: &str = r#"
    id, listing_id, recipient, subject, body, status, attempts,
    last_error, created_at, sent_at
"#;

/// Queue one message. Call inside the transaction that caused it.
pub async fn enqueue<'e, E>(
    executor: E,
    listing_id: Option<i64>,
    message: &OutgoingMessage,
    now: i64,
) -> Result<i64>
where
    E: SqliteExecutor<'e>,
{
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO notifications (listing_id, recipient, subject, body, status, attempts, created_at)
        VALUES (?1, ?2, ?3, ?4, 'pending', 0, ?5)
        RETURNING id
        "#,
    )
    .bind(listing_id)
    .bind(&message.recipient)
    .bind(&message.subject)
    .bind(&message.body)
    .bind(now)
    .fetch_one(executor)
    .await?;
    Ok(id)
}

/// Oldest pending messages first.
pub async fn pending_batch<'e, E>(executor: E, limit: i64) -> Result<Vec<Notification>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT {NOTIFICATION_COLUMNS}
        FROM   notifications
        WHERE  status = 'pending'
        ORDER  BY id ASC
        LIMIT  ?1
        "#
    );
    let rows = sqlx::query_as::<_, Notification>(&sql)
        .bind(limit)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn mark_sent<'e, E>(executor: E, id: i64, now: i64) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE notifications
        SET    status = 'sent', attempts = attempts + 1, last_error = NULL, sent_at = ?1
        WHERE  id = ?2
        "#,
    )
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Record a failed attempt; the row becomes `failed` once `max_attempts` is reached.
pub async fn record_failure<'e, E>(
    executor: E,
    id: i64,
    error: &str,
    max_attempts: i64,
) -> Result<NotificationStatus>
where
    E: SqliteExecutor<'e>,
{
    let (status,): (NotificationStatus,) = sqlx::query_as(
        r#"
        UPDATE notifications
        SET    attempts   = attempts + 1,
               last_error = ?1,
               status     = CASE WHEN attempts + 1 >= ?2 THEN 'failed' ELSE 'pending' END
        WHERE  id = ?3
        RETURNING status
        "#,
    )
    .bind(error)
    .bind(max_attempts)
    .bind(id)
    .fetch_one(executor)
    .await?;
    Ok(status)
}

/// Put a failed message back in the queue with a fresh attempt budget.
/// Returns `false` unless the row exists and is `failed`.
pub async fn requeue_failed<'e, E>(executor: E, id: i64) -> Result<bool>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query(
        "UPDATE notifications SET status = 'pending', attempts = 0 WHERE id = ?1 AND status = 'failed'",
    )
    .bind(id)
    .execute(executor)
    .await?
    .rows_affected();
    Ok(rows == 1)
}

/// Outbox rows, newest first, optionally filtered by status.
pub async fn list<'e, E>(
    executor: E,
    status: Option<NotificationStatus>,
) -> Result<Vec<Notification>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT {NOTIFICATION_COLUMNS}
        FROM   notifications
        WHERE  ?1 IS NULL OR status = ?1
        ORDER  BY id DESC
        "#
    );
    let rows = sqlx::query_as::<_, Notification>(&sql)
        .bind(status)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn for_listing<'e, E>(executor: E, listing_id: i64) -> Result<Vec<Notification>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE listing_id = ?1 ORDER BY id ASC"
    );
    let rows = sqlx::query_as::<_, Notification>(&sql)
        .bind(listing_id)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::pool;

    fn message(to: &str) -> OutgoingMessage {
        OutgoingMessage {
            recipient: to.to_string(),
            subject: "Hello".to_string(),
            body: "<p>hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn failures_exhaust_attempts_then_requeue() {
        let pool = pool().await;
        let id = enqueue(&pool, None, &message("a@example.org"), 1).await.unwrap();

        assert_eq!(
            record_failure(&pool, id, "smtp down", 2).await.unwrap(),
            NotificationStatus::Pending
        );
        assert_eq!(
            record_failure(&pool, id, "smtp down", 2).await.unwrap(),
            NotificationStatus::Failed
        );
        assert!(pending_batch(&pool, 10).await.unwrap().is_empty());

        let failed = list(&pool, Some(NotificationStatus::Failed)).await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].attempts, 2);
        assert_eq!(failed[0].last_error.as_deref(), Some("smtp down"));

        assert!(requeue_failed(&pool, id).await.unwrap());
        assert!(!requeue_failed(&pool, id).await.unwrap());
        let pending = pending_batch(&pool, 10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].attempts, 0);
    }

    #[tokio::test]
    async fn batch_is_oldest_first_and_bounded() {
        let pool = pool().await;
        let first = enqueue(&pool, None, &message("1@example.org"), 1).await.unwrap();
        enqueue(&pool, None, &message("2@example.org"), 2).await.unwrap();
        enqueue(&pool, None, &message("3@example.org"), 3).await.unwrap();

        let batch = pending_batch(&pool, 2).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id, first);

        mark_sent(&pool, first, 9).await.unwrap();
        let sent = list(&pool, Some(NotificationStatus::Sent)).await.unwrap();
        assert_eq!(sent[0].sent_at, Some(9));
        assert_eq!(pending_batch(&pool, 10).await.unwrap().len(), 2);
    }
}
