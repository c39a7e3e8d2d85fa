//! Server-side admin sessions.

use sqlx::SqliteExecutor;

use crate::errors::Result;
use crate::models::AdminSession;

pub async fn insert_session<'e, E>(executor: E, session: &AdminSession) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO admin_sessions (token, email, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(&session.token)
    .bind(&session.email)
    .bind(session.created_at)
    .bind(session.expires_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// The session for `token` if it has not expired at `now`.
pub async fn find_live<'e, E>(executor: E, token: &str, now: i64) -> Result<Option<AdminSession>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query_as::<_, AdminSession>(
        r#"
        SELECT token, email, created_at, expires_at
        FROM   admin_sessions
        WHERE  token = ?1 AND expires_at > ?2
        "#,
    )
    .bind(token)
    .bind(now)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

pub async fn delete_session<'e, E>(executor: E, token: &str) -> Result<bool>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query("DELETE FROM admin_sessions WHERE token = ?1")
        .bind(token)
        .execute(executor)
        .await?
        .rows_affected();
    Ok(rows == 1)
}

pub async fn purge_expired<'e, E>(executor: E, now: i64) -> Result<u64>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= ?1")
        .bind(now)
        .execute(executor)
        .await?
        .rows_affected();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::pool;

    fn session(token: &str, expires_at: i64) -> AdminSession {
        AdminSession {
            token: token.to_string(),
            email: "admin@example.org".to_string(),
            created_at: 0,
            expires_at,
        }
    }

    #[tokio::test]
    async fn expiry_is_checked_against_server_time() {
        let pool = pool().await;
        insert_session(&pool, &session("t1", 100)).await.unwrap();

        assert!(find_live(&pool, "t1", 99).await.unwrap().is_some());
        assert!(find_live(&pool, "t1", 100).await.unwrap().is_none());
        assert!(find_live(&pool, "other", 0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purge_and_delete() {
        let pool = pool().await;
        insert_session(&pool, &session("old", 10)).await.unwrap();
        insert_session(&pool, &session("new", 1_000)).await.unwrap();

        assert_eq!(purge_expired(&pool, 50).await.unwrap(), 1);
        assert!(delete_session(&pool, "new").await.unwrap());
        assert!(!delete_session(&pool, "new").await.unwrap());
    }
}
