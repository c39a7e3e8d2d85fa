//! Database layer: pool setup, migrations, and per-table queries.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::info;

use crate::errors::Result;
use crate::models::Donor;

pub mod content;
pub mod donations;
pub mod listings;
pub mod outbox;
pub mod sessions;
pub mod volunteers;

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    let options = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

/// Single-connection in-memory pool with migrations applied.
///
/// Each in-memory SQLite connection is its own database, so the pool must
/// never open a second connection or recycle the first.
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Current wall-clock time as Unix seconds.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Insert the donor or refresh their email and name.
pub async fn upsert_donor<'e, E>(executor: E, donor: &Donor) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO users (id, email, name)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(id) DO UPDATE SET email = excluded.email, name = excluded.name
        "#,
    )
    .bind(&donor.id)
    .bind(&donor.email)
    .bind(&donor.name)
    .execute(executor)
    .await?;
    Ok(())
}

/// Look up a donor by id.
pub async fn get_donor<'e, E>(executor: E, id: &str) -> Result<Option<Donor>>
where
    E: SqliteExecutor<'e>,
{
    let row: Option<(String, String, Option<String>)> =
        sqlx::query_as("SELECT id, email, name FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
    Ok(row.map(|(id, email, name)| Donor { id, email, name }))
}
