//! Volunteer registry queries.

use sqlx::SqliteExecutor;

use crate::errors::{AppError, Result};
use crate::models::{NewVolunteer, Volunteer};

const VOLUNTEER_COLUMNS: &str =
    "id, full_name, email, mobile, gender, area, address, pincode, is_active, created_at";

/// Register an active volunteer. A taken email is a [`AppError::Conflict`].
pub async fn insert_volunteer<'e, E>(
    executor: E,
    volunteer: &NewVolunteer,
    now: i64,
) -> Result<Volunteer>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO volunteers
            (full_name, email, mobile, gender, area, address, pincode, is_active, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)
        ON CONFLICT(email) DO NOTHING
        RETURNING {VOLUNTEER_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, Volunteer>(&sql)
        .bind(volunteer.full_name.trim())
        .bind(volunteer.email.trim())
        .bind(volunteer.mobile.trim())
        .bind(volunteer.gender.trim())
        .bind(volunteer.area.trim())
        .bind(volunteer.address.trim())
        .bind(volunteer.pincode.trim())
        .bind(now)
        .fetch_optional(executor)
        .await?;

    row.ok_or_else(|| {
        AppError::Conflict("Volunteer with this email already exists".to_string())
    })
}

pub async fn get_volunteer<'e, E>(executor: E, id: i64) -> Result<Option<Volunteer>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {VOLUNTEER_COLUMNS} FROM volunteers WHERE id = ?1");
    let row = sqlx::query_as::<_, Volunteer>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

/// All volunteers, newest first.
pub async fn list_volunteers<'e, E>(executor: E) -> Result<Vec<Volunteer>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {VOLUNTEER_COLUMNS} FROM volunteers ORDER BY created_at DESC, id DESC");
    let rows = sqlx::query_as::<_, Volunteer>(&sql)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

/// Volunteers with the given active flag, by name.
pub async fn list_by_active<'e, E>(executor: E, is_active: bool) -> Result<Vec<Volunteer>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT {VOLUNTEER_COLUMNS} FROM volunteers WHERE is_active = ?1 ORDER BY full_name ASC"
    );
    let rows = sqlx::query_as::<_, Volunteer>(&sql)
        .bind(is_active)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

/// Flip a volunteer's availability. Returns `false` if the id is unknown.
pub async fn set_active<'e, E>(executor: E, id: i64, is_active: bool) -> Result<bool>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query("UPDATE volunteers SET is_active = ?1 WHERE id = ?2")
        .bind(is_active)
        .bind(id)
        .execute(executor)
        .await?
        .rows_affected();
    Ok(rows == 1)
}
