//! Donation centres and blog posts.

use serde::Deserialize;
use sqlx::SqliteExecutor;

use crate::errors::{AppError, Result};
use crate::models::{BlogPost, DonationCenter};

#[derive(Debug, Clone, Deserialize)]
pub struct NewDonationCenter {
    pub volunteer_name: String,
    pub volunteer_mobile: String,
    pub center_name: String,
    pub location: String,
    pub donation_type: String,
    pub active_from: i64,
    pub active_until: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBlogPost {
    pub slug: String,
    pub title: String,
    pub author: String,
    pub summary: String,
    pub content: String,
    pub published_on: i64,
}

const CENTER_COLUMNS: &str = r#"
    id, volunteer_name, volunteer_mobile, center_name, location, donation_type,
    active_from, active_until, created_at
"#;

const BLOG_COLUMNS: &str = "id, slug, title, author, summary, content, published_on, created_at";

// ─────────────────────────────────────────────────────────
// Donation centres
// ─────────────────────────────────────────────────────────

pub async fn insert_center<'e, E>(
    executor: E,
    center: &NewDonationCenter,
    now: i64,
) -> Result<DonationCenter>
where
    E: SqliteExecutor<'e>,
{
    if center.active_until <= center.active_from {
        return Err(AppError::BadRequest(
            "active_until must be after active_from".to_string(),
        ));
    }

    let sql = format!(
        r#"
        INSERT INTO donation_centers
            (volunteer_name, volunteer_mobile, center_name, location, donation_type,
             active_from, active_until, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        RETURNING {CENTER_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, DonationCenter>(&sql)
        .bind(&center.volunteer_name)
        .bind(&center.volunteer_mobile)
        .bind(&center.center_name)
        .bind(&center.location)
        .bind(&center.donation_type)
        .bind(center.active_from)
        .bind(center.active_until)
        .bind(now)
        .fetch_one(executor)
        .await?;
    Ok(row)
}

/// Centres still open at `now`, soonest opening first.
pub async fn active_centers<'e, E>(executor: E, now: i64) -> Result<Vec<DonationCenter>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT {CENTER_COLUMNS} FROM donation_centers WHERE active_until > ?1 ORDER BY active_from ASC"
    );
    let rows = sqlx::query_as::<_, DonationCenter>(&sql)
        .bind(now)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

// ─────────────────────────────────────────────────────────
// Blog posts
// ─────────────────────────────────────────────────────────

pub async fn insert_blog<'e, E>(executor: E, post: &NewBlogPost, now: i64) -> Result<BlogPost>
where
    E: SqliteExecutor<'e>,
{
    if post.slug.trim().is_empty() || post.title.trim().is_empty() {
        return Err(AppError::BadRequest("slug and title are required".to_string()));
    }

    let sql = format!(
        r#"
        INSERT INTO blog_posts (slug, title, author, summary, content, published_on, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(slug) DO NOTHING
        RETURNING {BLOG_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, BlogPost>(&sql)
        .bind(post.slug.trim())
        .bind(&post.title)
        .bind(&post.author)
        .bind(&post.summary)
        .bind(&post.content)
        .bind(post.published_on)
        .bind(now)
        .fetch_optional(executor)
        .await?;

    row.ok_or_else(|| AppError::Conflict("Slug already exists".to_string()))
}

pub async fn get_blog<'e, E>(executor: E, slug: &str) -> Result<Option<BlogPost>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {BLOG_COLUMNS} FROM blog_posts WHERE slug = ?1");
    let row = sqlx::query_as::<_, BlogPost>(&sql)
        .bind(slug)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub async fn list_blogs<'e, E>(executor: E) -> Result<Vec<BlogPost>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {BLOG_COLUMNS} FROM blog_posts ORDER BY published_on DESC, id DESC");
    let rows = sqlx::query_as::<_, BlogPost>(&sql)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn delete_blog<'e, E>(executor: E, id: i64) -> Result<bool>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query("DELETE FROM blog_posts WHERE id = ?1")
        .bind(id)
        .execute(executor)
        .await?
        .rows_affected();
    Ok(rows == 1)
}
