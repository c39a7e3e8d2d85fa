//! Food listing queries.

use sqlx::SqliteExecutor;

use crate::errors::Result;
use crate::lifecycle::{ListingStatus, Transition};
use crate::models::{FoodListing, ListingImage, ListingWithDonor, NewListing};

const LISTING_COLUMNS: &str = r#"
    l.id, l.donor_id, l.name, l.description, l.quantity, l.expiration_at,
    l.status, l.volunteer_id, l.street, l.city, l.state, l.postal_code,
    l.landmark, l.image_mime_type, l.created_at, l.updated_at
"#;

// RETURNING clauses cannot use a table alias.
const RETURNING_COLUMNS: &str = r#"
    id, donor_id, name, description, quantity, expiration_at,
    status, volunteer_id, street, city, state, postal_code,
    landmark, image_mime_type, created_at, updated_at
"#;

/// Insert a new listing in `REQUESTED` status and return it.
pub async fn insert_listing<'e, E>(
    executor: E,
    donor_id: &str,
    listing: &NewListing,
    now: i64,
) -> Result<FoodListing>
where
    E: SqliteExecutor<'e>,
{
    let (mime, data) = match &listing.image {
        Some(ListingImage { mime_type, data }) => (Some(mime_type.as_str()), Some(data.as_slice())),
        None => (None, None),
    };

    let sql = format!(
        r#"
        INSERT INTO food_listings
            (donor_id, name, description, quantity, expiration_at, status,
             street, city, state, postal_code, landmark,
             image_data, image_mime_type, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
        RETURNING {RETURNING_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, FoodListing>(&sql)
        .bind(donor_id)
        .bind(&listing.name)
        .bind(&listing.description)
        .bind(listing.quantity)
        .bind(listing.expiration_at)
        .bind(ListingStatus::Requested)
        .bind(&listing.address.street)
        .bind(&listing.address.city)
        .bind(&listing.address.state)
        .bind(&listing.address.postal_code)
        .bind(&listing.address.landmark)
        .bind(data)
        .bind(mime)
        .bind(now)
        .fetch_one(executor)
        .await?;
    Ok(row)
}

/// Fetch one listing by id.
pub async fn get_listing<'e, E>(executor: E, id: i64) -> Result<Option<FoodListing>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {LISTING_COLUMNS} FROM food_listings l WHERE l.id = ?1");
    let row = sqlx::query_as::<_, FoodListing>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

/// Listings with their donor, newest first, optionally filtered by status.
pub async fn list_with_donor<'e, E>(
    executor: E,
    status: Option<ListingStatus>,
) -> Result<Vec<ListingWithDonor>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT {LISTING_COLUMNS}, u.email AS donor_email, u.name AS donor_name
        FROM   food_listings l
        JOIN   users u ON u.id = l.donor_id
        WHERE  ?1 IS NULL OR l.status = ?1
        ORDER  BY l.created_at DESC, l.id DESC
        "#
    );
    let rows = sqlx::query_as::<_, ListingWithDonor>(&sql)
        .bind(status)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

/// A donor's own listings, newest first.
pub async fn list_for_donor<'e, E>(executor: E, donor_id: &str) -> Result<Vec<FoodListing>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT {LISTING_COLUMNS}
        FROM   food_listings l
        WHERE  l.donor_id = ?1
        ORDER  BY l.created_at DESC, l.id DESC
        "#
    );
    let rows = sqlx::query_as::<_, FoodListing>(&sql)
        .bind(donor_id)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

/// Raw image bytes and MIME type, if the listing exists and has an image.
pub async fn get_image<'e, E>(executor: E, id: i64) -> Result<Option<ListingImage>>
where
    E: SqliteExecutor<'e>,
{
    let row: Option<(Option<Vec<u8>>, Option<String>)> =
        sqlx::query_as("SELECT image_data, image_mime_type FROM food_listings WHERE id = ?1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

    Ok(match row {
        Some((Some(data), mime)) => Some(ListingImage {
            mime_type: mime.unwrap_or_else(|| "application/octet-stream".to_string()),
            data,
        }),
        _ => None,
    })
}

/// Apply `transition` only if the listing is still in its predecessor status.
///
/// `volunteer_id` replaces the binding when given and keeps the current one
/// otherwise; a given volunteer must exist and be active. Returns `false`
/// when no row matched, i.e. the listing is missing, its status moved on, or
/// the volunteer cannot take it.
pub async fn apply_transition<'e, E>(
    executor: E,
    id: i64,
    transition: Transition,
    volunteer_id: Option<i64>,
    now: i64,
) -> Result<bool>
where
    E: SqliteExecutor<'e>,
{
    let rows_affected = sqlx::query(
        r#"
        UPDATE food_listings
        SET    status       = ?1,
               volunteer_id = COALESCE(?2, volunteer_id),
               updated_at   = ?3
        WHERE  id = ?4
          AND  status = ?5
          AND  (?2 IS NULL OR EXISTS (
                   SELECT 1 FROM volunteers WHERE id = ?2 AND is_active = 1
               ))
        "#,
    )
    .bind(transition.to_status())
    .bind(volunteer_id)
    .bind(now)
    .bind(id)
    .bind(transition.from_status())
    .execute(executor)
    .await?
    .rows_affected();

    Ok(rows_affected == 1)
}
