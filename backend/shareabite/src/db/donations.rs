//! Donation queries. Rows are write-once; `payment_id` is unique.

use sqlx::SqliteExecutor;

use crate::errors::Result;
use crate::models::{Donation, Donor, NewDonation};

const DONATION_COLUMNS: &str = r#"
    id, amount_minor, currency, payment_id, order_id, signature, status,
    donor_id, donor_email, donor_name, provider_created_at, created_at
"#;

/// Insert a donation unless one already exists for the same payment id.
///
/// Returns `None` when the payment id was already recorded, so callers can
/// tell a fresh insert from a replay without relying on error codes.
pub async fn insert_donation<'e, E>(
    executor: E,
    donor: &Donor,
    donation: &NewDonation,
    now: i64,
) -> Result<Option<Donation>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO donations
            (amount_minor, currency, payment_id, order_id, signature, status,
             donor_id, donor_email, donor_name, provider_created_at, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(payment_id) DO NOTHING
        RETURNING {DONATION_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, Donation>(&sql)
        .bind(donation.amount_minor)
        .bind(&donation.currency)
        .bind(&donation.payment_id)
        .bind(&donation.order_id)
        .bind(&donation.signature)
        .bind(&donation.status)
        .bind(&donor.id)
        .bind(&donor.email)
        .bind(&donor.name)
        .bind(donation.provider_created_at)
        .bind(now)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub async fn get_by_payment_id<'e, E>(executor: E, payment_id: &str) -> Result<Option<Donation>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {DONATION_COLUMNS} FROM donations WHERE payment_id = ?1");
    let row = sqlx::query_as::<_, Donation>(&sql)
        .bind(payment_id)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

/// Every donation, newest first.
pub async fn list_donations<'e, E>(executor: E) -> Result<Vec<Donation>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {DONATION_COLUMNS} FROM donations ORDER BY created_at DESC, id DESC");
    let rows = sqlx::query_as::<_, Donation>(&sql)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

/// A donor's donations, newest first.
pub async fn list_for_donor<'e, E>(executor: E, donor_id: &str) -> Result<Vec<Donation>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT {DONATION_COLUMNS}
        FROM   donations
        WHERE  donor_id = ?1
        ORDER  BY created_at DESC, id DESC
        "#
    );
    let rows = sqlx::query_as::<_, Donation>(&sql)
        .bind(donor_id)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn latest_for_donor<'e, E>(executor: E, donor_id: &str) -> Result<Option<Donation>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        r#"
        SELECT {DONATION_COLUMNS}
        FROM   donations
        WHERE  donor_id = ?1
        ORDER  BY created_at DESC, id DESC
        LIMIT  1
        "#
    );
    let row = sqlx::query_as::<_, Donation>(&sql)
        .bind(donor_id)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub async fn count_for_payment<'e, E>(executor: E, payment_id: &str) -> Result<i64>
where
    E: SqliteExecutor<'e>,
{
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM donations WHERE payment_id = ?1")
        .bind(payment_id)
        .fetch_one(executor)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{donor, pool};
    use crate::db::upsert_donor;

    fn new_donation(payment_id: &str) -> NewDonation {
        NewDonation {
            amount_minor: 25_000,
            currency: "INR".to_string(),
            payment_id: payment_id.to_string(),
            order_id: "order_A".to_string(),
            signature: "sig".to_string(),
            status: "captured".to_string(),
            provider_created_at: Some(1_700_000_000),
        }
    }

    #[tokio::test]
    async fn second_insert_for_same_payment_is_ignored() {
        let pool = pool().await;
        let donor = donor();
        upsert_donor(&pool, &donor).await.unwrap();

        let first = insert_donation(&pool, &donor, &new_donation("pay_1"), 10)
            .await
            .unwrap();
        assert!(first.is_some());
        let second = insert_donation(&pool, &donor, &new_donation("pay_1"), 11)
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(count_for_payment(&pool, "pay_1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn latest_and_listing_order() {
        let pool = pool().await;
        let donor = donor();
        upsert_donor(&pool, &donor).await.unwrap();

        insert_donation(&pool, &donor, &new_donation("pay_old"), 10)
            .await
            .unwrap();
        insert_donation(&pool, &donor, &new_donation("pay_new"), 20)
            .await
            .unwrap();

        let latest = latest_for_donor(&pool, &donor.id).await.unwrap().unwrap();
        assert_eq!(latest.payment_id, "pay_new");
        let mine = list_for_donor(&pool, &donor.id).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(list_donations(&pool).await.unwrap()[1].payment_id, "pay_old");
        assert!(latest_for_donor(&pool, "nobody").await.unwrap().is_none());
    }
}
