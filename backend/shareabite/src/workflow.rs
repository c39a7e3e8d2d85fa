//! Donor and admin write paths: listing creation, volunteer assignment,
//! delivery, order creation and payment verification.
//!
//! Listing transitions follow one shape. The first statement of the
//! transaction is the conditional `UPDATE … WHERE status = <predecessor>`, so
//! the write lock is taken before anything is read and concurrent admin
//! requests queue behind it. When no row matches, the listing is re-read
//! to report `NotFound` or `InvalidState`.

use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{info, warn};

use crate::db::{self, donations, listings, outbox, volunteers};
use crate::errors::{AppError, Result};
use crate::lifecycle::Transition;
use crate::models::{Donation, Donor, FoodListing, NewDonation, NewListing, VolunteerContact};
use crate::notify;
use crate::payments::{self, Order, PaymentGateway};

/// Result of binding a volunteer to a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub listing: FoodListing,
    pub volunteer: VolunteerContact,
}

/// Store a donor's new listing in `REQUESTED` status.
pub async fn create_listing(
    pool: &SqlitePool,
    donor: &Donor,
    listing: NewListing,
) -> Result<FoodListing> {
    let mut tx = pool.begin().await?;
    db::upsert_donor(&mut *tx, donor).await?;
    let created = listings::insert_listing(&mut *tx, &donor.id, &listing, db::unix_now()).await?;
    tx.commit().await?;

    info!(listing = created.id, donor = %donor.id, "Food listing created");
    Ok(created)
}

/// Bind an active volunteer to a `REQUESTED` listing and queue both
/// assignment emails in the same transaction.
pub async fn assign_volunteer(
    pool: &SqlitePool,
    listing_id: i64,
    volunteer_id: i64,
) -> Result<Assignment> {
    let mut tx = pool.begin().await?;
    let now = db::unix_now();

    if !listings::apply_transition(&mut *tx, listing_id, Transition::Assign, Some(volunteer_id), now)
        .await?
    {
        return Err(rejected_assignment(&mut tx, listing_id, volunteer_id).await);
    }

    let listing = listings::get_listing(&mut *tx, listing_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Food listing".to_string()))?;
    let volunteer = volunteers::get_volunteer(&mut *tx, volunteer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Volunteer".to_string()))?;
    let donor = db::get_donor(&mut *tx, &listing.donor_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Donor".to_string()))?;

    for message in notify::assignment_messages(&listing, &volunteer, &donor) {
        outbox::enqueue(&mut *tx, Some(listing_id), &message, now).await?;
    }
    tx.commit().await?;

    info!(
        listing = listing_id,
        volunteer = volunteer_id,
        "Volunteer assigned, notifications queued"
    );
    Ok(Assignment {
        volunteer: VolunteerContact::from(&volunteer),
        listing,
    })
}

/// Explain why the conditional assignment matched no row.
async fn rejected_assignment(
    tx: &mut Transaction<'_, Sqlite>,
    listing_id: i64,
    volunteer_id: i64,
) -> AppError {
    let listing = match listings::get_listing(&mut **tx, listing_id).await {
        Ok(Some(listing)) => listing,
        Ok(None) => return AppError::NotFound("Food listing".to_string()),
        Err(e) => return e,
    };
    let volunteer = match volunteers::get_volunteer(&mut **tx, volunteer_id).await {
        Ok(Some(volunteer)) => volunteer,
        Ok(None) => return AppError::NotFound("Volunteer".to_string()),
        Err(e) => return e,
    };

    if !volunteer.is_active {
        return AppError::InvalidState(format!("volunteer {volunteer_id} is not active"));
    }
    match listing.status.apply(Transition::Assign) {
        Err(e) => e,
        Ok(_) => AppError::InvalidState(format!(
            "listing {listing_id} changed status concurrently"
        )),
    }
}

/// Move an `ASSIGNED` listing to `DISTRIBUTED`, keeping its volunteer.
pub async fn mark_delivered(pool: &SqlitePool, listing_id: i64) -> Result<FoodListing> {
    let mut tx = pool.begin().await?;

    if !listings::apply_transition(&mut *tx, listing_id, Transition::Deliver, None, db::unix_now())
        .await?
    {
        let listing = listings::get_listing(&mut *tx, listing_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Food listing".to_string()))?;
        listing.status.apply(Transition::Deliver)?;
        return Err(AppError::InvalidState(format!(
            "listing {listing_id} changed status concurrently"
        )));
    }

    let listing = listings::get_listing(&mut *tx, listing_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Food listing".to_string()))?;
    tx.commit().await?;

    info!(listing = listing_id, "Food listing marked as distributed");
    Ok(listing)
}

// ─────────────────────────────────────────────────────────
// Payments
// ─────────────────────────────────────────────────────────

/// Create a provider order for `amount` major units.
pub async fn create_order(gateway: &PaymentGateway, amount: f64) -> Result<Order> {
    let amount_minor = payments::to_minor_units(amount)?;
    let receipt = format!("receipt_{}", chrono::Utc::now().timestamp_millis());
    let order = gateway.create_order(amount_minor, &receipt).await?;

    info!(order = %order.id, amount = order.amount, "Payment order created");
    Ok(order)
}

/// Fields posted by the checkout widget after a successful payment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentCallback {
    #[serde(default)]
    pub razorpay_payment_id: String,
    #[serde(default)]
    pub razorpay_order_id: String,
    #[serde(default)]
    pub razorpay_signature: String,
}

impl PaymentCallback {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            &self.razorpay_payment_id,
            &self.razorpay_order_id,
            &self.razorpay_signature,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(AppError::BadRequest("Missing payment details".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifiedDonation {
    pub donation: Donation,
    /// `true` when the donation had already been recorded by an earlier call.
    pub replayed: bool,
}

/// An existing row for the same payment is a replay only if it belongs to
/// the same order and donor.
fn replay_of(existing: Donation, order_id: &str, donor: &Donor) -> Result<VerifiedDonation> {
    if existing.order_id == order_id && existing.donor_id == donor.id {
        Ok(VerifiedDonation {
            donation: existing,
            replayed: true,
        })
    } else {
        warn!(
            payment = %existing.payment_id,
            order = order_id,
            donor = %donor.id,
            "Payment already recorded for a different order or donor"
        );
        Err(AppError::DuplicateDonation(existing.payment_id))
    }
}

/// Verify a checkout callback and record the donation exactly once.
pub async fn verify_payment(
    pool: &SqlitePool,
    gateway: &PaymentGateway,
    donor: &Donor,
    callback: PaymentCallback,
) -> Result<VerifiedDonation> {
    callback.validate()?;
    let payment_id = callback.razorpay_payment_id.trim();
    let order_id = callback.razorpay_order_id.trim();

    if let Err(e) = gateway.verify_signature(order_id, payment_id, &callback.razorpay_signature) {
        warn!(payment = payment_id, order = order_id, "Rejected payment signature");
        return Err(e);
    }

    if let Some(existing) = donations::get_by_payment_id(pool, payment_id).await? {
        let verified = replay_of(existing, order_id, donor)?;
        info!(payment = payment_id, "Donation replayed");
        return Ok(verified);
    }

    let payment = gateway.fetch_payment(payment_id).await?;
    if let Some(provider_order) = payment.order_id.as_deref() {
        if provider_order != order_id {
            return Err(AppError::BadRequest(format!(
                "payment {payment_id} does not belong to order {order_id}"
            )));
        }
    }

    let new_donation = NewDonation {
        amount_minor: payment.amount,
        currency: payment.currency,
        payment_id: payment_id.to_string(),
        order_id: order_id.to_string(),
        signature: callback.razorpay_signature.trim().to_string(),
        status: payment.status,
        provider_created_at: payment.created_at,
    };

    let mut tx = pool.begin().await?;
    db::upsert_donor(&mut *tx, donor).await?;
    let inserted =
        donations::insert_donation(&mut *tx, donor, &new_donation, db::unix_now()).await?;
    tx.commit().await?;

    match inserted {
        Some(donation) => {
            info!(
                donation = donation.id,
                payment = payment_id,
                amount = donation.amount_minor,
                "Donation recorded"
            );
            Ok(VerifiedDonation {
                donation,
                replayed: false,
            })
        }
        None => {
            // Lost the insert race to a concurrent callback.
            let existing = donations::get_by_payment_id(pool, payment_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Donation".to_string()))?;
            replay_of(existing, order_id, donor)
        }
    }
}
