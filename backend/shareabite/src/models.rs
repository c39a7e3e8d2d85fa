//! Records stored in / read from the database, and the payloads that create them.

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};
use crate::lifecycle::ListingStatus;

// ─────────────────────────────────────────────────────────
// Donors
// ─────────────────────────────────────────────────────────

/// Identity of the signed-in donor, as forwarded by the auth gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donor {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Food listings
// ─────────────────────────────────────────────────────────

/// Pickup address of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub landmark: Option<String>,
}

impl Address {
    pub fn one_line(&self) -> String {
        let mut line = format!("{}, {}, {} - {}", self.street, self.city, self.state, self.postal_code);
        if let Some(landmark) = self.landmark.as_deref().filter(|l| !l.is_empty()) {
            line.push_str(&format!(" (near {landmark})"));
        }
        line
    }
}

/// A food listing row. Image bytes are never loaded into this struct.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FoodListing {
    pub id: i64,
    pub donor_id: String,
    pub name: String,
    pub description: String,
    pub quantity: i64,
    pub expiration_at: i64,
    pub status: ListingStatus,
    pub volunteer_id: Option<i64>,
    #[sqlx(flatten)]
    pub address: Address,
    pub image_mime_type: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Listing joined with its donor, for the admin views.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ListingWithDonor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub listing: FoodListing,
    pub donor_email: String,
    pub donor_name: Option<String>,
}

/// Validated input for a new listing.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub name: String,
    pub description: String,
    pub quantity: i64,
    pub expiration_at: i64,
    pub address: Address,
    pub image: Option<ListingImage>,
}

#[derive(Debug, Clone)]
pub struct ListingImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

// ─────────────────────────────────────────────────────────
// Volunteers
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Volunteer {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub gender: String,
    pub area: String,
    pub address: String,
    pub pincode: String,
    pub is_active: bool,
    pub created_at: i64,
}

/// Contact card returned alongside an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolunteerContact {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
}

impl From<&Volunteer> for VolunteerContact {
    fn from(v: &Volunteer) -> Self {
        Self {
            id: v.id,
            full_name: v.full_name.clone(),
            email: v.email.clone(),
            mobile: v.mobile.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVolunteer {
    #[serde(default, alias = "full_name")]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub pincode: String,
}

impl NewVolunteer {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            &self.full_name,
            &self.email,
            &self.mobile,
            &self.gender,
            &self.area,
            &self.address,
            &self.pincode,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(AppError::BadRequest("Missing required fields".to_string()));
        }
        if !self.email.contains('@') {
            return Err(AppError::BadRequest("Invalid email".to_string()));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────
// Donations
// ─────────────────────────────────────────────────────────

/// A monetary donation recorded after payment verification. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Donation {
    pub id: i64,
    /// Amount in minor currency units (paise for INR).
    pub amount_minor: i64,
    pub currency: String,
    pub payment_id: String,
    pub order_id: String,
    #[serde(skip_serializing)]
    pub signature: String,
    pub status: String,
    pub donor_id: String,
    pub donor_email: String,
    pub donor_name: Option<String>,
    pub provider_created_at: Option<i64>,
    pub created_at: i64,
}

/// Fields for a donation about to be inserted.
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub amount_minor: i64,
    pub currency: String,
    pub payment_id: String,
    pub order_id: String,
    pub signature: String,
    pub status: String,
    pub provider_created_at: Option<i64>,
}

// ─────────────────────────────────────────────────────────
// Notification outbox
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub listing_id: Option<i64>,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub status: NotificationStatus,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: i64,
    pub sent_at: Option<i64>,
}

/// An email waiting to be written to the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

// ─────────────────────────────────────────────────────────
// Admin sessions
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminSession {
    pub token: String,
    pub email: String,
    pub created_at: i64,
    pub expires_at: i64,
}

// ─────────────────────────────────────────────────────────
// Donation centres and blog posts
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DonationCenter {
    pub id: i64,
    pub volunteer_name: String,
    pub volunteer_mobile: String,
    pub center_name: String,
    pub location: String,
    pub donation_type: String,
    pub active_from: i64,
    pub active_until: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlogPost {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub author: String,
    pub summary: String,
    pub content: String,
    pub published_on: i64,
    pub created_at: i64,
}
