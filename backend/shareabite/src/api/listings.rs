//! Donor listing endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDate};

use super::extract::Path;
use super::{data, ApiState};
use crate::auth;
use crate::db::listings;
use crate::errors::{AppError, Result};
use crate::models::{Address, ListingImage, NewListing};
use crate::workflow;

/// `POST /listings`
///
/// Multipart form with the listing fields and one `image` part. Field names
/// are matched without regard to case or underscores, so `postalCode` and
/// `postal_code` are the same field.
pub async fn create_listing(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let donor = auth::donor_from_headers(&headers)?;
    let listing = read_listing_form(multipart?).await?;
    let created = workflow::create_listing(&state.pool, &donor, listing).await?;
    Ok((StatusCode::CREATED, data(created)))
}

/// `GET /listings/mine`
pub async fn my_listings(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let donor = auth::donor_from_headers(&headers)?;
    let rows = listings::list_for_donor(&state.pool, &donor.id).await?;
    Ok(data(rows))
}

/// `GET /listings/:id/image`
pub async fn listing_image(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let image = listings::get_image(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, image.mime_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        image.data,
    ))
}

// ─────────────────────────────────────────────────────────
// Form parsing
// ─────────────────────────────────────────────────────────

fn field_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_ascii_lowercase()
}

async fn read_listing_form(mut multipart: Multipart) -> Result<NewListing> {
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        let key = field_key(field.name().unwrap_or(""));
        if key == "image" {
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read image: {e}")))?;
            image = Some(ListingImage {
                mime_type,
                data: bytes.to_vec(),
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read field: {e}")))?;
            fields.insert(key, value.trim().to_string());
        }
    }

    let mut take = |key: &str| fields.remove(key).filter(|v| !v.is_empty());
    let missing = || AppError::BadRequest("Missing required fields".to_string());

    let name = take("name").ok_or_else(missing)?;
    let description = take("description").ok_or_else(missing)?;
    let quantity = take("quantity").ok_or_else(missing)?;
    let expiration = take("expirationdate").ok_or_else(missing)?;
    let address = Address {
        street: take("street").ok_or_else(missing)?,
        city: take("city").ok_or_else(missing)?,
        state: take("state").ok_or_else(missing)?,
        postal_code: take("postalcode").ok_or_else(missing)?,
        landmark: take("landmark"),
    };

    let image = image
        .filter(|i| !i.data.is_empty())
        .ok_or_else(|| AppError::BadRequest("Image is required".to_string()))?;
    if !image.mime_type.starts_with("image/") {
        return Err(AppError::BadRequest("Image must be an image file".to_string()));
    }

    Ok(NewListing {
        name,
        description,
        quantity: parse_quantity(&quantity)?,
        expiration_at: parse_expiration(&expiration)?,
        address,
        image: Some(image),
    })
}

fn parse_quantity(raw: &str) -> Result<i64> {
    match raw.parse::<i64>() {
        Ok(q) if q > 0 => Ok(q),
        _ => Err(AppError::BadRequest(
            "Quantity must be a positive integer".to_string(),
        )),
    }
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` taken as midnight UTC.
fn parse_expiration(raw: &str) -> Result<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| AppError::BadRequest("Invalid expiration date".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_keys_ignore_case_and_underscores() {
        assert_eq!(field_key("postalCode"), "postalcode");
        assert_eq!(field_key("postal_code"), "postalcode");
        assert_eq!(field_key("expirationDate"), "expirationdate");
    }

    #[test]
    fn quantity_must_be_positive() {
        assert_eq!(parse_quantity("12").unwrap(), 12);
        for bad in ["0", "-3", "1.5", "many"] {
            assert!(matches!(parse_quantity(bad), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn expiration_accepts_date_or_rfc3339() {
        assert_eq!(parse_expiration("2024-01-01").unwrap(), 1_704_067_200);
        assert_eq!(
            parse_expiration("2024-01-01T05:30:00+05:30").unwrap(),
            1_704_067_200
        );
        assert!(matches!(
            parse_expiration("01/01/2024"),
            Err(AppError::BadRequest(_))
        ));
    }
}
