//! Order creation, checkout verification and donor donation history.

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, response::IntoResponse};
use serde::{Deserialize, Serialize};

use super::extract::Json;
use super::{data, ApiState};
use crate::auth;
use crate::db::donations;
use crate::errors::{AppError, Result};
use crate::workflow::{self, PaymentCallback};

#[derive(Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub message: &'static str,
    pub donation_id: i64,
    pub payment_id: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub replayed: bool,
}

/// `POST /payments/orders`
pub async fn create_order(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<OrderRequest>,
) -> Result<impl IntoResponse> {
    let amount = body
        .amount
        .ok_or_else(|| AppError::BadRequest("Invalid amount".to_string()))?;
    let order = workflow::create_order(&state.gateway, amount).await?;

    Ok(Json(OrderResponse {
        id: order.id,
        amount: order.amount,
        currency: order.currency,
    }))
}

/// `POST /payments/verify`
pub async fn verify_payment(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(callback): Json<PaymentCallback>,
) -> Result<impl IntoResponse> {
    let donor = auth::donor_from_headers(&headers)?;
    let verified = workflow::verify_payment(&state.pool, &state.gateway, &donor, callback).await?;

    Ok(Json(VerifyResponse {
        success: true,
        message: "Payment verified successfully",
        donation_id: verified.donation.id,
        payment_id: verified.donation.payment_id,
        amount: verified.donation.amount_minor,
        currency: verified.donation.currency,
        replayed: verified.replayed,
    }))
}

/// `GET /donations/mine`
pub async fn my_donations(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let donor = auth::donor_from_headers(&headers)?;
    Ok(data(donations::list_for_donor(&state.pool, &donor.id).await?))
}

/// `GET /donations/latest`
pub async fn latest_donation(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let donor = auth::donor_from_headers(&headers)?;
    let latest = donations::latest_for_donor(&state.pool, &donor.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Donation".to_string()))?;
    Ok(data(latest))
}
