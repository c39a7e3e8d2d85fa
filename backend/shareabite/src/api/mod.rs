//! Axum REST API: router assembly and shared response shapes.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::payments::PaymentGateway;

pub mod admin;
pub mod content;
pub mod extract;
pub mod listings;
pub mod payments;

/// Largest accepted request body (listing images included).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub struct ApiState {
    pub pool: SqlitePool,
    pub gateway: PaymentGateway,
    pub config: Arc<Config>,
}

pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Donor
        .route("/listings", post(listings::create_listing))
        .route("/listings/mine", get(listings::my_listings))
        .route("/listings/:id/image", get(listings::listing_image))
        .route("/payments/orders", post(payments::create_order))
        .route("/payments/verify", post(payments::verify_payment))
        .route("/donations/mine", get(payments::my_donations))
        .route("/donations/latest", get(payments::latest_donation))
        .route("/centers/active", get(content::active_centers))
        .route("/blogs", get(content::list_blogs))
        .route("/blogs/:slug", get(content::get_blog))
        // Admin
        .route("/admin/login", post(admin::login))
        .route("/admin/logout", post(admin::logout))
        .route("/admin/listings", get(admin::list_listings))
        .route("/admin/listings/:id/assign", put(admin::assign_volunteer))
        .route("/admin/listings/:id/deliver", put(admin::mark_delivered))
        .route(
            "/admin/volunteers",
            get(admin::list_volunteers).post(admin::create_volunteer),
        )
        .route("/admin/volunteers/:id/active", put(admin::set_volunteer_active))
        .route("/admin/donations", get(admin::list_donations))
        .route("/admin/centers", post(admin::create_center))
        .route("/admin/blogs", post(admin::create_blog))
        .route("/admin/blogs/:id", delete(admin::delete_blog))
        .route("/admin/notifications", get(admin::list_notifications))
        .route("/admin/notifications/:id/retry", post(admin::retry_notification))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// `{ "success": true, "data": … }`
#[derive(Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn data<T: Serialize>(data: T) -> Json<DataResponse<T>> {
    Json(DataResponse {
        success: true,
        data,
    })
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
