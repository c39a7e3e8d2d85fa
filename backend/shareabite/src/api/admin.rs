//! Admin endpoints. Everything except `login` requires a live session token.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use super::extract::{Json, Path, Query};
use super::{data, ApiState};
use crate::auth;
use crate::db::{self, content, donations, listings, outbox, volunteers};
use crate::errors::{AppError, Result};
use crate::lifecycle::ListingStatus;
use crate::models::{NewVolunteer, NotificationStatus};
use crate::workflow;

// ─────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub expires_at: i64,
}

/// `POST /admin/login`
pub async fn login(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }
    let session = auth::login(&state.pool, &state.config, &body.email, &body.password).await?;

    Ok(Json(LoginResponse {
        success: true,
        token: session.token,
        expires_at: session.expires_at,
    }))
}

/// `POST /admin/logout`
pub async fn logout(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let revoked = auth::logout(&state.pool, &headers).await?;
    Ok(Json(serde_json::json!({ "success": true, "revoked": revoked })))
}

// ─────────────────────────────────────────────────────────
// Listings
// ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ListingFilter {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct AssignRequest {
    #[serde(default, alias = "volunteerId")]
    pub volunteer_id: Option<i64>,
}

/// `GET /admin/listings?status=`
pub async fn list_listings(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(filter): Query<ListingFilter>,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.pool, &headers).await?;

    let status = match filter.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            ListingStatus::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid status: {raw}")))?,
        ),
    };
    Ok(data(listings::list_with_donor(&state.pool, status).await?))
}

/// `PUT /admin/listings/:id/assign`
pub async fn assign_volunteer(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<AssignRequest>,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.pool, &headers).await?;

    let volunteer_id = body
        .volunteer_id
        .ok_or_else(|| AppError::BadRequest("Volunteer ID is required".to_string()))?;
    let assignment = workflow::assign_volunteer(&state.pool, id, volunteer_id).await?;
    Ok(data(assignment))
}

/// `PUT /admin/listings/:id/deliver`
pub async fn mark_delivered(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.pool, &headers).await?;
    Ok(data(workflow::mark_delivered(&state.pool, id).await?))
}

// ─────────────────────────────────────────────────────────
// Volunteers
// ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VolunteerFilter {
    #[serde(default, alias = "isActive")]
    pub is_active: Option<bool>,
}

#[derive(Deserialize)]
pub struct ActiveRequest {
    #[serde(alias = "isActive")]
    pub is_active: bool,
}

/// `GET /admin/volunteers[?isActive=]`
pub async fn list_volunteers(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(filter): Query<VolunteerFilter>,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.pool, &headers).await?;

    let rows = match filter.is_active {
        Some(active) => volunteers::list_by_active(&state.pool, active).await?,
        None => volunteers::list_volunteers(&state.pool).await?,
    };
    Ok(data(rows))
}

/// `POST /admin/volunteers`
pub async fn create_volunteer(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<NewVolunteer>,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.pool, &headers).await?;
    body.validate()?;

    let volunteer = volunteers::insert_volunteer(&state.pool, &body, db::unix_now()).await?;
    tracing::info!(volunteer = volunteer.id, "Volunteer registered");
    Ok((StatusCode::CREATED, data(volunteer)))
}

/// `PUT /admin/volunteers/:id/active`
pub async fn set_volunteer_active(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<ActiveRequest>,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.pool, &headers).await?;

    if !volunteers::set_active(&state.pool, id, body.is_active).await? {
        return Err(AppError::NotFound("Volunteer".to_string()));
    }
    let volunteer = volunteers::get_volunteer(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Volunteer".to_string()))?;
    Ok(data(volunteer))
}

// ─────────────────────────────────────────────────────────
// Donations, centres, blogs
// ─────────────────────────────────────────────────────────

/// `GET /admin/donations`
pub async fn list_donations(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.pool, &headers).await?;
    Ok(data(donations::list_donations(&state.pool).await?))
}

/// `POST /admin/centers`
pub async fn create_center(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<content::NewDonationCenter>,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.pool, &headers).await?;
    let center = content::insert_center(&state.pool, &body, db::unix_now()).await?;
    Ok((StatusCode::CREATED, data(center)))
}

/// `POST /admin/blogs`
pub async fn create_blog(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(body): Json<content::NewBlogPost>,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.pool, &headers).await?;
    let post = content::insert_blog(&state.pool, &body, db::unix_now()).await?;
    Ok((StatusCode::CREATED, data(post)))
}

/// `DELETE /admin/blogs/:id`
pub async fn delete_blog(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.pool, &headers).await?;

    if !content::delete_blog(&state.pool, id).await? {
        return Err(AppError::NotFound("Blog post".to_string()));
    }
    Ok(Json(serde_json::json!({ "success": true, "deleted": id })))
}

// ─────────────────────────────────────────────────────────
// Notification outbox
// ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NotificationFilter {
    pub status: Option<NotificationStatus>,
}

/// `GET /admin/notifications[?status=]`
pub async fn list_notifications(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Query(filter): Query<NotificationFilter>,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.pool, &headers).await?;
    Ok(data(outbox::list(&state.pool, filter.status).await?))
}

/// `POST /admin/notifications/:id/retry`
pub async fn retry_notification(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    auth::require_admin(&state.pool, &headers).await?;

    if !outbox::requeue_failed(&state.pool, id).await? {
        return Err(AppError::NotFound("Failed notification".to_string()));
    }
    Ok(Json(serde_json::json!({ "success": true, "requeued": id })))
}
