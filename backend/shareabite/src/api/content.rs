//! Public read-only content: donation centres and blog posts.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse};

use super::extract::Path;
use super::{data, ApiState};
use crate::db::{self, content};
use crate::errors::{AppError, Result};

/// `GET /centers/active`
pub async fn active_centers(State(state): State<Arc<ApiState>>) -> Result<impl IntoResponse> {
    Ok(data(content::active_centers(&state.pool, db::unix_now()).await?))
}

/// `GET /blogs`
pub async fn list_blogs(State(state): State<Arc<ApiState>>) -> Result<impl IntoResponse> {
    Ok(data(content::list_blogs(&state.pool).await?))
}

/// `GET /blogs/:slug`
pub async fn get_blog(
    State(state): State<Arc<ApiState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let post = content::get_blog(&state.pool, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog post".to_string()))?;
    Ok(data(post))
}
