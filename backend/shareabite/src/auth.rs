//! Caller identity: admin sessions and donor headers.
//!
//! Admins log in with the configured email and password and receive an
//! opaque token. The password is checked against a bcrypt hash. The token, its owner and its expiry live only in
//! `admin_sessions`; every admin request is checked against that table with
//! the server clock.
//!
//! Donors authenticate upstream. The auth gateway forwards their identity in
//! `X-User-Id`, `X-User-Email` and (optionally) `X-User-Name`.

use axum::http::HeaderMap;
use sqlx::SqlitePool;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::config::{AdminCredentials, Config};
use crate::db::{self, sessions};
use crate::errors::{AppError, Result};
use crate::models::{AdminSession, Donor};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";

fn ct_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.as_bytes().ct_eq(b.as_bytes()).unwrap_u8() == 1
}

/// Check both the email and the password; the bcrypt verification runs even
/// when the email is wrong.
pub async fn credentials_match(
    expected: &AdminCredentials,
    email: &str,
    password: &str,
) -> Result<bool> {
    let email_ok = ct_eq(&expected.email.to_ascii_lowercase(), &email.trim().to_ascii_lowercase());

    let hash = expected.password_hash.clone();
    let password = password.to_string();
    let password_ok =
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;

    Ok(email_ok & password_ok)
}

/// Check credentials and issue a fresh session.
pub async fn login(
    pool: &SqlitePool,
    config: &Config,
    email: &str,
    password: &str,
) -> Result<AdminSession> {
    let Some(expected) = config.admin.as_ref() else {
        return Err(AppError::Forbidden(
            "Admin login is disabled (no admin credentials configured)".to_string(),
        ));
    };

    if !credentials_match(expected, email, password).await? {
        warn!("Rejected admin login attempt");
        return Err(AppError::Unauthorized);
    }

    let now = db::unix_now();
    let purged = sessions::purge_expired(pool, now).await?;
    let session = AdminSession {
        token: uuid::Uuid::new_v4().simple().to_string(),
        email: expected.email.clone(),
        created_at: now,
        expires_at: now + config.admin_session_ttl_secs,
    };
    sessions::insert_session(pool, &session).await?;

    info!(email = %session.email, purged, "Admin session issued");
    Ok(session)
}

/// Extract `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the live admin session for this request.
pub async fn require_admin(pool: &SqlitePool, headers: &HeaderMap) -> Result<AdminSession> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
    sessions::find_live(pool, token, db::unix_now())
        .await?
        .ok_or(AppError::Unauthorized)
}

/// Revoke the presented token. Unknown tokens are not an error.
pub async fn logout(pool: &SqlitePool, headers: &HeaderMap) -> Result<bool> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
    sessions::delete_session(pool, token).await
}

/// Donor identity forwarded by the auth gateway.
pub fn donor_from_headers(headers: &HeaderMap) -> Result<Donor> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    };

    match (header(USER_ID_HEADER), header(USER_EMAIL_HEADER)) {
        (Some(id), Some(email)) => Ok(Donor {
            id,
            email,
            name: header(USER_NAME_HEADER),
        }),
        _ => Err(AppError::Unauthorized),
    }
}
