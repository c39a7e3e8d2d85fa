//! Application configuration loaded from environment variables.

use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database URL (e.g. sqlite:./shareabite.db)
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// Payment gateway credentials and endpoint
    pub payment: PaymentConfig,
    /// Outbound mail API and relay tuning
    pub mail: MailConfig,
    /// Admin credentials; `None` disables admin login
    pub admin: Option<AdminCredentials>,
    /// Lifetime of an issued admin session, in seconds
    pub admin_session_ttl_secs: i64,
    /// Timeout applied to every outbound HTTP request
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub api_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Transactional mail API endpoint; `None` logs messages instead of sending
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
    pub poll_interval_secs: u64,
    pub batch_size: i64,
    pub max_attempts: i64,
}

#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub email: String,
    /// bcrypt hash of the admin password (`$2a$`, `$2b$` or `$2y$`)
    pub password_hash: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                AppError::Config(format!("{key} environment variable is required"))
            })
        };

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD_HASH")) {
            (Some(email), Some(hash)) => {
                let hash = hash.trim().to_string();
                if !["$2a$", "$2b$", "$2y$"].iter().any(|p| hash.starts_with(p)) {
                    return Err(AppError::Config("Invalid ADMIN_PASSWORD_HASH".to_string()));
                }
                Some(AdminCredentials {
                    email,
                    password_hash: hash,
                })
            }
            (None, None) => None,
            _ => {
                return Err(AppError::Config(
                    "ADMIN_EMAIL and ADMIN_PASSWORD_HASH must be set together".to_string(),
                ))
            }
        };

        Ok(Config {
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite:./shareabite.db".to_string()),
            api_port: parse(&get, "API_PORT", 3001)?,
            payment: PaymentConfig {
                api_url: get("RAZORPAY_API_URL")
                    .unwrap_or_else(|| "https://api.razorpay.com/v1".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                key_id: required("RAZORPAY_KEY_ID")?,
                key_secret: required("RAZORPAY_KEY_SECRET")?,
                currency: get("PAYMENT_CURRENCY").unwrap_or_else(|| "INR".to_string()),
            },
            mail: MailConfig {
                api_url: get("MAIL_API_URL"),
                api_key: get("MAIL_API_KEY"),
                from: get("EMAIL_FROM").unwrap_or_else(|| "no-reply@shareabite.org".to_string()),
                poll_interval_secs: parse_positive(&get, "NOTIFY_POLL_INTERVAL_SECS", 5)?,
                batch_size: parse_positive(&get, "NOTIFY_BATCH_SIZE", 20)?,
                max_attempts: parse_positive(&get, "NOTIFY_MAX_ATTEMPTS", 5)?,
            },
            admin,
            admin_session_ttl_secs: parse_positive(&get, "ADMIN_SESSION_TTL_SECS", 3600)?,
            http_timeout_secs: parse_positive(&get, "HTTP_TIMEOUT_SECS", 30)?,
        })
    }
}

fn parse<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid {key}"))),
        None => Ok(default),
    }
}

/// Like [`parse`], but zero and negative values are rejected too.
fn parse_positive<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
    G: Fn(&str) -> Option<String>,
{
    let value = parse(get, key, default)?;
    if value <= T::default() {
        return Err(AppError::Config(format!("Invalid {key}")));
    }
    Ok(value)
}
