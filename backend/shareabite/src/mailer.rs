//! Outbound email transport.
//!
//! `Http` posts `{from, to, subject, html}` to a transactional mail API with a
//! bearer key. `Log` writes the message to the log and always succeeds; it is
//! used when no mail API is configured.

use reqwest::Client;
use serde_json::json;
use tracing::info;

use crate::config::MailConfig;
use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub enum Mailer {
    Http {
        client: Client,
        url: String,
        api_key: Option<String>,
        from: String,
    },
    Log {
        from: String,
    },
}

impl Mailer {
    pub fn from_config(client: Client, config: &MailConfig) -> Self {
        match &config.api_url {
            Some(url) => Mailer::Http {
                client,
                url: url.clone(),
                api_key: config.api_key.clone(),
                from: config.from.clone(),
            },
            None => Mailer::Log {
                from: config.from.clone(),
            },
        }
    }

    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        match self {
            Mailer::Http {
                client,
                url,
                api_key,
                from,
            } => {
                let mut request = client.post(url).json(&json!({
                    "from": from,
                    "to": to,
                    "subject": subject,
                    "html": html,
                }));
                if let Some(key) = api_key {
                    request = request.bearer_auth(key);
                }

                let response = request
                    .send()
                    .await
                    .map_err(|e| AppError::Upstream(format!("mail API unreachable: {e}")))?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::Upstream(format!(
                        "mail API returned {status}: {}",
                        body.chars().take(200).collect::<String>()
                    )));
                }
                Ok(())
            }
            Mailer::Log { from } => {
                info!(%from, %to, %subject, "Mail API not configured; logging message instead");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail_config(api_url: Option<&str>) -> MailConfig {
        MailConfig {
            api_url: api_url.map(String::from),
            api_key: None,
            from: "no-reply@example.org".to_string(),
            poll_interval_secs: 1,
            batch_size: 10,
            max_attempts: 3,
        }
    }

    #[test]
    fn transport_follows_configuration() {
        assert!(matches!(
            Mailer::from_config(Client::new(), &mail_config(None)),
            Mailer::Log { .. }
        ));
        assert!(matches!(
            Mailer::from_config(Client::new(), &mail_config(Some("http://mail.local/send"))),
            Mailer::Http { .. }
        ));
    }

    #[tokio::test]
    async fn log_transport_always_succeeds() {
        let mailer = Mailer::from_config(Client::new(), &mail_config(None));
        assert!(mailer.send("a@example.org", "Hi", "<p>hi</p>").await.is_ok());
    }

    #[tokio::test]
    async fn unreachable_api_is_an_upstream_error() {
        let mailer =
            Mailer::from_config(Client::new(), &mail_config(Some("http://127.0.0.1:1/send")));
        assert!(matches!(
            mailer.send("a@example.org", "Hi", "<p>hi</p>").await,
            Err(AppError::Upstream(_))
        ));
    }
}
