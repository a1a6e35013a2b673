//! Email delivery for confirmation codes
//!
//! `SmtpMailer` sends through lettre; `ConsoleMailer` writes the code to the
//! log for local development. The transport is picked from `email.transport`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::config::{EmailConfig, EmailTransport};

const CONFIRMATION_SUBJECT: &str = "YaMDb confirmation code";

/// Delivers confirmation codes to users
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_confirmation_code(&self, to_email: &str, username: &str, code: &str) -> Result<()>;
}

fn confirmation_body(username: &str, code: &str) -> String {
    format!(
        "Hello, {}!\n\nYour confirmation code is: {}\n\n\
         Exchange it for an access token at /api/v1/auth/token.\n\
         If you did not sign up, ignore this message.",
        username, code
    )
}

/// SMTP delivery
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let host = config
            .smtp_host
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| anyhow!("SMTP host not configured"))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: config.from_email.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_confirmation_code(&self, to_email: &str, username: &str, code: &str) -> Result<()> {
        let email = Message::builder()
            .from(self.from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
            .to(to_email.parse().map_err(|e| anyhow!("Invalid to address: {}", e))?)
            .subject(CONFIRMATION_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(confirmation_body(username, code))
            .map_err(|e| anyhow!("Failed to build email: {}", e))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        tracing::info!(to = %to_email, "Confirmation code sent");
        Ok(())
    }
}

/// Logs the message instead of sending it
pub struct ConsoleMailer {
    from: String,
}

impl ConsoleMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send_confirmation_code(&self, to_email: &str, username: &str, code: &str) -> Result<()> {
        tracing::info!(
            from = %self.from,
            to = %to_email,
            subject = CONFIRMATION_SUBJECT,
            "{}",
            confirmation_body(username, code)
        );
        Ok(())
    }
}

/// Build the mailer selected by configuration
pub fn create_mailer(config: &EmailConfig) -> Result<Arc<dyn Mailer>> {
    match config.transport {
        EmailTransport::Smtp => Ok(Arc::new(SmtpMailer::new(config)?)),
        EmailTransport::Console => Ok(Arc::new(ConsoleMailer::new(config.from_email.clone()))),
    }
}

/// Test double that remembers every delivered code
#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
impl RecordingMailer {
    /// Most recent code sent to `email`
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_confirmation_code(&self, to_email: &str, _username: &str, code: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to_email.to_string(), code.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_contains_code() {
        let body = confirmation_body("alice", "1234-abcd");
        assert!(body.contains("alice"));
        assert!(body.contains("1234-abcd"));
    }

    #[tokio::test]
    async fn test_console_mailer_succeeds() {
        let mailer = create_mailer(&EmailConfig::default()).expect("Console mailer");
        mailer
            .send_confirmation_code("alice@example.com", "alice", "code")
            .await
            .expect("Console delivery never fails");
    }

    #[test]
    fn test_smtp_requires_host() {
        let config = EmailConfig {
            transport: EmailTransport::Smtp,
            smtp_host: None,
            ..Default::default()
        };
        assert!(create_mailer(&config).is_err());
    }

    #[tokio::test]
    async fn test_smtp_mailer_builds_with_credentials() {
        let config = EmailConfig {
            transport: EmailTransport::Smtp,
            smtp_host: Some("smtp.example.com".to_string()),
            smtp_username: Some("mailer".to_string()),
            smtp_password: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(create_mailer(&config).is_ok());
    }

    #[tokio::test]
    async fn test_recording_mailer_keeps_latest_code() {
        let mailer = RecordingMailer::default();
        mailer.send_confirmation_code("a@example.com", "a", "one").await.unwrap();
        mailer.send_confirmation_code("a@example.com", "a", "two").await.unwrap();

        assert_eq!(mailer.last_code_for("a@example.com").as_deref(), Some("two"));
        assert_eq!(mailer.sent_count(), 2);
        assert!(mailer.last_code_for("b@example.com").is_none());
    }
}
