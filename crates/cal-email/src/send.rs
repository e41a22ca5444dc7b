//! Reminder email sending via SMTP
//!
//! Without the `smtp` feature the sender logs and reports success, which is
//! enough for local development; production builds enable `smtp` to deliver
//! through lettre.

use async_trait::async_trait;
use tracing::info;

use crate::error::{EmailError, Result};
use cal_core::config::MailConfig;
use cal_core::model::ReminderKind;

/// Everything needed to render and address one reminder email
#[derive(Debug, Clone)]
pub struct ReminderMail {
    pub to: String,
    pub recipient_name: String,
    pub event_title: String,
    /// Human-readable occurrence window, e.g. "2024-01-03 09:00 - 09:30 UTC"
    pub window_text: String,
    pub kind: ReminderKind,
    pub minutes_before: i64,
    /// Link into the calendar UI for this occurrence
    pub deep_link: String,
}

impl ReminderMail {
    pub fn subject(&self) -> String {
        match self.kind {
            ReminderKind::AtStart => format!("Starting now: {}", self.event_title),
            ReminderKind::Before15 => format!(
                "In {} minutes: {}",
                self.minutes_before, self.event_title
            ),
        }
    }

    pub fn body(&self) -> String {
        format!(
            "Hi {},\n\n\"{}\" is scheduled for {}.\n\nOpen it here: {}\n",
            self.recipient_name, self.event_title, self.window_text, self.deep_link
        )
    }
}

/// Dispatch seam between the reminder scheduler and the mail system.
///
/// Failure must be distinguishable from success: the scheduler rolls back
/// its idempotency claim when a send fails.
#[async_trait]
pub trait ReminderMailer: Send + Sync {
    async fn send_reminder(&self, mail: &ReminderMail) -> Result<()>;
}

/// SMTP-backed email sender
#[derive(Debug, Clone)]
pub struct EmailSender {
    config: MailConfig,
}

impl EmailSender {
    /// Create a new email sender
    pub fn new(config: MailConfig) -> Result<Self> {
        if config.smtp_host.is_empty() {
            return Err(EmailError::SmtpConfig("smtp_host is empty".to_string()));
        }
        Ok(Self { config })
    }

    #[cfg(feature = "smtp")]
    async fn smtp_send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        use lettre::message::Mailbox;
        use lettre::transport::smtp::authentication::Credentials;
        use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

        let from: Mailbox = self
            .config
            .from_address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(self.config.from_address.clone()))?;
        let to: Mailbox = to
            .parse()
            .map_err(|_| EmailError::InvalidAddress(to.to_string()))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| EmailError::SmtpSend(e.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| EmailError::SmtpConfig(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.smtp_user.clone(),
                self.config.smtp_pass.clone(),
            ))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| EmailError::SmtpSend(e.to_string()))?;
        Ok(())
    }

    #[cfg(not(feature = "smtp"))]
    async fn smtp_send(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
        info!(
            "Email queued (smtp feature disabled): to={} subject={} via {}:{}",
            to, subject, self.config.smtp_host, self.config.smtp_port
        );
        Ok(())
    }
}

#[async_trait]
impl ReminderMailer for EmailSender {
    async fn send_reminder(&self, mail: &ReminderMail) -> Result<()> {
        let subject = mail.subject();
        let body = mail.body();
        info!("Sending reminder to {}: {}", mail.to, subject);
        self.smtp_send(&mail.to, &subject, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail(kind: ReminderKind, minutes_before: i64) -> ReminderMail {
        ReminderMail {
            to: "bob@example.com".to_string(),
            recipient_name: "Bob".to_string(),
            event_title: "Standup".to_string(),
            window_text: "2024-01-03 09:00 - 09:30 UTC".to_string(),
            kind,
            minutes_before,
            deep_link: "http://localhost:3000/calendar?event=e1".to_string(),
        }
    }

    #[test]
    fn test_subject_at_start() {
        assert_eq!(
            mail(ReminderKind::AtStart, 0).subject(),
            "Starting now: Standup"
        );
    }

    #[test]
    fn test_subject_before() {
        assert_eq!(
            mail(ReminderKind::Before15, 15).subject(),
            "In 15 minutes: Standup"
        );
    }

    #[test]
    fn test_body_contains_window_and_link() {
        let body = mail(ReminderKind::AtStart, 0).body();
        assert!(body.contains("2024-01-03 09:00 - 09:30 UTC"));
        assert!(body.contains("http://localhost:3000/calendar?event=e1"));
        assert!(body.starts_with("Hi Bob,"));
    }

    #[test]
    fn test_sender_rejects_empty_host() {
        let config = MailConfig {
            smtp_host: String::new(),
            ..MailConfig::default()
        };
        assert!(EmailSender::new(config).is_err());
    }

    #[tokio::test]
    async fn test_stub_send_succeeds() {
        let sender = EmailSender::new(MailConfig::default()).unwrap();
        let result = sender.send_reminder(&mail(ReminderKind::AtStart, 0)).await;
        #[cfg(not(feature = "smtp"))]
        assert!(result.is_ok());
        #[cfg(feature = "smtp")]
        let _ = result;
    }
}
