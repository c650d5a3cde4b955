use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use skpush_config::EmailServiceConfig;
use skpush_core::MailMessage;

use super::MailAdapter;
use crate::error::NotificationError;

/// SMTP mail adapter over lettre's async transport.
pub struct SmtpMailAdapter {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailAdapter {
    pub fn from_config(config: &EmailServiceConfig) -> Result<Self, NotificationError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.transport.host)
            .map_err(|e| NotificationError::invalid_config(e.to_string()))?
            .port(config.transport.port);

        if let (Some(username), Some(password)) =
            (&config.transport.username, &config.transport.password)
        {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = config
            .message
            .from
            .parse()
            .map_err(|e| NotificationError::invalid_config(format!("invalid from address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailAdapter for SmtpMailAdapter {
    async fn send(&self, message: &MailMessage, to: &[String]) -> Result<(), NotificationError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN);

        for address in to {
            builder = builder.to(address
                .parse()
                .map_err(|e| NotificationError::invalid_config(format!("invalid to address: {e}")))?);
        }

        let email = builder
            .body(message.text.clone())
            .map_err(|e| NotificationError::send_failed(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| NotificationError::send_failed(e.to_string()))
    }

    async fn verify(&self) -> Result<(), NotificationError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(NotificationError::send_failed(
                "SMTP connection test failed",
            )),
            Err(e) => Err(NotificationError::send_failed(e.to_string())),
        }
    }
}
