// src/utils/mailer.rs

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::Mailbox,
    transport::smtp::authentication::Credentials,
};

use crate::{config::Config, error::AppError};

/// Outcome of a delivery attempt.
#[derive(Debug)]
pub enum Delivery {
    /// Handed to the SMTP transport.
    Sent,
    /// No transport is configured; the calling flow still completes and the
    /// handler reports the generated code back to the caller instead.
    Simulated,
}

/// Sends verification and reset codes by email.
///
/// Built once from config. When SMTP settings are absent the mailer degrades
/// to simulated delivery; it never simulates while a transport exists, so
/// codes cannot leak through responses in production mode.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Self {
        let transport = match (
            &config.smtp_host,
            &config.smtp_username,
            &config.smtp_password,
        ) {
            (Some(host), Some(username), Some(password)) => {
                match AsyncSmtpTransport::<Tokio1Executor>::relay(host) {
                    Ok(builder) => Some(
                        builder
                            .credentials(Credentials::new(username.clone(), password.clone()))
                            .port(config.smtp_port)
                            .build(),
                    ),
                    Err(e) => {
                        tracing::warn!(
                            "Invalid SMTP relay '{}', falling back to simulated delivery: {}",
                            host,
                            e
                        );
                        None
                    }
                }
            }
            _ => None,
        };

        let from = config.smtp_from.as_ref().and_then(|f| f.parse().ok());

        Self { transport, from }
    }

    /// A mailer that always simulates. Used by tests.
    pub fn unconfigured() -> Self {
        Self {
            transport: None,
            from: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Delivers `body` to `to`. Returns `Delivery::Simulated` when no
    /// transport is configured; a configured transport that fails to send is
    /// a hard `DeliveryError`.
    pub async fn send(&self, to: &str, subject: &str, body: String) -> Result<Delivery, AppError> {
        let Some(transport) = &self.transport else {
            tracing::info!("SMTP not configured, simulating delivery to {}", to);
            return Ok(Delivery::Simulated);
        };

        let from = self.from.clone().ok_or_else(|| {
            AppError::DeliveryError("SMTP_FROM is missing or not a valid mailbox".to_string())
        })?;

        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .body(body)
            .map_err(|e| AppError::DeliveryError(e.to_string()))?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::DeliveryError(e.to_string()))?;

        Ok(Delivery::Sent)
    }
}
