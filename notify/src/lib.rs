//! # Innkeep Notifications
//!
//! [`Notifier`] implementations: a tracing-backed logger for development
//! and tests, and an SMTP transport for production. Delivery is
//! best-effort by contract; the reservation core logs failures and moves
//! on.

use async_trait::async_trait;
use errors::NotifyError;
use ik_core::traits::Notifier;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Logs notices instead of sending them. For development and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_approval_notice(
        &self,
        customer_email: &str,
        approver_login: &str,
        recipients: &[String]
    ) -> Result<(), NotifyError> {
        tracing::info!(
            to = %customer_email,
            approved_by = %approver_login,
            cc = ?recipients,
            "reservation approval notice"
        );
        Ok(())
    }
}

/// Sends approval notices over SMTP.
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox
}

impl SmtpNotifier {
    pub fn new(
        server: &str,
        port: u16,
        username: String,
        password: String,
        from: &str
    ) -> Result<Self, NotifyError> {
        let from = parse_mailbox(from)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(server)
            .map_err(|e| NotifyError::Transport {
                reason: format!("SMTP relay error: {e}")
            })?
            .port(port)
            .credentials(Credentials::new(username, password))
            .build();

        Ok(Self { transport, from })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|_| NotifyError::InvalidAddress {
        address: address.to_string()
    })
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_approval_notice(
        &self,
        customer_email: &str,
        approver_login: &str,
        recipients: &[String]
    ) -> Result<(), NotifyError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(customer_email)?)
            .subject("Reservation approved");

        for recipient in recipients {
            builder = builder.cc(parse_mailbox(recipient)?);
        }

        let body = format!(
            "Your reservation has been approved.\n\nApproved by: {approver_login}\n"
        );
        let message = builder.body(body).map_err(|e| NotifyError::Transport {
            reason: format!("failed to build message: {e}")
        })?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport {
                reason: format!("SMTP send failed: {e}")
            })?;

        tracing::debug!(to = %customer_email, "approval notice sent");
        Ok(())
    }
}
