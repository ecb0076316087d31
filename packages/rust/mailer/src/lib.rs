//! Plain-text briefing mail over SMTP.
//!
//! [`compose`] builds the message, [`credentials`] checks that a login is
//! possible, and a [`MailTransport`] submits it. [`SmtpMailer`] is the real
//! transport: one authenticated `lettre` session per send.

use std::future::Future;

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{debug, info, instrument};

use newsbrief_shared::{MailSettings, NewsbriefError, Result};

pub use lettre::Message;
pub use lettre::transport::smtp::authentication::Credentials;

/// Port on which SMTP runs inside TLS from the first byte.
const IMPLICIT_TLS_PORT: u16 = 465;

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Build the plain-text briefing addressed to the configured recipient.
pub fn compose(settings: &MailSettings, body: &str) -> Result<Message> {
    let from = mailbox(settings.sender.as_deref(), &settings.sender_env)?;
    let to = mailbox(settings.recipient.as_deref(), &settings.recipient_env)?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(settings.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| NewsbriefError::Mail(format!("failed to build message: {e}")))
}

/// SMTP login for the sender account.
pub fn credentials(settings: &MailSettings) -> Result<Credentials> {
    let user = settings.sender.clone().ok_or_else(|| {
        NewsbriefError::Mail(format!(
            "authentication failed: {} is not set",
            settings.sender_env
        ))
    })?;
    let password = settings.password.clone().ok_or_else(|| {
        NewsbriefError::Mail(format!(
            "authentication failed: {} is not set",
            settings.password_env
        ))
    })?;
    Ok(Credentials::new(user, password))
}

fn mailbox(value: Option<&str>, env_name: &str) -> Result<Mailbox> {
    let value =
        value.ok_or_else(|| NewsbriefError::Mail(format!("{env_name} is not set")))?;
    value
        .parse::<Mailbox>()
        .map_err(|e| NewsbriefError::Mail(format!("invalid address in {env_name}: {e}")))
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Something that can authenticate and submit one message.
pub trait MailTransport {
    fn send(&self, credentials: Credentials, message: Message) -> impl Future<Output = Result<()>>;
}

/// SMTP relay transport.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
}

impl SmtpMailer {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn from_settings(settings: &MailSettings) -> Self {
        Self::new(settings.smtp_host.clone(), settings.smtp_port)
    }

    fn session(&self, credentials: Credentials) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        // 465 wraps the whole session in TLS; any other port upgrades with STARTTLS.
        let builder = if self.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
        }
        .map_err(|e| NewsbriefError::Mail(format!("invalid SMTP relay {}: {e}", self.host)))?;

        Ok(builder.port(self.port).credentials(credentials).build())
    }
}

impl MailTransport for SmtpMailer {
    #[instrument(skip_all, fields(host = %self.host, port = self.port))]
    async fn send(&self, credentials: Credentials, message: Message) -> Result<()> {
        let session = self.session(credentials)?;
        debug!("SMTP session opened");

        let response = session
            .send(message)
            .await
            .map_err(|e| NewsbriefError::Mail(format!("send failed: {e}")))?;

        info!(code = %response.code(), "message accepted by relay");
        Ok(())
    }
}
