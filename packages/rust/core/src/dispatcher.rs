//! Delivery of the composed briefing.
//!
//! Delivery is best-effort: every failure is logged and reported as
//! [`DeliveryStatus::Failed`], never returned as an error.

use tracing::{error, info, instrument};

use newsbrief_mailer::{MailTransport, compose, credentials};
use newsbrief_shared::{MailSettings, Result};

/// Outcome of the dispatch stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sent,
    Failed { reason: String },
    /// Dispatch was not attempted (dry run).
    Skipped,
}

impl DeliveryStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Mails the briefing with settings resolved at construction.
pub struct Dispatcher<T> {
    settings: MailSettings,
    transport: T,
}

impl<T: MailTransport> Dispatcher<T> {
    pub fn new(settings: MailSettings, transport: T) -> Self {
        Self {
            settings,
            transport,
        }
    }

    #[instrument(skip_all, fields(host = %self.settings.smtp_host, port = self.settings.smtp_port))]
    pub async fn dispatch(&self, summary: &str) -> DeliveryStatus {
        match self.try_dispatch(summary).await {
            Ok(()) => {
                info!(recipient = self.settings.recipient.as_deref().unwrap_or(""), "briefing sent");
                DeliveryStatus::Sent
            }
            Err(e) => {
                error!(error = %e, "failed to send briefing");
                DeliveryStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_dispatch(&self, summary: &str) -> Result<()> {
        let message = compose(&self.settings, summary)?;
        let creds = credentials(&self.settings)?;
        self.transport.send(creds, message).await
    }
}
