//! SMTP email sink via lettre.
//!
//! One message per flush cycle, rendered as HTML. Mailboxes and the SMTP
//! relay are validated at construction so a bad address fails at startup.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use vigil_core::domain::ErrorEntry;
use vigil_core::ports::{AlertSink, SinkError};

use super::ChannelError;

/// SMTP channel settings.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub smtp_server: String,
    pub smtp_port: u16,
    /// Leave empty for an unauthenticated relay.
    pub smtp_username: String,
    pub smtp_password: String,
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_server: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from: String::new(),
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
        }
    }
}

/// Email delivery sink.
pub struct EmailSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
}

fn parse_mailboxes(field: &str, addresses: &[String]) -> Result<Vec<Mailbox>, ChannelError> {
    addresses
        .iter()
        .map(|address| {
            address.parse::<Mailbox>().map_err(|e| {
                ChannelError::InvalidSettings(format!("{field} address {address:?}: {e}"))
            })
        })
        .collect()
}

impl EmailSink {
    pub fn new(settings: &EmailSettings) -> Result<Self, ChannelError> {
        if settings.smtp_server.trim().is_empty() {
            return Err(ChannelError::InvalidSettings(
                "SMTP server is empty".to_string(),
            ));
        }

        let from = settings
            .from
            .parse::<Mailbox>()
            .map_err(|e| ChannelError::InvalidSettings(format!("From address: {e}")))?;
        let to = parse_mailboxes("To", &settings.to)?;
        if to.is_empty() {
            return Err(ChannelError::InvalidSettings(
                "at least one To address is required".to_string(),
            ));
        }
        let cc = parse_mailboxes("CC", &settings.cc)?;
        let bcc = parse_mailboxes("BCC", &settings.bcc)?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_server)
                .map_err(|e| ChannelError::Transport(e.to_string()))?
                .port(settings.smtp_port);
        if !settings.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.smtp_username.clone(),
                settings.smtp_password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
            cc,
            bcc,
        })
    }

    fn render_html(batch: &[ErrorEntry]) -> String {
        let mut html = format!(
            "<html><body><h2>Vigil - {} aggregated error(s)</h2>",
            batch.len()
        );

        for (index, entry) in batch.iter().enumerate() {
            let stack_trace = if entry.exception.stack_trace.is_empty() {
                "No stack trace available."
            } else {
                entry.exception.stack_trace.as_str()
            };

            html.push_str(&format!(
                "<h3>Error #{number} (x{count})</h3>\
                 <p><b>Type:</b> {type_name}<br>\
                 <b>Message:</b> {message}<br>\
                 <b>URL:</b> {url} ({method})<br>\
                 <b>First seen:</b> {first_seen}<br>\
                 <b>Last seen:</b> {last_seen}</p>\
                 <pre>{stack_trace}</pre><hr>",
                number = index + 1,
                count = entry.count,
                type_name = entry.exception.type_name,
                message = entry.exception.message,
                url = entry.request.url,
                method = entry.request.method,
                first_seen = entry.first_seen.format("%Y-%m-%d %H:%M:%S UTC"),
                last_seen = entry.last_seen.format("%Y-%m-%d %H:%M:%S UTC"),
            ));
        }

        html.push_str("</body></html>");
        html
    }

    fn build_message(&self, batch: &[ErrorEntry]) -> Result<Message, SinkError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(format!("Vigil: {} aggregated error(s)", batch.len()))
            .header(ContentType::TEXT_HTML);

        for mailbox in &self.to {
            builder = builder.to(mailbox.clone());
        }
        for mailbox in &self.cc {
            builder = builder.cc(mailbox.clone());
        }
        for mailbox in &self.bcc {
            builder = builder.bcc(mailbox.clone());
        }

        builder
            .body(Self::render_html(batch))
            .map_err(|e| SinkError::Render(e.to_string()))
    }
}

#[async_trait]
impl AlertSink for EmailSink {
    fn name(&self) -> &str {
        "smtp-email"
    }

    async fn send(&self, batch: &[ErrorEntry]) -> Result<(), SinkError> {
        let message = self.build_message(batch)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| SinkError::Smtp(e.to_string()))?;

        tracing::debug!(entries = batch.len(), "Email alert sent");
        Ok(())
    }
}
