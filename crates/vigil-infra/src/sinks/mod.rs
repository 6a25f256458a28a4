//! Alert delivery sinks.
//!
//! Each sink renders a drained batch into one channel-appropriate payload
//! and performs a single outbound call per flush cycle.

mod slack;
mod teams;

#[cfg(feature = "smtp")]
mod email;

use std::sync::Arc;

use vigil_core::ports::AlertSink;

pub use slack::SlackSink;
pub use teams::TeamsSink;

#[cfg(feature = "smtp")]
pub use email::{EmailSettings, EmailSink};

/// One configured alert channel.
#[derive(Debug, Clone)]
pub enum ChannelConfig {
    Slack {
        webhook_url: String,
        /// Optional deep link rendered as a "View Error Logs" button.
        dashboard_url: Option<String>,
    },
    Teams {
        webhook_url: String,
        dashboard_url: Option<String>,
    },
    #[cfg(feature = "smtp")]
    SmtpEmail(EmailSettings),
}

/// Channel construction errors. These are startup-fatal: a misconfigured
/// channel fails before the scheduler starts, never mid-cycle.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("invalid channel settings: {0}")]
    InvalidSettings(String),

    #[error("failed to initialize transport: {0}")]
    Transport(String),
}

/// Construct the concrete sink for one configured channel.
pub fn build_sink(config: &ChannelConfig) -> Result<Arc<dyn AlertSink>, ChannelError> {
    match config {
        ChannelConfig::Slack {
            webhook_url,
            dashboard_url,
        } => Ok(Arc::new(SlackSink::new(
            webhook_url.clone(),
            dashboard_url.clone(),
        )?)),
        ChannelConfig::Teams {
            webhook_url,
            dashboard_url,
        } => Ok(Arc::new(TeamsSink::new(
            webhook_url.clone(),
            dashboard_url.clone(),
        )?)),
        #[cfg(feature = "smtp")]
        ChannelConfig::SmtpEmail(settings) => Ok(Arc::new(EmailSink::new(settings)?)),
    }
}

pub(crate) fn validate_webhook_url(url: &str) -> Result<(), ChannelError> {
    if url.trim().is_empty() {
        return Err(ChannelError::InvalidSettings(
            "webhook URL is empty".to_string(),
        ));
    }
    reqwest::Url::parse(url)
        .map_err(|e| ChannelError::InvalidSettings(format!("webhook URL: {e}")))?;
    Ok(())
}

/// Render header pairs for a payload, dropping credentials.
pub(crate) fn redacted_headers(
    headers: &[(String, String)],
) -> impl Iterator<Item = (&str, &str)> {
    headers
        .iter()
        .filter(|(name, _)| !name.eq_ignore_ascii_case("authorization"))
        .map(|(name, value)| (name.as_str(), value.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_header_is_redacted() {
        let headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Authorization".to_string(), "Bearer secret".to_string()),
            ("authorization".to_string(), "Basic secret".to_string()),
        ];

        let kept: Vec<_> = redacted_headers(&headers).collect();
        assert_eq!(kept, vec![("Accept", "application/json")]);
    }

    #[test]
    fn empty_webhook_url_is_rejected_at_construction() {
        let result = build_sink(&ChannelConfig::Slack {
            webhook_url: String::new(),
            dashboard_url: None,
        });
        assert!(matches!(result, Err(ChannelError::InvalidSettings(_))));
    }

    #[test]
    fn malformed_webhook_url_is_rejected_at_construction() {
        let result = build_sink(&ChannelConfig::Teams {
            webhook_url: "not a url".to_string(),
            dashboard_url: None,
        });
        assert!(matches!(result, Err(ChannelError::InvalidSettings(_))));
    }
}
