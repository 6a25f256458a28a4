//! Microsoft Teams webhook sink using Adaptive Cards.

use async_trait::async_trait;
use serde_json::{Value, json};

use vigil_core::domain::ErrorEntry;
use vigil_core::ports::{AlertSink, SinkError};

use super::{ChannelError, redacted_headers, validate_webhook_url};

/// Sends one Adaptive Card per flush cycle to a Teams incoming webhook.
pub struct TeamsSink {
    client: reqwest::Client,
    webhook_url: String,
    dashboard_url: Option<String>,
}

impl TeamsSink {
    pub fn new(webhook_url: String, dashboard_url: Option<String>) -> Result<Self, ChannelError> {
        validate_webhook_url(&webhook_url)?;
        Ok(Self {
            client: reqwest::Client::new(),
            webhook_url,
            dashboard_url,
        })
    }

    fn text_block(text: String) -> Value {
        json!({ "type": "TextBlock", "text": text, "wrap": true, "spacing": "Small" })
    }

    fn render(&self, batch: &[ErrorEntry]) -> Value {
        let mut body = vec![json!({
            "type": "TextBlock",
            "size": "Large",
            "weight": "Bolder",
            "color": "Attention",
            "text": format!("Vigil - {} aggregated error(s)", batch.len()),
        })];

        for (index, entry) in batch.iter().enumerate() {
            let headers = redacted_headers(&entry.request.headers)
                .map(|(name, value)| format!("**{name}:** `{value}`"))
                .collect::<Vec<_>>()
                .join("\n");
            let stack_trace = if entry.exception.stack_trace.is_empty() {
                "No stack trace available."
            } else {
                entry.exception.stack_trace.as_str()
            };

            body.push(json!({
                "type": "TextBlock",
                "size": "Medium",
                "weight": "Bolder",
                "color": "Attention",
                "spacing": "Medium",
                "text": format!("Error #{} (x{})", index + 1, entry.count),
            }));
            body.push(Self::text_block(format!(
                "**First seen:** `{}`  **Last seen:** `{}`",
                entry.first_seen.format("%Y-%m-%d %H:%M:%S UTC"),
                entry.last_seen.format("%Y-%m-%d %H:%M:%S UTC"),
            )));
            body.push(Self::text_block(format!(
                "**URL:** `{}`  **Method:** `{}`",
                entry.request.url, entry.request.method
            )));
            if !headers.is_empty() {
                body.push(Self::text_block(format!("**Headers:**\n{headers}")));
            }
            body.push(Self::text_block(format!(
                "**Type:** `{}`\n**Message:** `{}`",
                entry.exception.type_name, entry.exception.message
            )));
            body.push(Self::text_block(format!(
                "**Stack Trace:**\n```{stack_trace}```"
            )));
        }

        let actions = match &self.dashboard_url {
            Some(url) => json!([{
                "type": "Action.OpenUrl",
                "title": "View Error Logs",
                "url": url,
            }]),
            None => json!([]),
        };

        json!({
            "type": "message",
            "attachments": [{
                "contentType": "application/vnd.microsoft.card.adaptive",
                "content": {
                    "type": "AdaptiveCard",
                    "version": "1.4",
                    "body": body,
                    "actions": actions,
                }
            }]
        })
    }
}

#[async_trait]
impl AlertSink for TeamsSink {
    fn name(&self) -> &str {
        "teams"
    }

    async fn send(&self, batch: &[ErrorEntry]) -> Result<(), SinkError> {
        let payload = self.render(batch);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SinkError::Status(response.status().as_u16()));
        }

        tracing::debug!(entries = batch.len(), "Teams alert sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use vigil_core::domain::{ExceptionInfo, RequestInfo};

    use super::*;

    fn entry(message: &str, count: u64) -> ErrorEntry {
        let mut entry = ErrorEntry::first(
            format!("fp-{message}"),
            ExceptionInfo::new("TimeoutError", message, "at query:42"),
            RequestInfo::new("/orders", "GET")
                .with_headers(vec![("Authorization".to_string(), "secret".to_string())]),
        );
        entry.count = count;
        entry
    }

    #[test]
    fn renders_an_adaptive_card_for_the_whole_batch() {
        let sink = TeamsSink::new("https://outlook.office.com/webhook/x".to_string(), None).unwrap();
        let payload = sink.render(&[entry("boom", 2), entry("other", 1)]);

        assert_eq!(
            payload["attachments"][0]["contentType"],
            "application/vnd.microsoft.card.adaptive"
        );
        let text = payload.to_string();
        assert!(text.contains("Error #1 (x2)"));
        assert!(text.contains("Error #2 (x1)"));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn dashboard_action_only_rendered_when_configured() {
        let sink = TeamsSink::new(
            "https://outlook.office.com/webhook/x".to_string(),
            Some("https://dash.example.com".to_string()),
        )
        .unwrap();

        let payload = sink.render(&[entry("boom", 1)]);
        assert!(payload.to_string().contains("https://dash.example.com"));
    }
}
