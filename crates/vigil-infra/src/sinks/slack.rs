//! Slack webhook sink using Block Kit messages.

use async_trait::async_trait;
use serde_json::{Value, json};

use vigil_core::domain::ErrorEntry;
use vigil_core::ports::{AlertSink, SinkError};

use super::{ChannelError, redacted_headers, validate_webhook_url};

/// Sends one Block Kit message per flush cycle to a Slack incoming webhook.
pub struct SlackSink {
    client: reqwest::Client,
    webhook_url: String,
    dashboard_url: Option<String>,
}

impl SlackSink {
    pub fn new(webhook_url: String, dashboard_url: Option<String>) -> Result<Self, ChannelError> {
        validate_webhook_url(&webhook_url)?;
        Ok(Self {
            client: reqwest::Client::new(),
            webhook_url,
            dashboard_url,
        })
    }

    fn section(text: String) -> Value {
        json!({ "type": "section", "text": { "type": "mrkdwn", "text": text } })
    }

    fn render(&self, batch: &[ErrorEntry]) -> Value {
        let mut blocks = vec![
            Self::section(format!(
                "*:rotating_light: Vigil - {} aggregated error(s)*",
                batch.len()
            )),
            json!({ "type": "divider" }),
        ];

        for (index, entry) in batch.iter().enumerate() {
            let headers = redacted_headers(&entry.request.headers)
                .map(|(name, value)| format!("*{name}:* `{value}`"))
                .collect::<Vec<_>>()
                .join("\n");
            let stack_trace = if entry.exception.stack_trace.is_empty() {
                "No stack trace available."
            } else {
                entry.exception.stack_trace.as_str()
            };

            blocks.push(json!({
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": format!(":red_circle: Error #{} (x{})", index + 1, entry.count),
                    "emoji": true
                }
            }));
            blocks.push(Self::section(format!(
                "*First seen:* `{}`  *Last seen:* `{}`",
                entry.first_seen.format("%Y-%m-%d %H:%M:%S UTC"),
                entry.last_seen.format("%Y-%m-%d %H:%M:%S UTC"),
            )));
            blocks.push(Self::section(format!(
                "*URL:* `{}`  *Method:* `{}`",
                entry.request.url, entry.request.method
            )));
            if !headers.is_empty() {
                blocks.push(Self::section(format!("*Headers:*\n{headers}")));
            }
            blocks.push(Self::section(format!(
                "*Type:* `{}`\n*Message:* `{}`",
                entry.exception.type_name, entry.exception.message
            )));
            blocks.push(Self::section(format!(
                "*Stack Trace:*\n```{stack_trace}```"
            )));
            blocks.push(json!({ "type": "divider" }));
        }

        if let Some(url) = &self.dashboard_url {
            blocks.push(json!({
                "type": "actions",
                "elements": [{
                    "type": "button",
                    "text": { "type": "plain_text", "text": "View Error Logs" },
                    "url": url,
                    "style": "primary"
                }]
            }));
        }

        json!({ "blocks": blocks })
    }
}

#[async_trait]
impl AlertSink for SlackSink {
    fn name(&self) -> &str {
        "slack"
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

        tracing::debug!(entries = batch.len(), "Slack alert sent");
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
            RequestInfo::new("/orders", "GET").with_headers(vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), "Bearer secret".to_string()),
            ]),
        );
        entry.count = count;
        entry
    }

    fn sink(dashboard_url: Option<&str>) -> SlackSink {
        SlackSink::new(
            "https://hooks.slack.com/services/T/B/X".to_string(),
            dashboard_url.map(str::to_string),
        )
        .unwrap()
    }

    #[test]
    fn renders_one_payload_for_the_whole_batch() {
        let payload = sink(None).render(&[entry("boom", 3), entry("other", 1)]);
        let text = payload.to_string();

        assert!(text.contains("2 aggregated error(s)"));
        assert!(text.contains("Error #1 (x3)"));
        assert!(text.contains("Error #2 (x1)"));
    }

    #[test]
    fn payload_never_contains_authorization_header() {
        let payload = sink(None).render(&[entry("boom", 1)]);
        let text = payload.to_string();

        assert!(text.contains("application/json"));
        assert!(!text.contains("Bearer secret"));
    }

    #[test]
    fn dashboard_button_only_rendered_when_configured() {
        let without = sink(None).render(&[entry("boom", 1)]);
        let with = sink(Some("https://dash.example.com")).render(&[entry("boom", 1)]);

        assert!(!without.to_string().contains("View Error Logs"));
        assert!(with.to_string().contains("https://dash.example.com"));
    }

    #[test]
    fn missing_stack_trace_renders_placeholder() {
        let mut entry = entry("boom", 1);
        entry.exception.stack_trace.clear();

        let payload = sink(None).render(&[entry]);
        assert!(payload.to_string().contains("No stack trace available."));
    }
}
