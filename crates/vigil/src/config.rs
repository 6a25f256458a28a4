//! Pipeline configuration loaded from code or environment variables.

use std::time::Duration;

use vigil_infra::{ChannelConfig, StorageConfig};

#[cfg(feature = "smtp")]
use vigil_infra::EmailSettings;

/// Everything the pipeline needs to start.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How often the store is drained and dispatched.
    pub flush_interval: Duration,
    /// Upper bound on one `record` call, so a failing backend cannot stall
    /// the request paths that capture errors.
    pub capture_timeout: Duration,
    /// Per-sink delivery timeout, independent for each channel.
    pub sink_timeout: Duration,
    /// Deadline for the final flush on shutdown.
    pub shutdown_timeout: Duration,
    pub storage: StorageConfig,
    pub channels: Vec<ChannelConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(30 * 60),
            capture_timeout: Duration::from_secs(2),
            sink_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(5),
            storage: StorageConfig::Memory,
            channels: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// Channels are added for whichever of `VIGIL_SLACK_WEBHOOK_URL`,
    /// `VIGIL_TEAMS_WEBHOOK_URL`, and `VIGIL_SMTP_SERVER` are set; the
    /// storage backend comes from `VIGIL_STORAGE`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let dashboard_url = std::env::var("VIGIL_DASHBOARD_URL").ok();

        let mut channels = Vec::new();
        if let Ok(webhook_url) = std::env::var("VIGIL_SLACK_WEBHOOK_URL") {
            channels.push(ChannelConfig::Slack {
                webhook_url,
                dashboard_url: dashboard_url.clone(),
            });
        }
        if let Ok(webhook_url) = std::env::var("VIGIL_TEAMS_WEBHOOK_URL") {
            channels.push(ChannelConfig::Teams {
                webhook_url,
                dashboard_url: dashboard_url.clone(),
            });
        }
        #[cfg(feature = "smtp")]
        if let Ok(smtp_server) = std::env::var("VIGIL_SMTP_SERVER") {
            channels.push(ChannelConfig::SmtpEmail(EmailSettings {
                smtp_server,
                smtp_port: std::env::var("VIGIL_SMTP_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(587),
                smtp_username: std::env::var("VIGIL_SMTP_USERNAME").unwrap_or_default(),
                smtp_password: std::env::var("VIGIL_SMTP_PASSWORD").unwrap_or_default(),
                from: std::env::var("VIGIL_SMTP_FROM").unwrap_or_default(),
                to: env_address_list("VIGIL_SMTP_TO"),
                cc: env_address_list("VIGIL_SMTP_CC"),
                bcc: env_address_list("VIGIL_SMTP_BCC"),
            }));
        }

        Self {
            flush_interval: env_duration_secs("VIGIL_FLUSH_INTERVAL_SECS", defaults.flush_interval),
            capture_timeout: env_duration_secs("VIGIL_CAPTURE_TIMEOUT_SECS", defaults.capture_timeout),
            sink_timeout: env_duration_secs("VIGIL_SINK_TIMEOUT_SECS", defaults.sink_timeout),
            shutdown_timeout: env_duration_secs(
                "VIGIL_SHUTDOWN_TIMEOUT_SECS",
                defaults.shutdown_timeout,
            ),
            storage: StorageConfig::from_env(),
            channels,
        }
    }
}

fn env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(feature = "smtp")]
fn env_address_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
