//! Best-effort Telegram notification sink.
//!
//! Lifecycle events (registration, approval, redemption, deletion) are
//! forwarded to a Telegram chat. Delivery is strictly fire-and-forget:
//! the send runs on a spawned task, is never awaited by the caller, and
//! every failure is logged and swallowed. A notification failure must
//! never abort or roll back the operation that triggered it.

use serde_json::json;

use crate::config::AppConfig;

/// Fire-and-forget notification sink backed by the Telegram Bot API.
///
/// Constructed once at startup; cloned freely into the services. When
/// the bot token or chat ID is missing the sink is disabled and sends
/// are logged at debug level instead.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl Notifier {
    /// Builds a notifier from the service configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token: config.telegram_bot_token.clone(),
            chat_id: config.telegram_chat_id.clone(),
        }
    }

    /// Returns `true` when both bot token and chat ID are configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }

    /// Sends a message without waiting for the result.
    ///
    /// The HTTP call runs on its own task; transport errors and non-2xx
    /// responses are logged and dropped.
    pub fn notify(&self, text: String) {
        if !self.is_configured() {
            tracing::debug!("notification sink not configured, dropping message");
            return;
        }

        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let client = self.client.clone();
        let chat_id = self.chat_id.clone();

        tokio::spawn(async move {
            let body = json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
            });
            match client.post(&url).json(&body).send().await {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!(status = %response.status(), "notification rejected");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "notification send failed");
                }
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_sink_is_detected() {
        let config = AppConfig::default();
        let notifier = Notifier::from_config(&config);
        assert!(!notifier.is_configured());
    }

    #[tokio::test]
    async fn notify_on_unconfigured_sink_is_a_no_op() {
        let notifier = Notifier::from_config(&AppConfig::default());
        // Must return immediately without spawning or erroring.
        notifier.notify("hello".to_string());
    }

    #[test]
    fn configured_sink_is_detected() {
        let config = AppConfig {
            telegram_bot_token: "123:abc".to_string(),
            telegram_chat_id: "-100".to_string(),
            ..AppConfig::default()
        };
        assert!(Notifier::from_config(&config).is_configured());
    }
}
