//! Message delivery to a chat webhook
//!
//! Each message becomes one attachment carrying its color. Delivery is
//! a single best-effort attempt; failures are logged and dropped.

pub mod transport;

use serde::{Deserialize, Serialize};

use crate::config::redact_url;

pub use transport::{PrintTransport, Transport, WebhookTransport};

/// Attachment color understood by the chat service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Good,
    Warning,
    Danger,
}

/// A formatted message bound for one channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub channel: String,
    pub color: Color,
}

impl Message {
    pub fn new(text: impl Into<String>, channel: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            channel: channel.into(),
            color,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Field {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub fallback: String,
    pub fields: Vec<Field>,
    pub color: Color,
    pub mrkdwn_in: Vec<String>,
}

/// Wire body posted to the webhook
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payload {
    pub channel: String,
    pub username: String,
    pub attachments: Vec<Attachment>,
    pub parse: String,
    pub icon_url: String,
}

impl Payload {
    pub fn new(message: &Message, username: &str, icon_url: &str) -> Self {
        Self {
            channel: message.channel.clone(),
            username: username.to_string(),
            attachments: vec![Attachment {
                fallback: message.text.clone(),
                fields: vec![Field {
                    value: message.text.clone(),
                }],
                color: message.color,
                mrkdwn_in: ["text", "fallback", "fields"].iter().map(|s| s.to_string()).collect(),
            }],
            parse: "none".to_string(),
            icon_url: icon_url.to_string(),
        }
    }
}

/// Posts messages to a fixed endpoint through a transport
pub struct Delivery {
    webhook_url: String,
    username: String,
    icon_url: String,
    transport: Box<dyn Transport>,
}

impl Delivery {
    pub fn new(
        webhook_url: impl Into<String>,
        username: impl Into<String>,
        icon_url: impl Into<String>,
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            username: username.into(),
            icon_url: icon_url.into(),
            transport,
        }
    }

    /// Endpoint with the token path stripped
    fn endpoint_for_log(&self) -> String {
        redact_url(&self.webhook_url)
    }

    /// Send one message. Never fails; problems end up as a warning.
    pub fn deliver(&self, message: &Message) {
        let payload = Payload::new(message, &self.username, &self.icon_url);

        let body = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Could not encode message for webhook: {}", e);
                return;
            }
        };

        log::debug!("{}", body);
        log::debug!("{}", self.endpoint_for_log());

        if let Err(e) = self.transport.post(&self.webhook_url, &body) {
            log::warn!("Could not submit message to webhook: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::transport::RecordingTransport;
    use eyre::Result;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Broken(Arc<AtomicUsize>);

    impl Transport for Broken {
        fn post(&self, _url: &str, _body: &str) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            eyre::bail!("connection refused")
        }
    }

    #[test]
    fn test_payload_shape() {
        let message = Message::new("*fatal*", "#ansible", Color::Danger);
        let payload = Payload::new(&message, "ansible", "https://example.com/icon.png");
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "channel": "#ansible",
                "username": "ansible",
                "attachments": [{
                    "fallback": "*fatal*",
                    "fields": [{"value": "*fatal*"}],
                    "color": "danger",
                    "mrkdwn_in": ["text", "fallback", "fields"],
                }],
                "parse": "none",
                "icon_url": "https://example.com/icon.png",
            })
        );
    }

    #[test]
    fn test_deliver_posts_once_to_endpoint() {
        let recorder = RecordingTransport::default();
        let delivery = Delivery::new(
            "https://hooks.example.com/T000",
            "deploybot",
            "https://example.com/icon.png",
            Box::new(recorder.clone()),
        );

        delivery.deliver(&Message::new("hello", "#ops", Color::Good));

        let sent = recorder.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "https://hooks.example.com/T000");
        let payload: Payload = serde_json::from_str(&sent[0].1).unwrap();
        assert_eq!(payload.channel, "#ops");
        assert_eq!(payload.username, "deploybot");
        assert_eq!(payload.attachments[0].color, Color::Good);
    }

    #[test]
    fn test_deliver_swallows_transport_error_without_retry() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let delivery = Delivery::new(
            "https://hooks.example.com/T000",
            "ansible",
            "",
            Box::new(Broken(attempts.clone())),
        );

        // Should not panic or propagate
        delivery.deliver(&Message::new("hello", "#ops", Color::Warning));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);

        delivery.deliver(&Message::new("again", "#ops", Color::Danger));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_logged_endpoint_hides_token() {
        let delivery = Delivery::new(
            "https://hooks.slack.com/services/T000/B000/s3cr3t",
            "ansible",
            "",
            Box::new(RecordingTransport::default()),
        );
        let logged = delivery.endpoint_for_log();
        assert_eq!(logged, "https://hooks.slack.com/…");
        assert!(!logged.contains("s3cr3t"));
    }
}
