//! Ways of getting a payload body to its destination

use eyre::{Context, Result};
use std::io::Write;

/// Sends an already-encoded JSON body
pub trait Transport: Send + Sync {
    fn post(&self, url: &str, body: &str) -> Result<()>;
}

/// POSTs to the webhook over HTTP(S). Non-2xx responses are errors.
pub struct WebhookTransport;

impl Transport for WebhookTransport {
    fn post(&self, url: &str, body: &str) -> Result<()> {
        ureq::post(url)
            .header("Content-Type", "application/json")
            .send(body.as_bytes())
            .map(|_| ())
            .map_err(|e| eyre::eyre!("HTTP request failed: {}", e))
    }
}

/// Writes each body as a JSON line to stdout instead of sending it
pub struct PrintTransport;

impl Transport for PrintTransport {
    fn post(&self, _url: &str, body: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", body).context("Failed to write payload to stdout")?;
        stdout.flush().context("Failed to flush stdout")
    }
}

/// Keeps every body it is handed, for assertions
#[cfg(test)]
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: std::sync::Arc<std::sync::Mutex<Vec<(String, String)>>>,
}

#[cfg(test)]
impl RecordingTransport {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    #[cfg(feature = "summary-table")]
    pub fn payloads(&self) -> Vec<super::Payload> {
        self.sent()
            .iter()
            .map(|(_, body)| serde_json::from_str(body).unwrap())
            .collect()
    }
}

#[cfg(test)]
impl Transport for RecordingTransport {
    fn post(&self, url: &str, body: &str) -> Result<()> {
        self.sent.lock().unwrap().push((url.to_string(), body.to_string()));
        Ok(())
    }
}
