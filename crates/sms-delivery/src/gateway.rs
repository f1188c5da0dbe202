//! HTTP client for the SMS gateway
//!
//! Speaks the Kavenegar-style send API: a form POST to
//! `{base}/v1/{api_key}/sms/send.json` with `receptor`, `message`, and
//! `sender` fields. The gateway answers with an application-level status
//! inside the JSON envelope in addition to the HTTP status, and both must
//! be checked — a 200 response can still carry a rejection.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use common::Secret;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{DeliveryError, DeliveryReceipt, Result, SmsSender};

/// Application-level status the gateway uses for "accepted".
const GATEWAY_OK: u16 = 200;

/// Response envelope from the send endpoint.
///
/// `entries` is present on success and carries one element per receptor;
/// we send to a single receptor, so only the first entry matters.
#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(rename = "return")]
    envelope: ResponseEnvelope,
    #[serde(default)]
    entries: Vec<SendEntry>,
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    status: u16,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct SendEntry {
    messageid: Option<u64>,
}

/// SMS gateway client with a bounded per-request timeout.
///
/// The API key is embedded in the URL path by the gateway's protocol; the
/// full send URL is computed once at construction so the key is never
/// formatted again (and never logged — log lines carry only the base URL).
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
    send_url: String,
    sender: String,
}

impl GatewayClient {
    /// Build a client for the given gateway.
    ///
    /// `timeout` bounds the whole send call; an elapsed timeout surfaces
    /// as `DeliveryError::Transport`, never as a hang.
    pub fn new(
        base_url: &str,
        api_key: &Secret<String>,
        sender: String,
        timeout: Duration,
    ) -> std::result::Result<Self, common::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| common::Error::Config(format!("building gateway client: {e}")))?;

        let base = base_url.trim_end_matches('/').to_owned();
        let send_url = format!("{base}/v1/{}/sms/send.json", api_key.expose());

        Ok(Self {
            client,
            base_url: base,
            send_url,
            sender,
        })
    }

    async fn send_inner(&self, phone: &str, message: &str) -> Result<DeliveryReceipt> {
        let response = self
            .client
            .post(&self.send_url)
            .form(&[
                ("receptor", phone),
                ("message", message),
                ("sender", self.sender.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::Transport(format!("gateway request timed out: {e}"))
                } else {
                    DeliveryError::Transport(format!("gateway request failed: {e}"))
                }
            })?;

        let http_status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DeliveryError::Transport(format!("reading gateway response: {e}")))?;

        if !http_status.is_success() {
            warn!(gateway = %self.base_url, status = %http_status, "gateway rejected send");
            return Err(DeliveryError::Provider {
                status: http_status.as_u16(),
                detail: truncate(&body, 256),
            });
        }

        let parsed: SendResponse = serde_json::from_str(&body).map_err(|e| {
            DeliveryError::Provider {
                status: http_status.as_u16(),
                detail: format!("unparseable gateway response: {e}"),
            }
        })?;

        if parsed.envelope.status != GATEWAY_OK {
            warn!(
                gateway = %self.base_url,
                app_status = parsed.envelope.status,
                "gateway reported application-level failure"
            );
            return Err(DeliveryError::Provider {
                status: parsed.envelope.status,
                detail: parsed.envelope.message,
            });
        }

        let message_id = parsed
            .entries
            .first()
            .and_then(|e| e.messageid)
            .map(|id| id.to_string());
        debug!(gateway = %self.base_url, message_id = ?message_id, "sms accepted by gateway");

        Ok(DeliveryReceipt { message_id })
    }
}

impl SmsSender for GatewayClient {
    fn id(&self) -> &str {
        "gateway"
    }

    fn send<'a>(
        &'a self,
        phone: &'a str,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryReceipt>> + Send + 'a>> {
        Box::pin(self.send_inner(phone, message))
    }
}

/// Cap `s` at `max` bytes without splitting a multibyte character.
/// Gateway error bodies are arbitrary text (often non-ASCII).
fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_owned();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
