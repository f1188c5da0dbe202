//! SMS delivery abstraction for OTP codes
//!
//! Defines the `SmsSender` trait that decouples the OTP lifecycle from the
//! concrete messaging gateway. `GatewayClient` implements it against a
//! Kavenegar-style HTTP API; tests substitute their own implementations.
//!
//! Every failure mode is a tagged result so the lifecycle controller can
//! decide on store cleanup deterministically — delivery never panics and
//! never leaves the outcome ambiguous.

pub mod gateway;

pub use gateway::GatewayClient;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Confirmation from the gateway that a message was accepted for delivery.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    /// Gateway-assigned message id, when the gateway reports one.
    pub message_id: Option<String>,
}

/// Delivery failures, split by who failed.
///
/// `Provider` means the gateway received the request and rejected it
/// (4xx or an application-level error payload) — retrying with the same
/// input will fail again. `Transport` means the request never completed
/// (connect error, timeout) and the delivery outcome is unknown.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("gateway rejected message (status {status}): {detail}")]
    Provider { status: u16, detail: String },

    #[error("delivery transport failed: {0}")]
    Transport(String),
}

/// Result alias for delivery operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Abstraction over SMS delivery backends.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn SmsSender>` held by the lifecycle controller).
pub trait SmsSender: Send + Sync {
    /// Identifier for logging ("gateway", "mock", ...)
    fn id(&self) -> &str;

    /// Deliver `message` to the already-normalized `phone` number.
    fn send<'a>(
        &'a self,
        phone: &'a str,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryReceipt>> + Send + 'a>>;
}

/// Normalize a destination phone number for the gateway.
///
/// Strips all whitespace and a leading `+` international prefix marker.
/// The gateway expects bare digits with the country code.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    digits.strip_prefix('+').unwrap_or(&digits).to_owned()
}

/// Render the SMS body for a verification code.
pub fn render_message(code: &str, ttl: Duration) -> String {
    format!(
        "Your verification code is: {code}\nThis code will expire in {} minutes.",
        ttl.as_secs() / 60
    )
}
