//! OTP record and status types

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Lifecycle status of a record.
///
/// Transitions:
/// - Pending → Verified (correct code within budget)
/// - Pending → Expired (TTL elapsed)
/// - Pending → Exhausted (attempt cap reached)
/// - Pending → SendFailed (delivery failed after the record was stored)
///
/// Every non-Pending status is terminal: the controller sets it and removes
/// the record in the same critical section, so a fresh issuance always
/// starts from Pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpStatus {
    Pending,
    Verified,
    Expired,
    Exhausted,
    SendFailed,
}

impl OtpStatus {
    /// Status label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            OtpStatus::Pending => "pending",
            OtpStatus::Verified => "verified",
            OtpStatus::Expired => "expired",
            OtpStatus::Exhausted => "exhausted",
            OtpStatus::SendFailed => "send_failed",
        }
    }
}

/// One subject's active OTP state.
///
/// `sent_at` drives the resend cooldown and is distinct from `created_at`
/// only in meaning today (a record is created when its code is sent); a
/// durable store replaying history would keep them separate.
#[derive(Clone)]
pub struct OtpRecord {
    pub subject_id: String,
    /// The current secret. Redacted from Debug; never logged or echoed.
    pub code: String,
    /// Normalized destination number (audit/resend).
    pub phone_number: String,
    /// Event tag from the identity provider ("login_otp", ...).
    pub event: Option<String>,
    pub created_at: Instant,
    pub sent_at: Instant,
    pub expires_at: Instant,
    /// Verification attempts made against this code.
    pub attempts: u32,
    pub status: OtpStatus,
    /// Gateway message id, recorded after confirmed delivery.
    pub provider_message_id: Option<String>,
}

impl OtpRecord {
    /// Build a fresh pending record whose code was just generated.
    pub fn new(
        subject_id: &str,
        code: String,
        phone_number: String,
        event: Option<String>,
        now: Instant,
        ttl: Duration,
    ) -> Self {
        Self {
            subject_id: subject_id.to_owned(),
            code,
            phone_number,
            event,
            created_at: now,
            sent_at: now,
            expires_at: now + ttl,
            attempts: 0,
            status: OtpStatus::Pending,
            provider_message_id: None,
        }
    }

    /// Whether the record's TTL has elapsed at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

// Hand-written so the code can never leak through {:?} in a log line.
impl fmt::Debug for OtpRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpRecord")
            .field("subject_id", &self.subject_id)
            .field("code", &"[REDACTED]")
            .field("phone_number", &self.phone_number)
            .field("event", &self.event)
            .field("attempts", &self.attempts)
            .field("status", &self.status.label())
            .field("provider_message_id", &self.provider_message_id)
            .finish()
    }
}
