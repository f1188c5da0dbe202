//! OTP lifecycle controller — the state machine
//!
//! Per subject: `NoRecord → Pending → {Verified, Expired, Exhausted,
//! SendFailed}`. Terminal states remove the record, so a new issuance
//! always starts a fresh Pending record.
//!
//! Every decision runs inside a store `entry` closure (serialized per
//! subject); the only awaited I/O is the bounded SMS send, which happens
//! outside the lock. A failed send rolls the store back so no
//! verifiable-but-undelivered code survives.

use std::sync::Arc;
use std::time::Duration;

use subtle::ConstantTimeEq;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use sms_delivery::{DeliveryError, SmsSender, normalize_phone, render_message};

use crate::code::generate_code;
use crate::record::{OtpRecord, OtpStatus};
use crate::store::OtpStore;

/// Lifecycle policy knobs.
#[derive(Debug, Clone, Copy)]
pub struct OtpPolicy {
    /// Validity window of an issued code.
    pub ttl: Duration,
    /// Verification attempts allowed per code.
    pub max_attempts: u32,
    /// Minimum interval between sends for one subject.
    pub resend_cooldown: Duration,
    /// Tail of the TTL during which a plain issue may replace a still
    /// pending code. A pending record with more remaining TTL than this
    /// rejects issuance as already-sent.
    pub reissue_window: Duration,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_attempts: 3,
            resend_cooldown: Duration::from_secs(60),
            reissue_window: Duration::from_secs(60),
        }
    }
}

/// Successful issuance: the code is stored and on its way to the phone.
#[derive(Debug, Clone)]
pub struct Issued {
    /// Gateway message id, when the gateway reported one.
    pub provider_message_id: Option<String>,
    /// The caller (IdP action) must now require the second-factor
    /// challenge for this subject.
    pub require_challenge: bool,
}

/// Issuance and resend failures.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("phone number is missing")]
    PhoneMissing,

    #[error("a code was already sent and is still active")]
    AlreadySent,

    #[error("resend throttled, retry in {retry_after_secs}s")]
    Throttled { retry_after_secs: u64 },

    #[error("gateway rejected delivery: {0}")]
    SendRejected(String),

    #[error("delivery transport failed: {0}")]
    SendFailed(String),
}

impl IssueError {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            IssueError::PhoneMissing => "phone_missing",
            IssueError::AlreadySent => "otp_already_sent",
            IssueError::Throttled { .. } => "throttled",
            IssueError::SendRejected(_) => "send_failed",
            IssueError::SendFailed(_) => "send_error",
        }
    }
}

/// Outcome of a verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Code matched; the record is gone and the second factor is satisfied.
    Verified,
    /// No active record for the subject.
    NotFound,
    /// TTL elapsed; the record was removed without consuming an attempt.
    Expired,
    /// Attempt cap reached; the record was removed.
    TooManyAttempts,
    /// Wrong code; `remaining` attempts left before exhaustion.
    InvalidCode { remaining: u32 },
    /// No code submitted yet (caller is polling); one attempt consumed.
    AwaitInput { attempts: u32 },
}

impl VerifyOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            VerifyOutcome::Verified => "verified",
            VerifyOutcome::NotFound => "no_code_found",
            VerifyOutcome::Expired => "expired",
            VerifyOutcome::TooManyAttempts => "too_many_attempts",
            VerifyOutcome::InvalidCode { .. } => "invalid_code",
            VerifyOutcome::AwaitInput { .. } => "await_input",
        }
    }
}

/// Orchestrates issuance, verification, resend throttling, and cleanup.
pub struct LifecycleController<S> {
    store: Arc<S>,
    sender: Arc<dyn SmsSender>,
    policy: OtpPolicy,
}

impl<S: OtpStore> LifecycleController<S> {
    pub fn new(store: Arc<S>, sender: Arc<dyn SmsSender>, policy: OtpPolicy) -> Self {
        Self {
            store,
            sender,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn policy(&self) -> &OtpPolicy {
        &self.policy
    }

    /// Issue a fresh code for the subject and dispatch it by SMS.
    ///
    /// Rejects when no phone number is present, or when a pending record
    /// still has more remaining TTL than the reissue window. On delivery
    /// failure the freshly stored record is removed again so the subject
    /// is left with no verifiable code.
    pub async fn issue(
        &self,
        subject: &str,
        phone: Option<&str>,
        event: Option<String>,
    ) -> Result<Issued, IssueError> {
        let phone = phone
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(IssueError::PhoneMissing)?;
        let destination = normalize_phone(phone);

        let now = Instant::now();
        let code = generate_code();
        let record = OtpRecord::new(
            subject,
            code.clone(),
            destination.clone(),
            event,
            now,
            self.policy.ttl,
        );

        let reissue_window = self.policy.reissue_window;
        let accepted = self
            .store
            .entry(subject, move |slot| {
                if let Some(existing) = slot {
                    let still_active = existing.status == OtpStatus::Pending
                        && existing.expires_at > now + reissue_window;
                    if still_active {
                        return false;
                    }
                }
                *slot = Some(record);
                true
            })
            .await;

        if !accepted {
            metrics::counter!("otp_issue_total", "outcome" => "otp_already_sent").increment(1);
            return Err(IssueError::AlreadySent);
        }

        // Dispatch outside the store lock. The gateway client carries its
        // own bounded timeout; a timeout surfaces as a transport failure.
        let message = render_message(&code, self.policy.ttl);
        match self.sender.send(&destination, &message).await {
            Ok(receipt) => {
                let message_id = receipt.message_id.clone();
                let issued_code = code;
                self.store
                    .entry(subject, move |slot| {
                        if let Some(rec) = slot.as_mut() {
                            if rec.code == issued_code {
                                rec.provider_message_id = message_id;
                            }
                        }
                    })
                    .await;

                info!(subject, sender = self.sender.id(), "otp issued and dispatched");
                metrics::counter!("otp_issue_total", "outcome" => "sent").increment(1);
                Ok(Issued {
                    provider_message_id: receipt.message_id,
                    require_challenge: true,
                })
            }
            Err(err) => {
                // Remove only the record this call created; a concurrent
                // reissue may already have replaced it with a newer code.
                let issued_code = code;
                self.store
                    .entry(subject, move |slot| {
                        if slot.as_ref().is_some_and(|rec| rec.code == issued_code) {
                            if let Some(rec) = slot.as_mut() {
                                rec.status = OtpStatus::SendFailed;
                            }
                            *slot = None;
                        }
                    })
                    .await;

                warn!(subject, error = %err, "sms delivery failed, record rolled back");
                let issue_err = match err {
                    DeliveryError::Provider { status, detail } => {
                        IssueError::SendRejected(format!("status {status}: {detail}"))
                    }
                    DeliveryError::Transport(detail) => IssueError::SendFailed(detail),
                };
                metrics::counter!("otp_issue_total", "outcome" => issue_err.label())
                    .increment(1);
                Err(issue_err)
            }
        }
    }

    /// Check a submitted code against the subject's active record.
    ///
    /// Expiry is checked before any attempt-count logic; a record past its
    /// TTL is rejected and removed regardless of code correctness. An
    /// absent `submitted` value is the polling case: it consumes an
    /// attempt and signals the caller to keep waiting for input.
    pub async fn verify(&self, subject: &str, submitted: Option<&str>) -> VerifyOutcome {
        let now = Instant::now();
        let max_attempts = self.policy.max_attempts;
        let submitted = submitted
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        let outcome = self
            .store
            .entry(subject, move |slot| {
                let Some(rec) = slot.as_mut() else {
                    return VerifyOutcome::NotFound;
                };

                if rec.is_expired(now) {
                    rec.status = OtpStatus::Expired;
                    *slot = None;
                    return VerifyOutcome::Expired;
                }

                if rec.attempts >= max_attempts {
                    rec.status = OtpStatus::Exhausted;
                    *slot = None;
                    return VerifyOutcome::TooManyAttempts;
                }

                match submitted {
                    None => {
                        rec.attempts += 1;
                        VerifyOutcome::AwaitInput {
                            attempts: rec.attempts,
                        }
                    }
                    Some(code) if codes_match(&code, &rec.code) => {
                        rec.status = OtpStatus::Verified;
                        *slot = None;
                        VerifyOutcome::Verified
                    }
                    Some(_) => {
                        rec.attempts += 1;
                        if rec.attempts >= max_attempts {
                            rec.status = OtpStatus::Exhausted;
                            *slot = None;
                            VerifyOutcome::TooManyAttempts
                        } else {
                            VerifyOutcome::InvalidCode {
                                remaining: max_attempts - rec.attempts,
                            }
                        }
                    }
                }
            })
            .await;

        match &outcome {
            VerifyOutcome::Verified => info!(subject, "otp verified"),
            VerifyOutcome::TooManyAttempts => {
                warn!(subject, "attempt cap reached, code invalidated");
            }
            VerifyOutcome::InvalidCode { remaining } => {
                warn!(subject, remaining, "invalid otp attempt");
            }
            _ => {}
        }
        metrics::counter!("otp_verify_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    /// Re-issue a code, throttled to one send per cooldown interval.
    ///
    /// Inside the cooldown this is a pure rejection (no side effects).
    /// Past it, the old record is removed — the old code can no longer
    /// verify — and issuance proceeds as usual.
    pub async fn resend(
        &self,
        subject: &str,
        phone: Option<&str>,
        event: Option<String>,
    ) -> Result<Issued, IssueError> {
        let now = Instant::now();
        let cooldown = self.policy.resend_cooldown;

        let wait = self
            .store
            .entry(subject, move |slot| {
                let Some(rec) = slot.as_mut() else {
                    return None;
                };
                let elapsed = now.saturating_duration_since(rec.sent_at);
                if elapsed < cooldown {
                    let remaining = cooldown - elapsed;
                    // Round up so the caller never retries a second early
                    Some(remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0))
                } else {
                    *slot = None;
                    None
                }
            })
            .await;

        if let Some(retry_after_secs) = wait {
            metrics::counter!("otp_issue_total", "outcome" => "throttled").increment(1);
            return Err(IssueError::Throttled { retry_after_secs });
        }

        self.issue(subject, phone, event).await
    }
}

/// Constant-time code comparison; differing lengths compare unequal.
fn codes_match(submitted: &str, stored: &str) -> bool {
    submitted.as_bytes().ct_eq(stored.as_bytes()).into()
}
