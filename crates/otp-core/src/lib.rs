//! OTP lifecycle core
//!
//! Everything the webhook surface needs to issue and verify one-time
//! passcodes: the code generator, the webhook signature verifier, the
//! concurrency-safe record store, the background expiry sweep, and the
//! lifecycle controller that ties them to SMS delivery.
//!
//! The crate is transport-agnostic: HTTP wiring lives in the service, and
//! the SMS gateway is reached through `sms_delivery::SmsSender`.

pub mod code;
pub mod controller;
pub mod record;
pub mod signature;
pub mod store;
pub mod sweep;

pub use code::generate_code;
pub use controller::{Issued, IssueError, LifecycleController, OtpPolicy, VerifyOutcome};
pub use record::{OtpRecord, OtpStatus};
pub use signature::{sign, verify_signature};
pub use store::{MemoryStore, OtpStore};
pub use sweep::spawn_sweep_task;
