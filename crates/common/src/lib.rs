//! Common types for the SMS OTP Gateway

mod secret;
mod error;

pub use secret::Secret;
pub use error::{Error, Result};
