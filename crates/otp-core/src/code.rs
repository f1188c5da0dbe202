//! OTP code generation
//!
//! Codes come from the thread-local CSPRNG. Predictable codes are a direct
//! authentication bypass, so a non-cryptographic generator is not an option
//! here regardless of performance.

use rand::RngExt;

/// Number of digits in a generated code.
pub const CODE_LEN: usize = 6;

/// Generate a 6-digit numeric code, uniform over `000000..=999999`.
///
/// Zero-padded so every code has exactly [`CODE_LEN`] characters.
pub fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(0..1_000_000);
    format!("{n:06}")
}
