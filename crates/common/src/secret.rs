//! Secret wrapper for sensitive values
//!
//! The webhook shared secret, SMS gateway API key, and IdP token all pass
//! through this wrapper so that no Debug/Display path can leak them into
//! logs or error messages.

use std::fmt;
use std::path::Path;
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Sensitive value - redacted in Debug/Display/logs
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    /// Create a new secret value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the inner value (use sparingly)
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// Resolve a secret from an environment variable, falling back to a file.
    ///
    /// Env var takes precedence. File contents are trimmed; an empty or
    /// whitespace-only file counts as absent. Returns `MissingSecret` naming
    /// the env var if neither source yields a value.
    pub fn resolve(env_var: &str, file: Option<&Path>) -> Result<Self> {
        if let Ok(value) = std::env::var(env_var) {
            if !value.is_empty() {
                return Ok(Self::new(value));
            }
        }
        if let Some(path) = file {
            let contents = std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("failed to read secret file {}: {e}", path.display()))
            })?;
            let trimmed = contents.trim();
            if !trimmed.is_empty() {
                return Ok(Self::new(trimmed.to_owned()));
            }
        }
        Err(Error::MissingSecret(env_var.to_owned()))
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
