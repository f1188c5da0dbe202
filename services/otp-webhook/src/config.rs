//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Secrets (webhook shared secret, SMS API key, IdP token) are resolved
//! from env vars or `*_file` paths into `common::Secret`, never stored in
//! the TOML directly to avoid leaking them through config dumps.

use common::Secret;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    pub webhook: WebhookConfig,
    pub sms: SmsConfig,
    #[serde(default)]
    pub idp: Option<IdpConfig>,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// OTP lifecycle policy knobs (all optional; spec defaults)
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OtpConfig {
    pub ttl_secs: u64,
    pub max_attempts: u32,
    pub resend_cooldown_secs: u64,
    pub reissue_window_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_attempts: 3,
            resend_cooldown_secs: 60,
            reissue_window_secs: 60,
            sweep_interval_secs: 300,
        }
    }
}

/// Inbound webhook authentication
#[derive(Debug, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret resolved from WEBHOOK_SECRET or secret_file
    #[serde(skip)]
    pub secret: Option<Secret<String>>,
    #[serde(default)]
    pub secret_file: Option<PathBuf>,
}

/// SMS gateway settings
#[derive(Debug, Deserialize)]
pub struct SmsConfig {
    pub gateway_url: String,
    pub sender: String,
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
    /// API key resolved from SMS_API_KEY or api_key_file
    #[serde(skip)]
    pub api_key: Option<Secret<String>>,
    #[serde(default)]
    pub api_key_file: Option<PathBuf>,
}

/// Identity provider notification target (optional; when absent, successful
/// verifications are not pushed back to the IdP)
#[derive(Debug, Deserialize)]
pub struct IdpConfig {
    pub base_url: String,
    #[serde(default = "default_notify_timeout")]
    pub notify_timeout_secs: u64,
    /// Token resolved from IDP_API_TOKEN or api_token_file
    #[serde(skip)]
    pub api_token: Option<Secret<String>>,
    #[serde(default)]
    pub api_token_file: Option<PathBuf>,
}

fn default_max_connections() -> usize {
    1024
}

fn default_send_timeout() -> u64 {
    5
}

fn default_notify_timeout() -> u64 {
    5
}

impl OtpConfig {
    /// Convert to the core policy struct.
    pub fn policy(&self) -> otp_core::OtpPolicy {
        otp_core::OtpPolicy {
            ttl: Duration::from_secs(self.ttl_secs),
            max_attempts: self.max_attempts,
            resend_cooldown: Duration::from_secs(self.resend_cooldown_secs),
            reissue_window: Duration::from_secs(self.reissue_window_secs),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then resolve secrets from the
    /// environment (env vars take precedence over `*_file` paths).
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if !config.sms.gateway_url.starts_with("http://")
            && !config.sms.gateway_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "sms.gateway_url must start with http:// or https://, got: {}",
                config.sms.gateway_url
            )));
        }

        if config.sms.send_timeout_secs == 0 {
            return Err(common::Error::Config(
                "sms.send_timeout_secs must be greater than 0".into(),
            ));
        }

        if config.otp.ttl_secs == 0 || config.otp.max_attempts == 0 {
            return Err(common::Error::Config(
                "otp.ttl_secs and otp.max_attempts must be greater than 0".into(),
            ));
        }

        // A reissue window at or above the TTL would disable the
        // already-sent throttle entirely
        if config.otp.reissue_window_secs >= config.otp.ttl_secs {
            return Err(common::Error::Config(format!(
                "otp.reissue_window_secs ({}) must be shorter than otp.ttl_secs ({})",
                config.otp.reissue_window_secs, config.otp.ttl_secs
            )));
        }

        if let Some(idp) = &config.idp {
            if !idp.base_url.starts_with("http://") && !idp.base_url.starts_with("https://") {
                return Err(common::Error::Config(format!(
                    "idp.base_url must start with http:// or https://, got: {}",
                    idp.base_url
                )));
            }
        }

        config.webhook.secret = Some(Secret::resolve(
            "WEBHOOK_SECRET",
            config.webhook.secret_file.as_deref(),
        )?);
        config.sms.api_key = Some(Secret::resolve(
            "SMS_API_KEY",
            config.sms.api_key_file.as_deref(),
        )?);
        if let Some(idp) = &mut config.idp {
            idp.api_token = Some(Secret::resolve(
                "IDP_API_TOKEN",
                idp.api_token_file.as_deref(),
            )?);
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("sms-otp-webhook.toml")
    }
}
