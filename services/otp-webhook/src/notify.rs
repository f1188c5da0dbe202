//! Identity-provider verification callback
//!
//! After a successful verify, the IdP is told the user's OTP factor
//! checked out. The callback is best-effort: the user has already been
//! verified locally, so a failed notification is logged and the request
//! still succeeds.

use std::time::Duration;

use common::Secret;
use tracing::{info, warn};

/// Client for the IdP management API.
pub struct IdpNotifier {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl IdpNotifier {
    pub fn new(
        base_url: &str,
        token: &Secret<String>,
        timeout: Duration,
    ) -> Result<Self, common::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| common::Error::Config(format!("failed to build idp client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.expose().clone(),
        })
    }

    /// Mark the subject's OTP factor as verified with the IdP.
    ///
    /// Failures are logged and swallowed; local verification already
    /// succeeded and must not be rolled back over a callback error.
    pub async fn notify_verified(&self, subject_id: &str) {
        let url = format!(
            "{}/management/v1/users/{}/otp/verify",
            self.base_url, subject_id
        );

        let result = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({}))
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                info!(subject_id, "notified idp of verified otp factor");
            }
            Ok(resp) => {
                warn!(
                    subject_id,
                    status = resp.status().as_u16(),
                    "idp rejected otp verification callback"
                );
            }
            Err(e) => {
                warn!(subject_id, error = %e, "idp verification callback failed");
            }
        }
    }
}
