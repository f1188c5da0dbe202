//! Background expiry sweep
//!
//! Abandoned flows leave records behind (issued but never verified); the
//! sweep bounds that growth. It runs on its own timer, independent of the
//! request path, and each cycle takes the store lock per removed key so
//! foreground requests are never stalled for a full map pass.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::store::OtpStore;

/// Spawn a periodic task that removes expired records.
///
/// Skips the immediate first tick — nothing can have expired at startup.
/// Updates the `otp_pending_records` gauge after every cycle so the
/// observability surface tracks the sanitized record count.
///
/// Returns a `JoinHandle` for the spawned task.
pub fn spawn_sweep_task<S>(store: Arc<S>, interval: Duration) -> tokio::task::JoinHandle<()>
where
    S: OtpStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = store.sweep_expired(Instant::now()).await;
            let pending = store.pending_count().await;

            metrics::counter!("otp_swept_records_total").increment(removed as u64);
            metrics::gauge!("otp_pending_records").set(pending as f64);

            if removed > 0 {
                info!(removed, pending, "swept expired otp records");
            } else {
                debug!(pending, "sweep cycle found no expired records");
            }
        }
    })
}
