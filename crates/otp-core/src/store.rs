//! OTP record storage
//!
//! The store is the exclusive owner of all `OtpRecord` instances, keyed by
//! subject id. `entry` is the atomicity primitive: the closure runs under
//! the store's lock, so every read-modify-write decision (attempt counting,
//! throttle checks, conditional removal) is serialized per subject and two
//! concurrent verify calls can never race on the same record.
//!
//! `MemoryStore` is the single-process in-memory authority. The trait exists
//! so a durable backend can be substituted as a type parameter without
//! touching the controller.

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::record::OtpRecord;

/// Keyed store of OTP lifecycle records.
///
/// Futures are `Send` so the controller can be driven from spawned tasks.
pub trait OtpStore: Send + Sync {
    /// Insert or replace the record for its subject.
    fn put(&self, record: OtpRecord) -> impl Future<Output = ()> + Send;

    /// Snapshot of the subject's record, if any.
    fn get(&self, subject: &str) -> impl Future<Output = Option<OtpRecord>> + Send;

    /// Remove and return the subject's record.
    fn remove(&self, subject: &str) -> impl Future<Output = Option<OtpRecord>> + Send;

    /// Run `f` against the subject's slot under the store lock.
    ///
    /// The closure sees `None` when no record exists and may mutate,
    /// replace, or clear the slot; the store applies the final slot state
    /// atomically with respect to every other operation on the subject.
    fn entry<T, F>(&self, subject: &str, f: F) -> impl Future<Output = T> + Send
    where
        F: FnOnce(&mut Option<OtpRecord>) -> T + Send,
        T: Send;

    /// Remove every record whose `expires_at` has passed, regardless of
    /// status. Returns the number of records removed.
    fn sweep_expired(&self, now: Instant) -> impl Future<Output = usize> + Send;

    /// Count of currently stored records (sanitized observability value).
    fn pending_count(&self) -> impl Future<Output = usize> + Send;
}

/// In-memory store over a mutex-guarded map.
///
/// Operations hold the lock only for the map access itself; delivery and
/// notification I/O always happen outside of `entry` closures.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, OtpRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OtpStore for MemoryStore {
    async fn put(&self, record: OtpRecord) {
        let mut records = self.records.lock().await;
        records.insert(record.subject_id.clone(), record);
    }

    async fn get(&self, subject: &str) -> Option<OtpRecord> {
        let records = self.records.lock().await;
        records.get(subject).cloned()
    }

    async fn remove(&self, subject: &str) -> Option<OtpRecord> {
        let mut records = self.records.lock().await;
        records.remove(subject)
    }

    async fn entry<T, F>(&self, subject: &str, f: F) -> T
    where
        F: FnOnce(&mut Option<OtpRecord>) -> T + Send,
        T: Send,
    {
        let mut records = self.records.lock().await;
        let mut slot = records.remove(subject);
        let out = f(&mut slot);
        if let Some(record) = slot {
            records.insert(subject.to_owned(), record);
        }
        out
    }

    async fn sweep_expired(&self, now: Instant) -> usize {
        // Snapshot the expired keys under one brief lock, then remove each
        // key in its own acquisition so foreground requests are never
        // stalled for longer than a single record's critical section.
        let expired: Vec<String> = {
            let records = self.records.lock().await;
            records
                .iter()
                .filter(|(_, record)| record.is_expired(now))
                .map(|(subject, _)| subject.clone())
                .collect()
        };

        let mut removed = 0;
        for subject in expired {
            let mut records = self.records.lock().await;
            // Re-check: a fresh code may have replaced the expired record
            // between the snapshot and this removal
            if records
                .get(&subject)
                .is_some_and(|record| record.is_expired(now))
            {
                records.remove(&subject);
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "removed expired records");
        }
        removed
    }

    async fn pending_count(&self) -> usize {
        let records = self.records.lock().await;
        records.len()
    }
}
