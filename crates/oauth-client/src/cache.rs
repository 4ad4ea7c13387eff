//! Single-slot in-memory token cache
//!
//! Holds at most one `TokenRecord` and owns the expiry policy: a record is
//! fresh while `now < issued_at + expires_in - EARLY_REFRESH_MARGIN_SECS`.
//! The cache is an ordinary owned value, so several clients in one process
//! each get their own slot.
//!
//! The mutex only makes the slot shareable through `Arc`. It is never held
//! across an `.await` and does not de-duplicate concurrent refreshes.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::constants::EARLY_REFRESH_MARGIN_SECS;
use crate::token::{TokenRecord, now_unix_secs};

#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<TokenRecord>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record stamped with the current time, replacing any prior one.
    pub fn set(&self, record: TokenRecord) {
        self.set_at(record, now_unix_secs());
    }

    /// Store a record stamped with `now`. Any `issued_at` the record carries
    /// is discarded.
    pub fn set_at(&self, mut record: TokenRecord, now: u64) {
        record.issued_at = now;
        *self.lock() = Some(record);
    }

    /// The stored record if it is still fresh.
    pub fn get(&self) -> Option<TokenRecord> {
        self.get_at(now_unix_secs())
    }

    /// The stored record if it is fresh at `now`.
    pub fn get_at(&self, now: u64) -> Option<TokenRecord> {
        let slot = self.lock();
        let record = slot.as_ref()?;
        let boundary = record.expiry_boundary(EARLY_REFRESH_MARGIN_SECS);
        if now >= boundary {
            debug!(
                issued_at = record.issued_at,
                expires_in = record.expires_in,
                now,
                "cached token expired or near expiry"
            );
            return None;
        }
        Some(record.clone())
    }

    /// The last stored record regardless of freshness.
    ///
    /// Only for reading a refresh token that may outlive its access token.
    /// Anything that needs a usable access token must go through [`get`](Self::get).
    pub fn peek_raw(&self) -> Option<TokenRecord> {
        self.lock().clone()
    }

    /// Drop the stored record. Safe to call on an empty cache.
    pub fn clear(&self) {
        if self.lock().take().is_some() {
            debug!("token cache cleared");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    fn lock(&self) -> MutexGuard<'_, Option<TokenRecord>> {
        // The slot holds plain data; a panic elsewhere cannot leave it torn.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
