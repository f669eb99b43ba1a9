//! Short-lived snapshot cache in front of the remote worksheet.
//!
//! Every render pass goes through [`SnapshotCache::get_or_fetch`], so the
//! remote document is read at most once per TTL window per
//! `(locator, sheet)` pair no matter how often the dashboard re-renders.
//!
//! # Invalidation
//!
//! | Trigger | Effect |
//! |---------|--------|
//! | Entry older than TTL | Next lookup performs one remote read |
//! | Manual refresh | All entries dropped ([`SnapshotCache::invalidate_all`]) |
//! | Failed read | Nothing stored; previous entry (if any) already expired |
//!
//! Concurrent misses for the same key wait on a single read and share its
//! result, including its error.

use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::sheets::TabularSnapshot;

/// Identifies one worksheet of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
    pub locator: String,
    pub sheet_name: String,
}

impl SnapshotKey {
    #[must_use]
    pub fn new(locator: &str, sheet_name: &str) -> Self {
        Self {
            locator: locator.trim().to_string(),
            sheet_name: sheet_name.to_string(),
        }
    }
}

/// A snapshot together with the moment it was read.
#[derive(Debug, Clone)]
pub struct CachedSnapshot {
    pub snapshot: Arc<TabularSnapshot>,
    pub fetched_at: DateTime<Utc>,
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub entry: CachedSnapshot,
    /// `true` when served without a remote read.
    pub hit: bool,
}

#[derive(Clone)]
pub struct SnapshotCache {
    inner: Cache<SnapshotKey, CachedSnapshot>,
}

impl SnapshotCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    /// Return the cached snapshot for `key`, or run `fetch` once and store
    /// its result with a fresh timestamp.
    ///
    /// # Errors
    ///
    /// Returns whatever `fetch` returned; failures are not cached.
    pub async fn get_or_fetch<F>(&self, key: SnapshotKey, fetch: F) -> AppResult<Lookup>
    where
        F: Future<Output = AppResult<TabularSnapshot>>,
    {
        let entry = self
            .inner
            .entry(key.clone())
            .or_try_insert_with(async {
                let snapshot = fetch.await?;
                Ok::<_, AppError>(CachedSnapshot {
                    snapshot: Arc::new(snapshot),
                    fetched_at: Utc::now(),
                })
            })
            .await
            .map_err(|e: Arc<AppError>| (*e).clone())?;

        let hit = !entry.is_fresh();
        let cached = entry.into_value();

        if hit {
            tracing::debug!(
                locator = %key.locator,
                sheet = %key.sheet_name,
                fetched_at = %cached.fetched_at,
                "cache_hit"
            );
        } else {
            tracing::debug!(
                locator = %key.locator,
                sheet = %key.sheet_name,
                rows = cached.snapshot.len(),
                "cache_stored"
            );
        }

        Ok(Lookup { entry: cached, hit })
    }

    /// Drop one entry so the next lookup reads the remote document.
    pub async fn invalidate(&self, key: &SnapshotKey) {
        self.inner.invalidate(key).await;
        tracing::debug!(locator = %key.locator, sheet = %key.sheet_name, "cache_invalidated");
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
        tracing::debug!("cache_cleared");
    }
}
