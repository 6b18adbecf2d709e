use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::models::StatsSnapshot;
use crate::store::StoreError;
use super::StatsAggregator;

struct CacheEntry {
    data: Arc<StatsSnapshot>,
    computed_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

/// Single-slot, time-boxed cache in front of the stats aggregator.
///
/// A stale or empty slot is recomputed synchronously by the caller that finds
/// it; concurrent callers wait on that refresh instead of issuing their own.
/// A failed refresh leaves the slot as it was.
pub struct StatsCache {
    aggregator: StatsAggregator,
    slot: RwLock<Option<CacheEntry>>,
    refresh: Mutex<()>,
    ttl: Duration,
}

impl StatsCache {
    pub fn new(aggregator: StatsAggregator, ttl_seconds: u64) -> Self {
        Self {
            aggregator,
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    pub fn state(&self) -> CacheState {
        match &*self.slot.read() {
            None => CacheState::Empty,
            Some(entry) if entry.computed_at.elapsed() < self.ttl => CacheState::Fresh,
            Some(_) => CacheState::Stale,
        }
    }

    pub async fn get(&self) -> Result<Arc<StatsSnapshot>, StoreError> {
        if let Some(data) = self.fresh() {
            return Ok(data);
        }

        tracing::debug!("Stats cache {:?}, refreshing", self.state());
        let _guard = self.refresh.lock().await;
        // Whoever held the lock before us may already have refreshed.
        if let Some(data) = self.fresh() {
            return Ok(data);
        }

        let data = Arc::new(self.aggregator.recompute().await?);
        *self.slot.write() = Some(CacheEntry {
            data: data.clone(),
            computed_at: Instant::now(),
        });
        Ok(data)
    }

    fn fresh(&self) -> Option<Arc<StatsSnapshot>> {
        let slot = self.slot.read();
        slot.as_ref()
            .filter(|entry| entry.computed_at.elapsed() < self.ttl)
            .map(|entry| entry.data.clone())
    }
}
