//! Keyed, invalidation-driven store of server-owned collections.
//!
//! Concurrent reads of one key share a single in-flight fetch. When fetches
//! overlap, only the most recently started one may commit (see
//! [`jobdash_core::CacheSlot`]). Consumers observe keys through
//! [`ResourceCache::subscribe`]; an invalidated key is refetched right away
//! while anyone is watching it and lazily on the next read otherwise.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::Utc;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use jobdash_core::{
    ApiError, CacheEntry, CacheKey, CacheSlot, CacheValue, CommitOutcome, EntryStatus,
    FetchTicket, ResourceType,
};
use jobdash_logging::{jobdash_debug, jobdash_trace, jobdash_warn};
use tokio::sync::watch;

use crate::Backend;

pub type Entry = CacheEntry<CacheValue>;

type SharedFetch = Shared<BoxFuture<'static, Result<CacheValue, ApiError>>>;

/// Loads the collection behind a key. The cache never calls this twice
/// concurrently for the same key unless the first call was superseded.
#[async_trait::async_trait]
pub trait ResourceSource: Send + Sync {
    async fn load(&self, key: &CacheKey) -> Result<CacheValue, ApiError>;
}

/// Adapts a [`Backend`] into a [`ResourceSource`].
pub struct BackendSource {
    backend: Arc<dyn Backend>,
    postings_limit: u32,
}

impl BackendSource {
    pub fn new(backend: Arc<dyn Backend>, postings_limit: u32) -> Self {
        Self {
            backend,
            postings_limit,
        }
    }
}

#[async_trait::async_trait]
impl ResourceSource for BackendSource {
    async fn load(&self, key: &CacheKey) -> Result<CacheValue, ApiError> {
        match key.resource {
            ResourceType::Profiles => self.backend.list_profiles().await.map(CacheValue::Profiles),
            ResourceType::SourceDocuments => {
                let profile_id = key.scope.as_deref().unwrap_or_default();
                self.backend
                    .list_source_documents(profile_id)
                    .await
                    .map(CacheValue::SourceDocuments)
            }
            ResourceType::JobPostings => self
                .backend
                .list_job_postings(self.postings_limit)
                .await
                .map(CacheValue::JobPostings),
        }
    }
}

struct KeyState {
    /// Distinguishes this state from one created for the same key after a
    /// `clear`; slot generations restart from zero in a fresh state.
    epoch: u64,
    slot: CacheSlot<CacheValue>,
    in_flight: Option<SharedFetch>,
    tx: watch::Sender<Entry>,
}

impl KeyState {
    fn new(key: CacheKey, epoch: u64) -> Self {
        let slot = CacheSlot::new(key);
        let (tx, _rx) = watch::channel(slot.entry().clone());
        Self {
            epoch,
            slot,
            in_flight: None,
            tx,
        }
    }

    fn observed(&self) -> bool {
        self.tx.receiver_count() > 0
    }

    fn publish(&self) {
        self.tx.send_replace(self.slot.entry().clone());
    }
}

struct CacheInner {
    source: Arc<dyn ResourceSource>,
    keys: Mutex<HashMap<CacheKey, KeyState>>,
    next_epoch: AtomicU64,
}

impl CacheInner {
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, KeyState>> {
        self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn state_mut<'a>(
        &self,
        keys: &'a mut HashMap<CacheKey, KeyState>,
        key: &CacheKey,
    ) -> &'a mut KeyState {
        keys.entry(key.clone()).or_insert_with(|| {
            KeyState::new(key.clone(), self.next_epoch.fetch_add(1, Ordering::Relaxed))
        })
    }

    fn commit(
        &self,
        key: &CacheKey,
        epoch: u64,
        ticket: FetchTicket,
        result: Result<CacheValue, ApiError>,
    ) -> Result<CacheValue, ApiError> {
        let mut keys = self.lock();
        let Some(state) = keys.get_mut(key).filter(|state| state.epoch == epoch) else {
            jobdash_debug!("cache {} cleared while loading; dropping result", key);
            return Err(ApiError::cancelled("cache cleared"));
        };

        if let Err(err) = &result {
            jobdash_warn!("cache {} fetch failed: {}", key, err);
        }
        match state.slot.commit(ticket, result.clone(), Utc::now()) {
            CommitOutcome::Committed => {
                state.in_flight = None;
                state.publish();
                jobdash_debug!("cache {} committed generation {}", key, ticket.generation());
                result
            }
            CommitOutcome::Superseded => {
                jobdash_debug!(
                    "cache {} discarded superseded generation {}",
                    key,
                    ticket.generation()
                );
                Err(ApiError::cancelled(format!(
                    "fetch for {key} superseded by a newer request"
                )))
            }
        }
    }
}

/// Cheap to clone; every clone shares the same store.
#[derive(Clone)]
pub struct ResourceCache {
    inner: Arc<CacheInner>,
}

impl ResourceCache {
    /// Must be used from within a Tokio runtime: fetches run on spawned tasks.
    pub fn new(source: Arc<dyn ResourceSource>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                keys: Mutex::new(HashMap::new()),
                next_epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Current entry for `key`. Triggers exactly one fetch if the key has never
    /// been loaded or was invalidated while nobody was watching.
    pub fn read(&self, key: &CacheKey) -> Entry {
        let mut keys = self.inner.lock();
        let state = self.inner.state_mut(&mut keys, key);
        if state.slot.needs_fetch() {
            self.spawn_fetch(key, state);
        }
        state.slot.entry().clone()
    }

    /// Current entry without side effects.
    pub fn peek(&self, key: &CacheKey) -> Entry {
        let keys = self.inner.lock();
        keys.get(key)
            .map(|state| state.slot.entry().clone())
            .unwrap_or_else(|| CacheEntry::idle(key.clone()))
    }

    /// Resolves with the key's value, joining an in-flight fetch or starting
    /// one when needed. A fresh ready value is returned without a round trip.
    pub async fn load(&self, key: &CacheKey) -> Result<CacheValue, ApiError> {
        let fetch = {
            let mut keys = self.inner.lock();
            let state = self.inner.state_mut(&mut keys, key);
            if let Some(fetch) = &state.in_flight {
                fetch.clone()
            } else if state.slot.needs_fetch() {
                self.start_fetch(key, state)
            } else {
                let entry = state.slot.entry();
                return match (entry.status, &entry.value, &entry.error) {
                    (EntryStatus::Failed, _, Some(err)) => Err(err.clone()),
                    (_, Some(value), _) => Ok(value.clone()),
                    _ => Err(ApiError::cancelled(format!("{key} has no value"))),
                };
            }
        };
        fetch.await
    }

    /// Declares interest in `key`. The key counts as observed for as long as
    /// the returned receiver (or a clone of it) is alive.
    pub fn subscribe(&self, key: &CacheKey) -> watch::Receiver<Entry> {
        let mut keys = self.inner.lock();
        let state = self.inner.state_mut(&mut keys, key);
        let rx = state.tx.subscribe();
        if state.slot.needs_fetch() {
            self.spawn_fetch(key, state);
        }
        rx
    }

    /// Marks `key` stale. Observed keys are refetched immediately, superseding
    /// any fetch already in flight; unobserved keys wait for the next read.
    pub fn invalidate(&self, key: &CacheKey) {
        let mut keys = self.inner.lock();
        let Some(state) = keys.get_mut(key) else {
            jobdash_trace!("cache {} invalidated before first use", key);
            return;
        };
        state.slot.invalidate();
        if state.observed() {
            jobdash_debug!("cache {} invalidated; refetching for observers", key);
            self.spawn_fetch(key, state);
        } else {
            jobdash_debug!("cache {} invalidated; refetch deferred", key);
            state.publish();
        }
    }

    /// Stores `value` without a round trip, superseding any fetch in flight.
    pub fn write(&self, key: &CacheKey, value: CacheValue) {
        let mut keys = self.inner.lock();
        let state = self.inner.state_mut(&mut keys, key);
        state.slot.write(value, Utc::now());
        state.in_flight = None;
        state.publish();
    }

    /// Edits a ready value in place. Falls back to [`invalidate`](Self::invalidate)
    /// when there is nothing fresh to edit. Returns whether the edit applied.
    pub fn patch(&self, key: &CacheKey, edit: impl FnOnce(&mut CacheValue)) -> bool {
        let patched = {
            let mut keys = self.inner.lock();
            match keys.get_mut(key) {
                Some(state) => {
                    let applied = state.slot.patch(Utc::now(), edit);
                    if applied {
                        state.in_flight = None;
                        state.publish();
                    }
                    applied
                }
                None => false,
            }
        };
        if !patched {
            self.invalidate(key);
        }
        patched
    }

    /// Drops every entry. Fetches still in flight resolve as `Cancelled`.
    pub fn clear(&self) {
        let mut keys = self.inner.lock();
        jobdash_debug!("cache cleared ({} keys)", keys.len());
        keys.clear();
    }

    /// Starts a fetch that nobody awaits here; the spawned driver commits it.
    fn spawn_fetch(&self, key: &CacheKey, state: &mut KeyState) {
        let _ = self.start_fetch(key, state);
    }

    fn start_fetch(&self, key: &CacheKey, state: &mut KeyState) -> SharedFetch {
        let ticket = state.slot.begin_fetch();
        let epoch = state.epoch;
        jobdash_debug!("cache {} fetch generation {}", key, ticket.generation());

        let source = Arc::clone(&self.inner.source);
        let inner: Weak<CacheInner> = Arc::downgrade(&self.inner);
        let owned_key = key.clone();
        let fetch = async move {
            let result = source.load(&owned_key).await;
            match inner.upgrade() {
                Some(inner) => inner.commit(&owned_key, epoch, ticket, result),
                None => Err(ApiError::cancelled("cache dropped")),
            }
        }
        .boxed()
        .shared();

        state.in_flight = Some(fetch.clone());
        state.publish();

        // Drive the fetch even if every caller stops waiting on it.
        let driver = fetch.clone();
        tokio::spawn(async move {
            let _ = driver.await;
        });
        fetch
    }
}
