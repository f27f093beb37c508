//! Per-key cache bookkeeping, free of any runtime.
//!
//! A [`CacheSlot`] tracks one key's entry plus a generation counter. Every
//! fetch takes a [`FetchTicket`] stamped with the generation it started at;
//! only the ticket of the most recently started fetch may commit.

use chrono::{DateTime, Utc};

use crate::{ApiError, JobPosting, Profile, ProfileId, SourceDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Profiles,
    SourceDocuments,
    JobPostings,
}

/// Identifies one cacheable collection: a resource type plus an optional profile scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resource: ResourceType,
    pub scope: Option<ProfileId>,
}

impl CacheKey {
    pub fn profiles() -> Self {
        Self {
            resource: ResourceType::Profiles,
            scope: None,
        }
    }

    /// Documents are partitioned by owner; there is no global document key.
    pub fn documents(profile_id: impl Into<ProfileId>) -> Self {
        Self {
            resource: ResourceType::SourceDocuments,
            scope: Some(profile_id.into()),
        }
    }

    pub fn postings() -> Self {
        Self {
            resource: ResourceType::JobPostings,
            scope: None,
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{:?}/{}", self.resource, scope),
            None => write!(f, "{:?}", self.resource),
        }
    }
}

/// Value stored under a [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    Profiles(Vec<Profile>),
    SourceDocuments(Vec<SourceDocument>),
    JobPostings(Vec<JobPosting>),
}

impl CacheValue {
    pub fn resource(&self) -> ResourceType {
        match self {
            CacheValue::Profiles(_) => ResourceType::Profiles,
            CacheValue::SourceDocuments(_) => ResourceType::SourceDocuments,
            CacheValue::JobPostings(_) => ResourceType::JobPostings,
        }
    }

    pub fn as_profiles(&self) -> Option<&[Profile]> {
        match self {
            CacheValue::Profiles(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_documents(&self) -> Option<&[SourceDocument]> {
        match self {
            CacheValue::SourceDocuments(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_postings(&self) -> Option<&[JobPosting]> {
        match self {
            CacheValue::JobPostings(items) => Some(items),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<T> {
    pub key: CacheKey,
    pub status: EntryStatus,
    /// Last good value; kept through later failures and reloads.
    pub value: Option<T>,
    pub error: Option<ApiError>,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Set by invalidation, cleared when the next fetch starts.
    pub stale: bool,
}

impl<T> CacheEntry<T> {
    pub fn idle(key: CacheKey) -> Self {
        Self {
            key,
            status: EntryStatus::Idle,
            value: None,
            error: None,
            fetched_at: None,
            stale: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// A newer fetch (or a local write) started after this ticket; result dropped.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct CacheSlot<T> {
    entry: CacheEntry<T>,
    generation: u64,
    in_flight: Option<u64>,
}

impl<T: Clone> CacheSlot<T> {
    pub fn new(key: CacheKey) -> Self {
        Self {
            entry: CacheEntry::idle(key),
            generation: 0,
            in_flight: None,
        }
    }

    pub fn entry(&self) -> &CacheEntry<T> {
        &self.entry
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether a plain read should start a fetch. Loading keys are joined, not
    /// refetched, and failed keys wait for an explicit invalidation.
    pub fn needs_fetch(&self) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.entry.status == EntryStatus::Idle || self.entry.stale
    }

    /// Starts a fetch, superseding any fetch already in flight.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.entry.status = EntryStatus::Loading;
        self.entry.stale = false;
        FetchTicket {
            generation: self.generation,
        }
    }

    pub fn commit(
        &mut self,
        ticket: FetchTicket,
        result: Result<T, ApiError>,
        now: DateTime<Utc>,
    ) -> CommitOutcome {
        if ticket.generation != self.generation {
            return CommitOutcome::Superseded;
        }
        self.in_flight = None;
        match result {
            Ok(value) => {
                self.entry.status = EntryStatus::Ready;
                self.entry.value = Some(value);
                self.entry.error = None;
                self.entry.fetched_at = Some(now);
            }
            Err(err) => {
                self.entry.status = EntryStatus::Failed;
                self.entry.error = Some(err);
            }
        }
        CommitOutcome::Committed
    }

    pub fn invalidate(&mut self) {
        self.entry.stale = true;
    }

    /// Local update without a round trip. Any fetch in flight is superseded.
    pub fn write(&mut self, value: T, now: DateTime<Utc>) {
        self.generation += 1;
        self.in_flight = None;
        self.entry.status = EntryStatus::Ready;
        self.entry.value = Some(value);
        self.entry.error = None;
        self.entry.fetched_at = Some(now);
        self.entry.stale = false;
    }

    /// Applies `patch` to a ready value in place. Returns false (and leaves the
    /// slot untouched) when there is no ready, fresh value to patch.
    pub fn patch(&mut self, now: DateTime<Utc>, patch: impl FnOnce(&mut T)) -> bool {
        if self.entry.status != EntryStatus::Ready || self.entry.stale {
            return false;
        }
        let Some(mut value) = self.entry.value.clone() else {
            return false;
        };
        patch(&mut value);
        self.write(value, now);
        true
    }
}
