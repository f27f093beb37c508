use std::sync::Arc;

use jobdash_core::ProfileId;
use jobdash_logging::jobdash_info;
use tokio::sync::watch;

/// Single source of truth for the active profile.
///
/// Readers must call [`current_profile`](Self::current_profile) at dispatch
/// time. Anything long-running (a pipeline run) takes a snapshot instead of
/// holding on to the context.
#[derive(Clone)]
pub struct SelectionContext {
    tx: Arc<watch::Sender<Option<ProfileId>>>,
}

impl SelectionContext {
    pub fn new(initial: Option<ProfileId>) -> Self {
        let (tx, _rx) = watch::channel(normalize(initial));
        Self { tx: Arc::new(tx) }
    }

    pub fn current_profile(&self) -> Option<ProfileId> {
        self.tx.borrow().clone()
    }

    /// Sets the active profile. An empty id clears the selection.
    pub fn select(&self, profile_id: Option<ProfileId>) {
        let next = normalize(profile_id);
        let previous = self.tx.send_replace(next.clone());
        if previous != next {
            jobdash_info!(
                "active profile {} -> {}",
                previous.as_deref().unwrap_or("<none>"),
                next.as_deref().unwrap_or("<none>")
            );
        }
    }

    /// True when `profile_id` is still the active selection.
    pub fn is_current(&self, profile_id: &str) -> bool {
        self.tx.borrow().as_deref() == Some(profile_id)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ProfileId>> {
        self.tx.subscribe()
    }
}

impl Default for SelectionContext {
    fn default() -> Self {
        Self::new(None)
    }
}

fn normalize(profile_id: Option<ProfileId>) -> Option<ProfileId> {
    profile_id.filter(|id| !id.trim().is_empty())
}
