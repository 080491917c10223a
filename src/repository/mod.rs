//! In-memory catalog cache kept current by single-flight refreshes.
//!
//! [`CatalogRepository`] owns the last-known-good list of
//! [`CatalogEntry`] values. [`refresh`](CatalogRepository::refresh) starts a
//! manifest download in the background; when it finishes, the cached list
//! is swapped whole (on success) and a payload-less [`CatalogUpdated`] event
//! is broadcast. Observers re-read the repository after each event.
//!
//! One repository is meant to exist per process. [`AppContext`](crate::app::AppContext)
//! builds it; everything else shares it by cloning.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::app::CatalogError;
use crate::domain::{parse_manifest, CatalogEntry};
use crate::fetcher::{Downloader, FetchResult};

const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Broadcast after every finished refresh, successful or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogUpdated;

/// Consistent view of the repository at one instant.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub entries: Arc<Vec<CatalogEntry>>,
    pub refreshing: bool,
    pub last_error: Option<String>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct State {
    entries: Arc<Vec<CatalogEntry>>,
    refreshing: bool,
    last_error: Option<String>,
    last_refreshed_at: Option<DateTime<Utc>>,
}

struct Inner {
    downloader: Downloader,
    manifest_url: String,
    state: Mutex<State>,
    updates: broadcast::Sender<CatalogUpdated>,
}

#[derive(Clone)]
pub struct CatalogRepository {
    inner: Arc<Inner>,
}

impl CatalogRepository {
    pub fn new(downloader: Downloader, manifest_url: impl Into<String>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                downloader,
                manifest_url: manifest_url.into(),
                state: Mutex::new(State::default()),
                updates,
            }),
        }
    }

    /// Start a refresh unless one is already running.
    ///
    /// Returns `true` if a new refresh was started. Never blocks; the
    /// download runs on the tokio runtime, and a call made outside one is
    /// ignored without touching the refreshing flag.
    pub fn refresh(&self) -> bool {
        if tokio::runtime::Handle::try_current().is_err() {
            warn!("Refresh requested outside a tokio runtime, ignoring");
            return false;
        }

        {
            let mut state = self.inner.lock_state();
            if state.refreshing {
                debug!("Refresh already in flight, ignoring");
                return false;
            }
            state.refreshing = true;
        }

        debug!("Refreshing catalog from {}", self.inner.manifest_url);
        let inner = self.inner.clone();
        self.inner
            .downloader
            .spawn_fetch(&self.inner.manifest_url, move |result| {
                inner.finish_refresh(result)
            });

        true
    }

    pub fn entries(&self) -> Arc<Vec<CatalogEntry>> {
        self.inner.lock_state().entries.clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.lock_state().refreshing
    }

    /// Description of the most recent failed refresh, cleared on success.
    pub fn last_error(&self) -> Option<String> {
        self.inner.lock_state().last_error.clone()
    }

    pub fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock_state().last_refreshed_at
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        let state = self.inner.lock_state();
        CatalogSnapshot {
            entries: state.entries.clone(),
            refreshing: state.refreshing,
            last_error: state.last_error.clone(),
            last_refreshed_at: state.last_refreshed_at,
        }
    }

    pub fn manifest_url(&self) -> &str {
        &self.inner.manifest_url
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogUpdated> {
        self.inner.updates.subscribe()
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_refresh(&self, result: FetchResult) {
        let parsed = result
            .map_err(CatalogError::from)
            .and_then(|download| parse_manifest(&download.body));

        {
            let mut state = self.lock_state();
            match parsed {
                Ok(entries) => {
                    info!("Catalog refreshed: {} entries", entries.len());
                    state.entries = Arc::new(entries);
                    state.last_error = None;
                    state.last_refreshed_at = Some(Utc::now());
                }
                Err(e) => {
                    warn!("Catalog refresh failed: {}", e);
                    state.last_error = Some(e.to_string());
                }
            }
            state.refreshing = false;
        }

        // Only fails when nobody is subscribed.
        let _ = self.updates.send(CatalogUpdated);
    }
}
