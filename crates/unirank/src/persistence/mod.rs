//! Ratings and notes, persisted locally and optionally shared.
//!
//! Two independent values live in local storage under fixed, versioned
//! keys. Reads are fail-soft: a missing, unreadable, or corrupt value reads
//! as empty. Notes can additionally be written to and read from a
//! [`RemoteLog`].

mod notes;
mod ratings;

pub use notes::{Note, NoteDraft, DEFAULT_AUTHOR};
pub use ratings::{clamp_stars, RatingAggregate, Ratings, MAX_STARS, MIN_STARS};

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::remote::{NoteSubscription, RemoteLog};
use crate::storage::LocalStore;

/// Storage key for the ratings map.
pub const RATINGS_KEY: &str = "unirank.ratings.v1";

/// Storage key for the notes sequence.
pub const NOTES_KEY: &str = "unirank.notes.v1";

/// Default number of remote notes a live feed shows.
pub const DEFAULT_SUBSCRIBE_LIMIT: usize = 200;

/// Where a submitted note ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteOutcome {
    /// Stored locally; no remote log is configured.
    Local,
    /// Appended to the remote log.
    Remote {
        /// Id assigned by the remote log.
        id: i64,
    },
    /// The remote append failed, so the note was stored locally instead.
    LocalFallback {
        /// Why the remote append failed.
        reason: String,
    },
}

/// Source of the notes shown in the feed.
#[derive(Debug)]
pub enum NotesFeed {
    /// Notes read from local storage once.
    Local(Vec<Note>),
    /// A live subscription; each snapshot replaces the feed.
    Live(NoteSubscription),
}

/// The persistence layer for ratings and notes.
#[derive(Debug)]
pub struct Persistence {
    store: Box<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteLog>>,
    subscribe_limit: usize,
}

impl Persistence {
    /// Local-only persistence over `store`.
    #[must_use]
    pub fn new(store: impl LocalStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            remote: None,
            subscribe_limit: DEFAULT_SUBSCRIBE_LIMIT,
        }
    }

    /// Mirror notes to `remote`.
    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteLog>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Set how many notes a live feed shows.
    #[must_use]
    pub fn with_subscribe_limit(mut self, limit: usize) -> Self {
        self.subscribe_limit = limit.max(1);
        self
    }

    /// Check if a remote log is configured.
    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Read a stored JSON value, treating any failure as the empty value.
    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                debug!(key, error = %e, "Local read failed, using empty value");
                return T::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            debug!(key, error = %e, "Stored value is corrupt, using empty value");
            T::default()
        })
    }

    fn write<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw)
    }

    /// All recorded ratings.
    #[must_use]
    pub fn ratings(&self) -> Ratings {
        self.read_or_default(RATINGS_KEY)
    }

    /// Record one vote for `university`; `stars` is clamped into 1-5.
    ///
    /// Returns the updated aggregate.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage cannot be written.
    pub fn record_rating(&self, university: &str, stars: i64) -> Result<RatingAggregate> {
        let stars = clamp_stars(stars);
        let mut ratings = self.ratings();
        ratings.record(university, stars);
        self.write(RATINGS_KEY, &ratings)?;

        let aggregate = ratings.get(university).copied().unwrap_or_default();
        debug!(university, stars, count = aggregate.count, "Recorded rating");
        Ok(aggregate)
    }

    /// Notes in local storage, newest first.
    #[must_use]
    pub fn notes_local(&self) -> Vec<Note> {
        self.read_or_default(NOTES_KEY)
    }

    fn prepend_local(&self, note: Note) -> Result<()> {
        let mut notes = self.notes_local();
        notes.insert(0, note);
        self.write(NOTES_KEY, &notes)
    }

    /// Submit a note.
    ///
    /// With a remote log the note is appended there first; if that fails it is
    /// kept locally and the failure is reported in the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error only if the note had to be stored locally and local
    /// storage cannot be written.
    pub async fn add_note(&self, note: Note) -> Result<NoteOutcome> {
        let Some(remote) = &self.remote else {
            self.prepend_local(note)?;
            return Ok(NoteOutcome::Local);
        };

        match remote.append(&note).await {
            Ok(id) => Ok(NoteOutcome::Remote { id }),
            Err(e) => {
                warn!(
                    collection = remote.collection(),
                    error = %e,
                    "Remote note write failed, keeping note locally"
                );
                self.prepend_local(note)?;
                Ok(NoteOutcome::LocalFallback {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// The notes feed: live from the remote log when configured, otherwise a
    /// one-off read of local storage.
    #[must_use]
    pub fn notes_feed(&self) -> NotesFeed {
        if let Some(remote) = &self.remote {
            match remote.subscribe(self.subscribe_limit) {
                Ok(subscription) => return NotesFeed::Live(subscription),
                Err(e) => warn!(error = %e, "Remote subscription failed, showing local notes"),
            }
        }
        NotesFeed::Local(self.notes_local())
    }

    /// Remove all local ratings and notes. The remote log is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage cannot be written.
    pub fn clear_all(&self) -> Result<()> {
        self.store.remove(RATINGS_KEY)?;
        self.store.remove(NOTES_KEY)?;
        info!("Cleared local ratings and notes");
        Ok(())
    }
}
