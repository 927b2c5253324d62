//! Shared note log stored in a `SQLite` file.
//!
//! Every process that opens the same file sees the same collection, so the
//! file plays the part of a hosted realtime database. Subscriptions poll.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rusqlite::{params, Connection};
use tracing::{debug, info, warn};

use super::{NoteSubscription, RemoteLog};
use crate::error::{Error, Result};
use crate::persistence::Note;
use crate::storage;

/// A note log shared through a `SQLite` database file.
#[derive(Debug, Clone)]
pub struct SqliteRemoteLog {
    path: PathBuf,
    collection: String,
    poll_interval: Duration,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRemoteLog {
    /// Open or create the shared log at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(
        path: impl AsRef<Path>,
        collection: impl Into<String>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = storage::open_database(&path)?;
        let log = Self {
            path,
            collection: collection.into(),
            poll_interval,
            conn: Arc::new(Mutex::new(conn)),
        };
        info!(
            collection = %log.collection,
            "Remote note log ready at {}",
            log.path.display()
        );
        Ok(log)
    }

    /// Create a log that lives only as long as this value and its clones.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory(collection: impl Into<String>, poll_interval: Duration) -> Result<Self> {
        Ok(Self {
            path: PathBuf::from(":memory:"),
            collection: collection.into(),
            poll_interval,
            conn: Arc::new(Mutex::new(storage::open_in_memory_database()?)),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn insert(&self, note: &Note) -> Result<i64> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            r"
            INSERT INTO remote_notes (collection, author, university, text, rating, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                self.collection,
                note.author,
                note.university,
                note.text,
                note.rating,
                note.timestamp,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// The `limit` most recent notes of this collection, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn recent(&self, limit: usize) -> Result<Vec<Note>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare(
            r"
            SELECT author, university, text, rating, timestamp
            FROM remote_notes WHERE collection = ?1
            ORDER BY timestamp DESC, id DESC LIMIT ?2
            ",
        )?;

        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let notes = stmt
            .query_map(params![self.collection, limit_i64], |row| {
                Ok(Note {
                    author: row.get(0)?,
                    university: row.get(1)?,
                    text: row.get(2)?,
                    rating: row.get(3)?,
                    timestamp: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    /// Run a database call on the blocking thread pool.
    async fn blocking<T, F>(&self, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Self) -> Result<T> + Send + 'static,
    {
        let log = self.clone();
        tokio::task::spawn_blocking(move || call(&log))
            .await
            .map_err(|e| Error::remote(&self.collection, format!("database task failed: {e}")))?
    }
}

#[async_trait::async_trait]
impl RemoteLog for SqliteRemoteLog {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn append(&self, note: &Note) -> Result<i64> {
        let note = note.clone();
        let id = self
            .blocking(move |log| {
                log.insert(&note)
                    .map_err(|e| Error::remote(&log.collection, e.to_string()))
            })
            .await?;
        debug!(id, collection = %self.collection, "Appended note to remote log");
        Ok(id)
    }

    fn subscribe(&self, limit: usize) -> Result<NoteSubscription> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::remote(&self.collection, e.to_string()))?;

        let (tx, handle, subscription) = NoteSubscription::channel();
        let log = self.clone();

        runtime.spawn(async move {
            let mut last: Option<Vec<Note>> = None;
            while !handle.is_cancelled() {
                match log.blocking(move |log| log.recent(limit)).await {
                    Ok(snapshot) if last.as_ref() != Some(&snapshot) => {
                        if tx.send(snapshot.clone()).await.is_err() {
                            break;
                        }
                        last = Some(snapshot);
                    }
                    Ok(_) => {}
                    Err(e) => warn!(collection = %log.collection, error = %e, "Remote poll failed"),
                }

                tokio::select! {
                    () = tokio::time::sleep(log.poll_interval) => {}
                    () = tx.closed() => break,
                }
            }
            debug!(collection = %log.collection, "Remote subscription ended");
        });

        Ok(subscription)
    }
}
