//! Optional shared note log.
//!
//! A remote log is an append-only collection of notes that several clients
//! can write to and subscribe to. It is injected into the persistence layer
//! as an `Arc<dyn RemoteLog>` chosen by configuration; without one, notes
//! stay local.

mod sqlite;

pub use sqlite::SqliteRemoteLog;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::Result;
use crate::persistence::Note;

/// Number of snapshots buffered between a producer and its subscriber.
pub const SNAPSHOT_BUFFER: usize = 4;

/// An append-and-subscribe note store.
#[async_trait::async_trait]
pub trait RemoteLog: Send + Sync + std::fmt::Debug {
    /// Name of the collection notes are written to.
    fn collection(&self) -> &str;

    /// Append a note and return the id the log assigned to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the log is unreachable or rejects the write.
    async fn append(&self, note: &Note) -> Result<i64>;

    /// Subscribe to the `limit` most recent notes, newest first.
    ///
    /// The first snapshot is delivered right away; later snapshots arrive
    /// whenever the collection changes and each one replaces the previous.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be started.
    fn subscribe(&self, limit: usize) -> Result<NoteSubscription>;
}

/// Cancellation flag shared between a subscription and its producer.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionHandle {
    cancelled: Arc<AtomicBool>,
}

impl SubscriptionHandle {
    /// Create a new, live handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the producer to stop.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if the subscription has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A live stream of note snapshots.
///
/// Dropping the subscription cancels it.
#[derive(Debug)]
pub struct NoteSubscription {
    rx: mpsc::Receiver<Vec<Note>>,
    handle: SubscriptionHandle,
}

impl NoteSubscription {
    /// Create a connected sender and subscription pair.
    ///
    /// The producer side should stop once [`SubscriptionHandle::is_cancelled`]
    /// returns true or the sender reports the channel closed.
    #[must_use]
    pub fn channel() -> (mpsc::Sender<Vec<Note>>, SubscriptionHandle, Self) {
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let handle = SubscriptionHandle::new();
        let subscription = Self {
            rx,
            handle: handle.clone(),
        };
        (tx, handle, subscription)
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `None` once the subscription is cancelled or the producer ends.
    pub async fn next(&mut self) -> Option<Vec<Note>> {
        if self.handle.is_cancelled() {
            return None;
        }
        self.rx.recv().await
    }

    /// Stop receiving updates.
    pub fn cancel(&mut self) {
        self.handle.cancel();
        self.rx.close();
    }

    /// Check if the subscription has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }
}

impl Drop for NoteSubscription {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(text: &str, timestamp: i64) -> Note {
        Note {
            author: "anon".to_string(),
            university: "A U".to_string(),
            text: text.to_string(),
            rating: None,
            timestamp,
        }
    }

    #[test]
    fn test_handle_cancel_is_shared() {
        let handle = SubscriptionHandle::new();
        let other = handle.clone();
        assert!(!other.is_cancelled());
        handle.cancel();
        assert!(other.is_cancelled());
    }

    #[tokio::test]
    async fn test_subscription_receives_snapshots() {
        let (tx, _handle, mut subscription) = NoteSubscription::channel();
        tx.send(vec![note("first", 1)]).await.unwrap();
        tx.send(vec![note("second", 2), note("first", 1)]).await.unwrap();

        assert_eq!(subscription.next().await.unwrap().len(), 1);
        assert_eq!(subscription.next().await.unwrap().len(), 2);

        drop(tx);
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_stops_delivery() {
        let (tx, handle, mut subscription) = NoteSubscription::channel();
        subscription.cancel();

        assert!(handle.is_cancelled());
        assert!(subscription.is_cancelled());
        assert!(subscription.next().await.is_none());
        assert!(tx.send(vec![note("late", 3)]).await.is_err());
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let (tx, handle, subscription) = NoteSubscription::channel();
        drop(subscription);
        assert!(handle.is_cancelled());
        assert!(tx.is_closed());
    }
}
