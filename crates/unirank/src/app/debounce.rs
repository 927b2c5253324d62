//! Input coalescing for query controls.

use std::time::Duration;

use tokio::sync::mpsc;

/// Delay used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(180);

/// Forward values from `input` to `output`, collapsing bursts.
///
/// A value is forwarded once `delay` has passed without a newer one arriving;
/// every newer value restarts the wait and replaces the pending one. When
/// `input` closes, a pending value is forwarded immediately and the task ends.
/// The task also ends if `output` is closed.
pub async fn debounce<T>(mut input: mpsc::Receiver<T>, delay: Duration, output: mpsc::Sender<T>) {
    let mut pending: Option<T> = None;

    loop {
        tokio::select! {
            received = input.recv() => match received {
                Some(value) => pending = Some(value),
                None => break,
            },
            () = tokio::time::sleep(delay), if pending.is_some() => {
                if let Some(value) = pending.take() {
                    if output.send(value).await.is_err() {
                        return;
                    }
                }
            }
        }
    }

    if let Some(value) = pending {
        let _ = output.send(value).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn spawn_debounce(delay: Duration) -> (mpsc::Sender<u32>, mpsc::Receiver<u32>) {
        let (in_tx, in_rx) = mpsc::channel(8);
        let (out_tx, out_rx) = mpsc::channel(8);
        tokio::spawn(debounce(in_rx, delay, out_tx));
        (in_tx, out_rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_emits_only_last_value() {
        let (tx, mut rx) = spawn_debounce(DEFAULT_DEBOUNCE);
        let start = Instant::now();

        for value in 1..=3 {
            tx.send(value).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert_eq!(rx.recv().await, Some(3));
        // last keystroke at 100ms
        assert!(start.elapsed() >= Duration::from_millis(280));

        drop(tx);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separated_values_all_emitted() {
        let (tx, mut rx) = spawn_debounce(DEFAULT_DEBOUNCE);

        tx.send(1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        tx.send(2).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        drop(tx);

        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_flushes_pending_value() {
        let (tx, mut rx) = spawn_debounce(Duration::from_secs(10));
        let start = Instant::now();

        tx.send(7).await.unwrap();
        drop(tx);

        assert_eq!(rx.recv().await, Some(7));
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_sent_nothing_emitted() {
        let (tx, mut rx) = spawn_debounce(DEFAULT_DEBOUNCE);
        drop(tx);
        assert_eq!(rx.recv().await, None);
    }
}
