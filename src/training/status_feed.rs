use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;

/// Status line pushed after every reward computation.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub wins: u64,
    pub losses: u64,
    pub last_reward: f32,
    /// Best reward seen before this one.
    pub max_reward: f32,
}

impl fmt::Display for StatusUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wins: {} | Loses: {}\nLast reward: {}\nMax reward: {}",
            self.wins, self.losses, self.last_reward, self.max_reward
        )
    }
}

/// Producer half of the bounded status queue.
///
/// When the queue is full the newest update is dropped and counted; when the
/// consumer is gone updates are discarded silently.
#[derive(Clone)]
pub struct StatusSender {
    tx: SyncSender<StatusUpdate>,
    dropped: Arc<AtomicU64>,
}

impl StatusSender {
    pub fn send(&self, update: StatusUpdate) {
        match self.tx.try_send(update) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Updates discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Create a status queue holding at most `capacity` unread updates.
pub fn status_channel(capacity: usize) -> (StatusSender, Receiver<StatusUpdate>) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (
        StatusSender {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        rx,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(reward: f32) -> StatusUpdate {
        StatusUpdate {
            wins: 1,
            losses: 2,
            last_reward: reward,
            max_reward: 0.0,
        }
    }

    #[test]
    fn test_display_format() {
        let text = StatusUpdate {
            wins: 3,
            losses: 7,
            last_reward: 1030.0,
            max_reward: 40.0,
        }
        .to_string();
        assert_eq!(text, "Wins: 3 | Loses: 7\nLast reward: 1030\nMax reward: 40");
    }

    #[test]
    fn test_queue_is_bounded_drop_newest() {
        let (tx, rx) = status_channel(2);
        for i in 0..5 {
            tx.send(update(i as f32));
        }
        assert_eq!(tx.dropped(), 3);
        let received: Vec<f32> = rx.try_iter().map(|u| u.last_reward).collect();
        assert_eq!(received, vec![0.0, 1.0]);
    }

    #[test]
    fn test_disconnected_consumer_is_ignored() {
        let (tx, rx) = status_channel(1);
        drop(rx);
        tx.send(update(10.0));
        assert_eq!(tx.dropped(), 0);
    }
}
