//! Single-slot, latest-value-wins channel between a section and the
//! orchestrator.
//!
//! A burst of edits is coalesced without any timer: every publish overwrites
//! the slot, and the reader only ever observes the most recent value it has
//! not yet seen.

use tokio::sync::watch;

/// Creates a connected publisher/inbox pair with an empty slot.
pub fn mailbox<T: Clone>() -> (Publisher<T>, Inbox<T>) {
    let (tx, rx) = watch::channel(None);
    (Publisher { tx }, Inbox { rx })
}

/// Writing half, held by a section draft store.
#[derive(Debug)]
pub struct Publisher<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T> Publisher<T> {
    /// Replaces the slot contents; earlier unread values are discarded.
    pub fn publish(&self, value: T) {
        self.tx.send_replace(Some(value));
    }
}

/// Reading half, held by the orchestrator.
#[derive(Debug)]
pub struct Inbox<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T: Clone> Inbox<T> {
    /// Takes the latest unseen value without waiting.
    pub fn take(&mut self) -> Option<T> {
        match self.rx.has_changed() {
            Ok(true) => self.rx.borrow_and_update().clone(),
            _ => None,
        }
    }

    /// Waits for the next unseen value. Returns `None` once the publisher is
    /// gone and nothing new was sent.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        self.rx.borrow_and_update().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_the_latest_value_is_observed() {
        let (publisher, mut inbox) = mailbox();
        publisher.publish(1);
        publisher.publish(2);
        publisher.publish(3);

        assert_eq!(inbox.take(), Some(3));
        assert_eq!(inbox.take(), None);
    }

    #[test]
    fn test_empty_slot_yields_nothing() {
        let (_publisher, mut inbox) = mailbox::<String>();
        assert_eq!(inbox.take(), None);
    }

    #[tokio::test]
    async fn test_recv_waits_for_a_publish() {
        let (publisher, mut inbox) = mailbox();
        let reader = tokio::spawn(async move { inbox.recv().await });

        publisher.publish("settled".to_string());
        assert_eq!(reader.await.unwrap().as_deref(), Some("settled"));
    }

    #[tokio::test]
    async fn test_recv_ends_when_publisher_drops() {
        let (publisher, mut inbox) = mailbox::<u8>();
        drop(publisher);
        assert_eq!(inbox.recv().await, None);
    }
}
