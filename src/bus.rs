use std::sync::Arc;

use tokio::sync::broadcast::{self, Receiver, error::TryRecvError};
use tracing::{trace, warn};

/// Named broadcast topic with bounded capacity.
/// `T` must be `Send + Sync` because messages hop between the runtime and the plant thread.
#[derive(Debug, Clone)]
pub struct Topic<T> {
    name: &'static str,
    tx: broadcast::Sender<Arc<T>>,
}

impl<T: Send + Sync + 'static> Topic<T> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { name, tx }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Publishing with nobody listening is not an error; the message is dropped.
    pub fn publish(&self, msg: T) {
        match self.tx.send(Arc::new(msg)) {
            Ok(receivers) => trace!(topic = self.name, receivers, "published"),
            Err(_) => trace!(topic = self.name, "published with no subscribers"),
        }
    }

    pub fn subscribe(&self) -> Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}

/// Drains everything queued on `rx` and returns the newest message, if any.
///
/// Lagging is expected for a consumer slower than its producer and only costs
/// the overwritten messages. A closed channel yields whatever was drained.
pub fn drain_latest<T: Clone>(topic: &str, rx: &mut Receiver<T>) -> Option<T> {
    let mut latest = None;
    loop {
        match rx.try_recv() {
            Ok(msg) => latest = Some(msg),
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(topic, skipped, "subscriber lagged, dropping stale messages");
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return latest,
        }
    }
}
