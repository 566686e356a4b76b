use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Domain change notifications. Listeners treat every event as "refetch the
/// named collection"; no payload rides along, so a missed event at worst
/// delays a refresh until the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEvent {
    BookingsChanged,
    DepartmentsChanged,
    ProfilesChanged,
}

const CHANNEL_CAPACITY: usize = 256;

/// Fan-out hub for change events. Cheap to clone the sender side; views
/// subscribe for as long as they are mounted and drop the receiver on unmount.
pub struct NotifyHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl NotifyHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Publish to all current subscribers. A send with no listeners is fine;
    /// the event is simply dropped.
    pub fn send(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}
