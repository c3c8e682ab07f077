use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use uuid::Uuid;

use crate::ModelEvent;

type Callback = Box<dyn Fn(&ModelEvent) + Send>;
type Slots = Arc<Mutex<HashMap<Uuid, Callback>>>;

/// Registered change listeners, keyed by a per-subscription id.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    slots: Slots,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        ListenerRegistry {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub(crate) fn subscribe(&self, callback: impl Fn(&ModelEvent) + Send + 'static) -> Subscription {
        let id = Uuid::new_v4();
        self.slots.lock().unwrap().insert(id, Box::new(callback));
        Subscription {
            id,
            slots: Arc::downgrade(&self.slots),
        }
    }

    pub(crate) fn notify(&self, event: &ModelEvent) {
        for callback in self.slots.lock().unwrap().values() {
            callback(event);
        }
    }

    pub(crate) fn clear(&self) {
        self.slots.lock().unwrap().clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.slots.lock().map(|slots| slots.len()).unwrap_or(0);
        f.debug_struct("ListenerRegistry")
            .field("listeners", &count)
            .finish()
    }
}

/// Handle for a registered listener.
///
/// Dropping the subscription unregisters the listener; presentation
/// components hold it for their lifetime and release it on teardown.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: Uuid,
    slots: Weak<Mutex<HashMap<Uuid, Callback>>>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.upgrade() {
            if let Ok(mut slots) = slots.lock() {
                slots.remove(&self.id);
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
