// ============================================================================
// EDITOR EVENTS: explicit observer lists with synchronous fan-out
// ============================================================================

use crate::canvas::LayerId;

/// Notifications consumed by the presentation layer.  Payloads are minimal:
/// consumers re-read whatever state they display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorEvent {
    /// A history mutation was committed, undone or redone.
    Update,
    /// The selected layer changed.
    LayersSelect,
    /// A layer's filter list changed (provisional writes included).
    UpdateFilters(LayerId),
    /// Layers were added, removed, reordered, shown/hidden or drawn on live.
    LayersRender,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&EditorEvent) + Send>;

/// Subscriber list owned by whichever component emits the events.
#[derive(Default)]
pub struct Observers {
    subscribers: Vec<(SubscriptionId, Callback)>,
    next_id: u64,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&EditorEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns `false` if the id was never registered or already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: EditorEvent) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Test helper: collects every event into a shared vector.
#[cfg(test)]
pub(crate) fn recorder(observers: &mut Observers) -> std::sync::Arc<std::sync::Mutex<Vec<EditorEvent>>> {
    let log = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&log);
    observers.subscribe(move |event| {
        if let Ok(mut events) = sink.lock() {
            events.push(*event);
        }
    });
    log
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_reaches_every_subscriber_in_order() {
        let mut observers = Observers::new();
        let first = recorder(&mut observers);
        let second = recorder(&mut observers);

        observers.emit(EditorEvent::Update);
        observers.emit(EditorEvent::LayersSelect);

        assert_eq!(*first.lock().unwrap(), vec![EditorEvent::Update, EditorEvent::LayersSelect]);
        assert_eq!(*second.lock().unwrap(), vec![EditorEvent::Update, EditorEvent::LayersSelect]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut observers = Observers::new();
        let log = std::sync::Arc::new(std::sync::Mutex::new(0u32));
        let sink = std::sync::Arc::clone(&log);
        let id = observers.subscribe(move |_| *sink.lock().unwrap() += 1);

        observers.emit(EditorEvent::Update);
        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        observers.emit(EditorEvent::Update);

        assert_eq!(*log.lock().unwrap(), 1);
        assert!(observers.is_empty());
    }
}
