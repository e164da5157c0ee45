// Play-state event channel
//
// The native layer publishes one stream of play-state changes for every
// player. Each session attaches its own listener and filters by key; there is
// no dispatch table, every live listener sees every event.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::key::SoundKey;

/// Play-state change reported by the native engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayChangeEvent {
    pub player_key: SoundKey,
    pub is_playing: bool,
}

/// Listener invoked for every published event.
/// Implementations should return quickly; they run on the publishing thread.
pub type PlayChangeListener = Arc<dyn Fn(&PlayChangeEvent) + Send + Sync>;

struct ListenerEntry {
    id: u64,
    listener: PlayChangeListener,
}

/// Process-wide publish/subscribe channel for [`PlayChangeEvent`]s.
pub struct PlayChangeEmitter {
    listeners: Mutex<Vec<ListenerEntry>>,
    next_id: AtomicU64,
}

impl PlayChangeEmitter {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Attach `listener`. The returned [`Subscription`] is the only way to
    /// detach it again.
    pub fn add_listener(self: &Arc<Self>, listener: PlayChangeListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push(ListenerEntry { id, listener });
        log::debug!("Play change listener {} added", id);

        Subscription {
            id,
            emitter: Arc::downgrade(self),
        }
    }

    /// Deliver `event` to every listener attached at the time of the call.
    pub fn emit(&self, event: PlayChangeEvent) {
        // Snapshot so listeners may subscribe or unsubscribe while handling
        let listeners: Vec<PlayChangeListener> = self
            .listeners
            .lock()
            .iter()
            .map(|entry| entry.listener.clone())
            .collect();

        log::trace!(
            "Play change for key {} (playing: {}) to {} listeners",
            event.player_key,
            event.is_playing,
            listeners.len()
        );

        for listener in listeners {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    fn remove_listener(&self, id: u64) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        before != listeners.len()
    }
}

impl Default for PlayChangeEmitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to one attached listener.
///
/// Dropping a subscription does not detach the listener; [`Subscription::remove`]
/// does, and consumes the handle so it can only happen once.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    emitter: Weak<PlayChangeEmitter>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Detach the listener. Returns false if the emitter is gone or the
    /// listener was no longer attached.
    pub fn remove(self) -> bool {
        match self.emitter.upgrade() {
            Some(emitter) => {
                let removed = emitter.remove_listener(self.id);
                log::debug!("Play change listener {} removed", self.id);
                removed
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<PlayChangeEvent>>>, PlayChangeListener) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: PlayChangeListener = Arc::new(move |event: &PlayChangeEvent| {
            sink.lock().push(*event);
        });
        (seen, listener)
    }

    fn event(key: i32, is_playing: bool) -> PlayChangeEvent {
        PlayChangeEvent {
            player_key: SoundKey::from_raw(key),
            is_playing,
        }
    }

    #[test]
    fn test_every_listener_sees_every_event() {
        let emitter = Arc::new(PlayChangeEmitter::new());
        let (first, first_listener) = recorder();
        let (second, second_listener) = recorder();
        let _a = emitter.add_listener(first_listener);
        let _b = emitter.add_listener(second_listener);

        emitter.emit(event(1, true));
        emitter.emit(event(2, false));

        assert_eq!(first.lock().len(), 2);
        assert_eq!(second.lock().len(), 2);
    }

    #[test]
    fn test_remove_detaches_only_that_listener() {
        let emitter = Arc::new(PlayChangeEmitter::new());
        let (first, first_listener) = recorder();
        let (second, second_listener) = recorder();
        let a = emitter.add_listener(first_listener);
        let _b = emitter.add_listener(second_listener);

        assert!(a.remove());
        assert_eq!(emitter.listener_count(), 1);

        emitter.emit(event(1, true));
        assert!(first.lock().is_empty());
        assert_eq!(second.lock().len(), 1);
    }

    #[test]
    fn test_remove_after_emitter_dropped() {
        let emitter = Arc::new(PlayChangeEmitter::new());
        let (_, listener) = recorder();
        let subscription = emitter.add_listener(listener);
        drop(emitter);
        assert!(!subscription.remove());
    }

    #[test]
    fn test_listener_may_unsubscribe_while_handling() {
        let emitter = Arc::new(PlayChangeEmitter::new());
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let inner = slot.clone();
        let subscription = emitter.add_listener(Arc::new(move |_: &PlayChangeEvent| {
            if let Some(subscription) = inner.lock().take() {
                subscription.remove();
            }
        }));
        *slot.lock() = Some(subscription);

        emitter.emit(event(3, true));
        assert_eq!(emitter.listener_count(), 0);
    }
}
