// Request-id registry for callbacks crossing a native bridge
//
// Native bridges cannot carry Rust closures. Each asynchronous call parks its
// callback here under a fresh id, passes the id across, and the native side
// later completes it by id.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::NativeError;
use crate::native::{
    CurrentTimeCallback, DoneCallback, PlayCallback, PrepareCallback, SoundProps,
    SystemVolumeCallback,
};

/// Callback waiting for a native answer.
pub enum PendingCall {
    Prepare(PrepareCallback),
    Play(PlayCallback),
    Done(DoneCallback),
    CurrentTime(CurrentTimeCallback),
    SystemVolume(SystemVolumeCallback),
}

impl PendingCall {
    fn kind(&self) -> &'static str {
        match self {
            PendingCall::Prepare(_) => "prepare",
            PendingCall::Play(_) => "play",
            PendingCall::Done(_) => "done",
            PendingCall::CurrentTime(_) => "current_time",
            PendingCall::SystemVolume(_) => "system_volume",
        }
    }
}

/// Outstanding bridge calls, keyed by request id.
pub struct PendingCalls {
    calls: Mutex<HashMap<u64, PendingCall>>,
    next_id: AtomicU64,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Park `call` and return the id the native side must answer with.
    pub fn register(&self, call: PendingCall) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.calls.lock().insert(id, call);
        id
    }

    /// Take back a parked call, e.g. when the native request could not be sent.
    pub fn cancel(&self, id: u64) -> Option<PendingCall> {
        self.calls.lock().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn complete_prepare(
        &self,
        id: u64,
        error: Option<NativeError>,
        props: Option<SoundProps>,
    ) -> bool {
        match self.take(id) {
            Some(PendingCall::Prepare(callback)) => {
                callback(error, props);
                true
            }
            other => self.mismatch(id, "prepare", other),
        }
    }

    pub fn complete_play(&self, id: u64, success: bool) -> bool {
        match self.take(id) {
            Some(PendingCall::Play(callback)) => {
                callback(success);
                true
            }
            other => self.mismatch(id, "play", other),
        }
    }

    pub fn complete_done(&self, id: u64) -> bool {
        match self.take(id) {
            Some(PendingCall::Done(callback)) => {
                callback();
                true
            }
            other => self.mismatch(id, "done", other),
        }
    }

    pub fn complete_current_time(&self, id: u64, position: f64, is_playing: bool) -> bool {
        match self.take(id) {
            Some(PendingCall::CurrentTime(callback)) => {
                callback(position, is_playing);
                true
            }
            other => self.mismatch(id, "current_time", other),
        }
    }

    pub fn complete_system_volume(&self, id: u64, volume: f32) -> bool {
        match self.take(id) {
            Some(PendingCall::SystemVolume(callback)) => {
                callback(volume);
                true
            }
            other => self.mismatch(id, "system_volume", other),
        }
    }

    // The lock is released before the caller runs the callback
    fn take(&self, id: u64) -> Option<PendingCall> {
        self.calls.lock().remove(&id)
    }

    fn mismatch(&self, id: u64, expected: &str, found: Option<PendingCall>) -> bool {
        match found {
            Some(call) => {
                log::warn!(
                    "Request {} completed as {} but is waiting for {}",
                    id,
                    expected,
                    call.kind()
                );
                // Put it back so the right completion can still arrive
                self.calls.lock().insert(id, call);
            }
            None => log::warn!("Unknown or already completed request {} ({})", id, expected),
        }
        false
    }
}

impl Default for PendingCalls {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_completes_by_id() {
        let pending = PendingCalls::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let first = pending.register(PendingCall::Play(Box::new(move |ok: bool| {
            sink.lock().push(("first", ok))
        })));
        let sink = seen.clone();
        let second = pending.register(PendingCall::Play(Box::new(move |ok: bool| {
            sink.lock().push(("second", ok))
        })));
        assert_ne!(first, second);

        assert!(pending.complete_play(second, true));
        assert!(pending.complete_play(first, false));
        assert_eq!(*seen.lock(), vec![("second", true), ("first", false)]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_second_completion_is_ignored() {
        let pending = PendingCalls::new();
        let id = pending.register(PendingCall::Done(Box::new(|| {})));
        assert!(pending.complete_done(id));
        assert!(!pending.complete_done(id));
    }

    #[test]
    fn test_kind_mismatch_keeps_call() {
        let pending = PendingCalls::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let id = pending.register(PendingCall::CurrentTime(Box::new(move |pos: f64, playing: bool| {
            *sink.lock() = Some((pos, playing));
        })));

        assert!(!pending.complete_done(id));
        assert_eq!(pending.len(), 1);
        assert!(pending.complete_current_time(id, 4.0, false));
        assert_eq!(*seen.lock(), Some((4.0, false)));
    }

    #[test]
    fn test_prepare_forwards_error_and_props() {
        let pending = PendingCalls::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let id = pending.register(PendingCall::Prepare(Box::new(
            move |error: Option<NativeError>, props: Option<SoundProps>| {
                *sink.lock() = Some((error, props));
            },
        )));

        let error = NativeError::new("boom");
        assert!(pending.complete_prepare(id, Some(error.clone()), None));
        assert_eq!(*seen.lock(), Some((Some(error), None)));
    }

    #[test]
    fn test_cancel_returns_call() {
        let pending = PendingCalls::new();
        let id = pending.register(PendingCall::SystemVolume(Box::new(|_: f32| {})));
        assert!(pending.cancel(id).is_some());
        assert!(!pending.complete_system_volume(id, 0.5));
    }
}
