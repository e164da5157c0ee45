// Sound session: one native player, addressed by its key
//
// Construction returns before the native side has loaded anything. The
// session only becomes usable inside the prepare completion, and stops being
// usable for good once released.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

use crate::backend::{Dispatch, NativeAudioBackend};
use crate::error::{NativeError, Result};
use crate::events::{PlayChangeEvent, PlayChangeListener, Subscription};
use crate::key::SoundKey;
use crate::native::{
    CurrentTimeCallback, DoneCallback, PlayCallback, PrepareCallback, PrepareOptions, SoundProps,
    SystemVolumeCallback,
};
use crate::source::{derive_key, resolve_path, ResolvedPath, SoundSource};
use crate::system::SoundSystem;

/// Duration reported before the engine tells us otherwise.
pub const UNKNOWN_DURATION: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    /// Native `prepare` has not answered yet
    Preparing { release_requested: bool },
    Loaded,
    /// Native `prepare` reported an error
    Failed,
    Released,
}

struct SessionState {
    lifecycle: Lifecycle,
    playing: bool,
    duration: f64,
    volume: f32,
    subscription: Option<Subscription>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Preparing {
                release_requested: false,
            },
            playing: false,
            duration: UNKNOWN_DURATION,
            volume: 1.0,
            subscription: None,
        }
    }

    fn is_loaded(&self) -> bool {
        self.lifecycle == Lifecycle::Loaded
    }
}

struct SoundInner {
    system: Arc<SoundSystem>,
    key: SoundKey,
    resolved: ResolvedPath,
    state: Mutex<SessionState>,
}

impl SoundInner {
    fn backend(&self) -> &dyn NativeAudioBackend {
        self.system.backend().as_ref()
    }

    fn is_loaded(&self) -> bool {
        self.state.lock().is_loaded()
    }

    fn complete_prepare(
        self: &Arc<Self>,
        error: Option<NativeError>,
        props: Option<SoundProps>,
        on_prepared: Option<PrepareCallback>,
    ) {
        let mut register = false;
        let mut release_now = false;
        {
            let mut state = self.state.lock();
            if let Some(duration) = props.as_ref().and_then(|props| props.duration) {
                state.duration = duration;
            }

            if let Lifecycle::Preparing { release_requested } = state.lifecycle {
                state.lifecycle = match (error.is_none(), release_requested) {
                    (true, false) => {
                        register = true;
                        Lifecycle::Loaded
                    }
                    (true, true) => {
                        release_now = true;
                        Lifecycle::Released
                    }
                    (false, true) => Lifecycle::Released,
                    (false, false) => Lifecycle::Failed,
                };
            }
        }

        if release_now {
            log::debug!("Key {} released while preparing, releasing now", self.key);
            self.backend().release(self.key);
        }
        if register {
            self.register_play_listener();
        }
        if let Some(on_prepared) = on_prepared {
            on_prepared(error, props);
        }
    }

    fn register_play_listener(self: &Arc<Self>) -> bool {
        let mut state = self.state.lock();
        if !state.is_loaded() {
            log::debug!("Key {} is not loaded, play change listener not attached", self.key);
            return false;
        }
        if state.subscription.is_some() {
            log::warn!("On play change listener is already registered for key {}", self.key);
            return false;
        }

        let key = self.key;
        let session: Weak<SoundInner> = Arc::downgrade(self);
        let listener: PlayChangeListener = Arc::new(move |event: &PlayChangeEvent| {
            if event.player_key != key {
                return;
            }
            if let Some(session) = session.upgrade() {
                session.state.lock().playing = event.is_playing;
            }
        });

        match self.backend().subscribe_play_changes(listener) {
            Some(subscription) => {
                state.subscription = Some(subscription);
                true
            }
            None => false,
        }
    }
}

/// One prepared (or preparing) native player.
///
/// Dropping a `Sound` does not free the native player; call
/// [`Sound::release`] for that.
pub struct Sound {
    inner: Arc<SoundInner>,
}

impl Sound {
    /// Resolve `source`, derive its key and ask the native engine to prepare
    /// it. Returns immediately; `on_prepared` receives `(error, props)` once
    /// the engine answers, whether it succeeded or not.
    ///
    /// Fails only when `source` is a bundled asset the resolver does not know.
    pub fn new(
        system: Arc<SoundSystem>,
        source: SoundSource,
        options: PrepareOptions,
        on_prepared: Option<PrepareCallback>,
    ) -> Result<Self> {
        let resolved = resolve_path(&source, system.resolver(), system.capabilities())?;
        let key = derive_key(&resolved);

        let inner = Arc::new(SoundInner {
            system,
            key,
            resolved,
            state: Mutex::new(SessionState::new()),
        });

        let session = inner.clone();
        inner.backend().prepare(
            inner.resolved.native_path(),
            key,
            &options,
            Box::new(move |error, props| session.complete_prepare(error, props, on_prepared)),
        );

        Ok(Self { inner })
    }

    pub fn key(&self) -> SoundKey {
        self.inner.key
    }

    /// Path or URI handed to the native engine.
    pub fn resolved_path(&self) -> &str {
        self.inner.resolved.native_path()
    }

    pub fn is_asset(&self) -> bool {
        self.inner.resolved.is_asset()
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.is_loaded()
    }

    /// Last play state reported by the native engine.
    pub fn is_playing(&self) -> bool {
        self.inner.state.lock().playing
    }

    /// Duration in seconds, or [`UNKNOWN_DURATION`].
    pub fn duration(&self) -> f64 {
        self.inner.state.lock().duration
    }

    pub fn volume(&self) -> f32 {
        self.inner.state.lock().volume
    }

    /// Start playback. `on_end` receives whether playback completed
    /// successfully; when the sound is not loaded it receives `false` right
    /// away and the engine is not touched.
    pub fn play(&self, on_end: Option<PlayCallback>) -> Dispatch {
        if !self.is_loaded() {
            if let Some(on_end) = on_end {
                on_end(false);
            }
            return Dispatch::NotLoaded;
        }

        self.inner.backend().play(
            self.inner.key,
            Box::new(move |success| {
                if let Some(on_end) = on_end {
                    on_end(success);
                }
            }),
        );
        Dispatch::Forwarded
    }

    pub fn pause(&self, on_done: Option<DoneCallback>) -> Dispatch {
        if !self.is_loaded() {
            return Dispatch::NotLoaded;
        }
        let session = self.inner.clone();
        self.inner
            .backend()
            .pause(self.inner.key, Self::halted(session, on_done));
        Dispatch::Forwarded
    }

    pub fn stop(&self, on_done: Option<DoneCallback>) -> Dispatch {
        if !self.is_loaded() {
            return Dispatch::NotLoaded;
        }
        let session = self.inner.clone();
        self.inner
            .backend()
            .stop(self.inner.key, Self::halted(session, on_done));
        Dispatch::Forwarded
    }

    // Completion shared by pause and stop
    fn halted(session: Arc<SoundInner>, on_done: Option<DoneCallback>) -> DoneCallback {
        Box::new(move || {
            session.state.lock().playing = false;
            if let Some(on_done) = on_done {
                on_done();
            }
        })
    }

    /// Reset the native player. Android only.
    pub fn reset(&self) -> Dispatch {
        if !self.is_loaded() {
            return Dispatch::NotLoaded;
        }
        let dispatch = self.inner.backend().reset(self.inner.key);
        if dispatch.is_forwarded() {
            self.inner.state.lock().playing = false;
        }
        dispatch
    }

    /// Free the native player and detach from play-state events.
    ///
    /// Only the first call on a loaded sound does anything. Called while
    /// preparation is still in flight, the release happens as soon as the
    /// engine answers and the sound never becomes loaded.
    pub fn release(&self) -> Dispatch {
        let subscription = {
            let mut state = self.inner.state.lock();
            match state.lifecycle {
                Lifecycle::Loaded => {
                    state.lifecycle = Lifecycle::Released;
                    state.subscription.take()
                }
                Lifecycle::Preparing { .. } => {
                    state.lifecycle = Lifecycle::Preparing {
                        release_requested: true,
                    };
                    return Dispatch::Deferred;
                }
                Lifecycle::Failed | Lifecycle::Released => return Dispatch::NotLoaded,
            }
        };

        self.inner.backend().release(self.inner.key);
        if let Some(subscription) = subscription {
            subscription.remove();
        }
        Dispatch::Forwarded
    }

    /// Store `volume` and, once loaded, send it to the engine.
    pub fn set_volume(&self, volume: f32) -> Dispatch {
        let loaded = {
            let mut state = self.inner.state.lock();
            state.volume = volume;
            state.is_loaded()
        };
        if !loaded {
            return Dispatch::NotLoaded;
        }
        self.inner.backend().set_volume(self.inner.key, volume);
        Dispatch::Forwarded
    }

    /// Query the playback position. `on_time` never fires when the sound is
    /// not loaded.
    pub fn get_current_time(&self, on_time: CurrentTimeCallback) -> Dispatch {
        if !self.is_loaded() {
            return Dispatch::NotLoaded;
        }
        self.inner.backend().get_current_time(self.inner.key, on_time);
        Dispatch::Forwarded
    }

    /// Seek to `position` seconds.
    pub fn set_current_time(&self, position: f64) -> Dispatch {
        if !self.is_loaded() {
            return Dispatch::NotLoaded;
        }
        self.inner.backend().set_current_time(self.inner.key, position);
        Dispatch::Forwarded
    }

    /// Query the device volume. Android only; `on_volume` never fires
    /// elsewhere.
    pub fn get_system_volume(&self, on_volume: SystemVolumeCallback) -> Dispatch {
        self.inner.backend().get_system_volume(on_volume)
    }

    /// Android only
    pub fn set_system_volume(&self, volume: f32) -> Dispatch {
        self.inner.backend().set_system_volume(volume)
    }

    /// Android only
    pub fn set_speakerphone_on(&self, on: bool) -> Dispatch {
        self.inner.backend().set_speakerphone_on(self.inner.key, on)
    }

    /// Attach this sound to play-state events. Done automatically after a
    /// successful prepare; a second registration only logs a warning.
    /// Sounds that are not loaded never attach.
    ///
    /// Returns whether a new listener was attached.
    pub fn register_play_listener(&self) -> bool {
        self.inner.register_play_listener()
    }
}

impl std::fmt::Debug for Sound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Sound")
            .field("key", &self.inner.key)
            .field("path", &self.inner.resolved.native_path())
            .field("lifecycle", &state.lifecycle)
            .field("playing", &state.playing)
            .field("duration", &state.duration)
            .field("volume", &state.volume)
            .finish()
    }
}
