// Platform strategy over the native module
//
// Sessions never test the platform themselves. They talk to one
// `NativeAudioBackend`, picked once at startup, which knows which native calls
// exist on its platform and how their arguments are shaped.

use std::sync::Arc;

use crate::directories::NativeDirectories;
use crate::events::{PlayChangeListener, Subscription};
use crate::key::SoundKey;
use crate::native::{
    CurrentTimeCallback, DoneCallback, NativeSoundModule, PlayCallback, PrepareCallback,
    PrepareOptions, SystemVolumeCallback,
};
use crate::platform::{Platform, PlatformCapabilities, VolumeChannels};

/// What happened to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Handed to the native engine
    Forwarded,
    /// Session is not loaded; nothing was sent and no callback will fire
    NotLoaded,
    /// Platform has no such call; nothing was sent and no callback will fire
    Unsupported,
    /// Release requested while preparation is in flight; carried out when it completes
    Deferred,
}

impl Dispatch {
    pub fn is_forwarded(self) -> bool {
        self == Dispatch::Forwarded
    }
}

/// Platform-aware view of the native engine.
pub trait NativeAudioBackend: Send + Sync {
    fn capabilities(&self) -> &PlatformCapabilities;

    fn prepare(
        &self,
        path: &str,
        key: SoundKey,
        options: &PrepareOptions,
        on_prepared: PrepareCallback,
    );

    fn play(&self, key: SoundKey, on_end: PlayCallback);

    fn pause(&self, key: SoundKey, on_done: DoneCallback);

    fn stop(&self, key: SoundKey, on_done: DoneCallback);

    fn reset(&self, key: SoundKey) -> Dispatch;

    fn release(&self, key: SoundKey);

    /// Sends `volume` in whatever shape the platform expects.
    fn set_volume(&self, key: SoundKey, volume: f32);

    fn get_current_time(&self, key: SoundKey, on_time: CurrentTimeCallback);

    fn set_current_time(&self, key: SoundKey, position: f64);

    fn set_speakerphone_on(&self, key: SoundKey, on: bool) -> Dispatch;

    fn get_system_volume(&self, on_volume: SystemVolumeCallback) -> Dispatch;

    fn set_system_volume(&self, volume: f32) -> Dispatch;

    fn enable(&self, enabled: bool);

    fn set_active(&self, active: bool) -> Dispatch;

    /// Attach a play-state listener, or `None` when the platform emits no
    /// play-state events.
    fn subscribe_play_changes(&self, listener: PlayChangeListener) -> Option<Subscription>;

    fn directories(&self) -> NativeDirectories;
}

/// Backend driven by a [`PlatformCapabilities`] table.
pub struct CapabilityBackend<M> {
    module: M,
    capabilities: PlatformCapabilities,
}

impl<M: NativeSoundModule> CapabilityBackend<M> {
    pub fn new(module: M, capabilities: PlatformCapabilities) -> Self {
        log::info!("Sound backend for {} selected", capabilities.platform);
        Self {
            module,
            capabilities,
        }
    }

    pub fn for_platform(module: M, platform: Platform) -> Self {
        Self::new(module, platform.capabilities())
    }

    pub fn module(&self) -> &M {
        &self.module
    }
}

impl<M: NativeSoundModule> NativeAudioBackend for CapabilityBackend<M> {
    fn capabilities(&self) -> &PlatformCapabilities {
        &self.capabilities
    }

    fn prepare(
        &self,
        path: &str,
        key: SoundKey,
        options: &PrepareOptions,
        on_prepared: PrepareCallback,
    ) {
        log::debug!("prepare {} as key {}", path, key);
        self.module.prepare(path, key, options, on_prepared);
    }

    fn play(&self, key: SoundKey, on_end: PlayCallback) {
        log::debug!("play key {}", key);
        self.module.play(key, on_end);
    }

    fn pause(&self, key: SoundKey, on_done: DoneCallback) {
        log::debug!("pause key {}", key);
        self.module.pause(key, on_done);
    }

    fn stop(&self, key: SoundKey, on_done: DoneCallback) {
        log::debug!("stop key {}", key);
        self.module.stop(key, on_done);
    }

    fn reset(&self, key: SoundKey) -> Dispatch {
        if !self.capabilities.stateful_reset {
            return Dispatch::Unsupported;
        }
        self.module.reset(key);
        Dispatch::Forwarded
    }

    fn release(&self, key: SoundKey) {
        log::debug!("release key {}", key);
        self.module.release(key);
    }

    fn set_volume(&self, key: SoundKey, volume: f32) {
        match self.capabilities.volume_channels {
            VolumeChannels::Stereo => self.module.set_volume(key, volume, Some(volume)),
            VolumeChannels::Mono => self.module.set_volume(key, volume, None),
        }
    }

    fn get_current_time(&self, key: SoundKey, on_time: CurrentTimeCallback) {
        self.module.get_current_time(key, on_time);
    }

    fn set_current_time(&self, key: SoundKey, position: f64) {
        self.module.set_current_time(key, position);
    }

    fn set_speakerphone_on(&self, key: SoundKey, on: bool) -> Dispatch {
        if !self.capabilities.system_volume {
            return Dispatch::Unsupported;
        }
        self.module.set_speakerphone_on(key, on);
        Dispatch::Forwarded
    }

    fn get_system_volume(&self, on_volume: SystemVolumeCallback) -> Dispatch {
        if !self.capabilities.system_volume {
            return Dispatch::Unsupported;
        }
        self.module.get_system_volume(on_volume);
        Dispatch::Forwarded
    }

    fn set_system_volume(&self, volume: f32) -> Dispatch {
        if !self.capabilities.system_volume {
            return Dispatch::Unsupported;
        }
        self.module.set_system_volume(volume);
        Dispatch::Forwarded
    }

    fn enable(&self, enabled: bool) {
        self.module.enable(enabled);
    }

    fn set_active(&self, active: bool) -> Dispatch {
        if !self.capabilities.session_activation {
            return Dispatch::Unsupported;
        }
        self.module.set_active(active);
        Dispatch::Forwarded
    }

    fn subscribe_play_changes(&self, listener: PlayChangeListener) -> Option<Subscription> {
        if !self.capabilities.play_change_events {
            return None;
        }
        Some(self.module.play_change_events().add_listener(listener))
    }

    fn directories(&self) -> NativeDirectories {
        self.module.directories()
    }
}

/// Backend for `platform` over `module`.
pub fn select_backend<M>(module: M, platform: Platform) -> Arc<dyn NativeAudioBackend>
where
    M: NativeSoundModule + 'static,
{
    Arc::new(CapabilityBackend::for_platform(module, platform))
}
