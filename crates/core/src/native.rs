// Native engine capability contract
//
// Everything behind this trait (decoding, output, routing) belongs to the
// platform engine. Calls return immediately; results come back through the
// boxed callbacks, possibly on another thread.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::directories::NativeDirectories;
use crate::error::{NativeError, Result};
use crate::events::PlayChangeEmitter;
use crate::key::SoundKey;

/// Completion of `prepare`: `(error, props)`, error is `None` on success.
pub type PrepareCallback = Box<dyn FnOnce(Option<NativeError>, Option<SoundProps>) + Send>;

/// Completion of `play`: whether playback finished successfully.
pub type PlayCallback = Box<dyn FnOnce(bool) + Send>;

/// Completion of `pause` and `stop`.
pub type DoneCallback = Box<dyn FnOnce() + Send>;

/// Result of `getCurrentTime`: `(position_seconds, is_playing)`.
pub type CurrentTimeCallback = Box<dyn FnOnce(f64, bool) + Send>;

/// Result of `getSystemVolume`.
pub type SystemVolumeCallback = Box<dyn FnOnce(f32) + Send>;

/// Properties reported when a player finishes preparing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundProps {
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
}

impl SoundProps {
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
        }
    }
}

/// Single engine-specific tuning value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Number(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

/// Options passed through to native `prepare` without interpretation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrepareOptions(BTreeMap<String, OptionValue>);

impl PrepareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON object form used by the native bridges.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Raw native engine surface.
///
/// This is the superset of what any platform offers. Which calls are actually
/// made on a given platform is decided by the
/// [`NativeAudioBackend`](crate::backend::NativeAudioBackend), never here.
pub trait NativeSoundModule: Send + Sync {
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

    /// Android only
    fn reset(&self, key: SoundKey);

    fn release(&self, key: SoundKey);

    /// `right` is `Some` on engines taking a stereo pair
    fn set_volume(&self, key: SoundKey, left: f32, right: Option<f32>);

    fn get_current_time(&self, key: SoundKey, on_time: CurrentTimeCallback);

    fn set_current_time(&self, key: SoundKey, position: f64);

    /// Android only
    fn set_speakerphone_on(&self, key: SoundKey, on: bool);

    /// Android only
    fn get_system_volume(&self, on_volume: SystemVolumeCallback);

    /// Android only
    fn set_system_volume(&self, volume: f32);

    fn enable(&self, enabled: bool);

    /// iOS only
    fn set_active(&self, active: bool);

    /// Well-known directories, read once at startup.
    fn directories(&self) -> NativeDirectories;

    /// Channel the engine publishes play-state changes on.
    fn play_change_events(&self) -> Arc<PlayChangeEmitter>;
}

impl<M: NativeSoundModule + ?Sized> NativeSoundModule for Arc<M> {
    fn prepare(
        &self,
        path: &str,
        key: SoundKey,
        options: &PrepareOptions,
        on_prepared: PrepareCallback,
    ) {
        (**self).prepare(path, key, options, on_prepared)
    }

    fn play(&self, key: SoundKey, on_end: PlayCallback) {
        (**self).play(key, on_end)
    }

    fn pause(&self, key: SoundKey, on_done: DoneCallback) {
        (**self).pause(key, on_done)
    }

    fn stop(&self, key: SoundKey, on_done: DoneCallback) {
        (**self).stop(key, on_done)
    }

    fn reset(&self, key: SoundKey) {
        (**self).reset(key)
    }

    fn release(&self, key: SoundKey) {
        (**self).release(key)
    }

    fn set_volume(&self, key: SoundKey, left: f32, right: Option<f32>) {
        (**self).set_volume(key, left, right)
    }

    fn get_current_time(&self, key: SoundKey, on_time: CurrentTimeCallback) {
        (**self).get_current_time(key, on_time)
    }

    fn set_current_time(&self, key: SoundKey, position: f64) {
        (**self).set_current_time(key, position)
    }

    fn set_speakerphone_on(&self, key: SoundKey, on: bool) {
        (**self).set_speakerphone_on(key, on)
    }

    fn get_system_volume(&self, on_volume: SystemVolumeCallback) {
        (**self).get_system_volume(on_volume)
    }

    fn set_system_volume(&self, volume: f32) {
        (**self).set_system_volume(volume)
    }

    fn enable(&self, enabled: bool) {
        (**self).enable(enabled)
    }

    fn set_active(&self, active: bool) {
        (**self).set_active(active)
    }

    fn directories(&self) -> NativeDirectories {
        (**self).directories()
    }

    fn play_change_events(&self) -> Arc<PlayChangeEmitter> {
        (**self).play_change_events()
    }
}
