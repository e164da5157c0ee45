// In-memory native module for tests
//
// Records every call and parks completions so a test decides when, and in
// which order, the "native side" answers.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::directories::NativeDirectories;
use crate::error::NativeError;
use crate::events::{PlayChangeEmitter, PlayChangeEvent};
use crate::key::SoundKey;
use crate::native::{
    CurrentTimeCallback, DoneCallback, NativeSoundModule, PlayCallback, PrepareCallback,
    PrepareOptions, SoundProps, SystemVolumeCallback,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Prepare {
        path: String,
        key: SoundKey,
        options: PrepareOptions,
    },
    Play(SoundKey),
    Pause(SoundKey),
    Stop(SoundKey),
    Reset(SoundKey),
    Release(SoundKey),
    SetVolume(SoundKey, f32, Option<f32>),
    GetCurrentTime(SoundKey),
    SetCurrentTime(SoundKey, f64),
    SetSpeakerphoneOn(SoundKey, bool),
    GetSystemVolume,
    SetSystemVolume(f32),
    Enable(bool),
    SetActive(bool),
}

#[derive(Default)]
struct Parked {
    prepare: VecDeque<PrepareCallback>,
    play: VecDeque<PlayCallback>,
    done: VecDeque<DoneCallback>,
    current_time: VecDeque<CurrentTimeCallback>,
    system_volume: VecDeque<SystemVolumeCallback>,
}

pub(crate) struct RecordingModule {
    calls: Mutex<Vec<Call>>,
    parked: Mutex<Parked>,
    events: Arc<PlayChangeEmitter>,
    directories: NativeDirectories,
}

impl RecordingModule {
    pub(crate) fn new() -> Self {
        Self::with_directories(NativeDirectories::default())
    }

    pub(crate) fn with_directories(directories: NativeDirectories) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            parked: Mutex::new(Parked::default()),
            events: Arc::new(PlayChangeEmitter::new()),
            directories,
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub(crate) fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| matches(call)).count()
    }

    /// Answer the oldest outstanding `prepare`.
    pub(crate) fn finish_prepare(&self, error: Option<NativeError>, props: Option<SoundProps>) {
        let callback = self.parked.lock().prepare.pop_front();
        callback.expect("no prepare in flight")(error, props);
    }

    pub(crate) fn finish_play(&self, success: bool) {
        let callback = self.parked.lock().play.pop_front();
        callback.expect("no play in flight")(success);
    }

    /// Answer the oldest outstanding `pause` or `stop`.
    pub(crate) fn finish_done(&self) {
        let callback = self.parked.lock().done.pop_front();
        callback.expect("no pause/stop in flight")();
    }

    pub(crate) fn finish_current_time(&self, position: f64, is_playing: bool) {
        let callback = self.parked.lock().current_time.pop_front();
        callback.expect("no getCurrentTime in flight")(position, is_playing);
    }

    pub(crate) fn finish_system_volume(&self, volume: f32) {
        let callback = self.parked.lock().system_volume.pop_front();
        callback.expect("no getSystemVolume in flight")(volume);
    }

    pub(crate) fn emit(&self, key: SoundKey, is_playing: bool) {
        self.events.emit(PlayChangeEvent {
            player_key: key,
            is_playing,
        });
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

impl NativeSoundModule for RecordingModule {
    fn prepare(
        &self,
        path: &str,
        key: SoundKey,
        options: &PrepareOptions,
        on_prepared: PrepareCallback,
    ) {
        self.record(Call::Prepare {
            path: path.to_string(),
            key,
            options: options.clone(),
        });
        self.parked.lock().prepare.push_back(on_prepared);
    }

    fn play(&self, key: SoundKey, on_end: PlayCallback) {
        self.record(Call::Play(key));
        self.parked.lock().play.push_back(on_end);
    }

    fn pause(&self, key: SoundKey, on_done: DoneCallback) {
        self.record(Call::Pause(key));
        self.parked.lock().done.push_back(on_done);
    }

    fn stop(&self, key: SoundKey, on_done: DoneCallback) {
        self.record(Call::Stop(key));
        self.parked.lock().done.push_back(on_done);
    }

    fn reset(&self, key: SoundKey) {
        self.record(Call::Reset(key));
    }

    fn release(&self, key: SoundKey) {
        self.record(Call::Release(key));
    }

    fn set_volume(&self, key: SoundKey, left: f32, right: Option<f32>) {
        self.record(Call::SetVolume(key, left, right));
    }

    fn get_current_time(&self, key: SoundKey, on_time: CurrentTimeCallback) {
        self.record(Call::GetCurrentTime(key));
        self.parked.lock().current_time.push_back(on_time);
    }

    fn set_current_time(&self, key: SoundKey, position: f64) {
        self.record(Call::SetCurrentTime(key, position));
    }

    fn set_speakerphone_on(&self, key: SoundKey, on: bool) {
        self.record(Call::SetSpeakerphoneOn(key, on));
    }

    fn get_system_volume(&self, on_volume: SystemVolumeCallback) {
        self.record(Call::GetSystemVolume);
        self.parked.lock().system_volume.push_back(on_volume);
    }

    fn set_system_volume(&self, volume: f32) {
        self.record(Call::SetSystemVolume(volume));
    }

    fn enable(&self, enabled: bool) {
        self.record(Call::Enable(enabled));
    }

    fn set_active(&self, active: bool) {
        self.record(Call::SetActive(active));
    }

    fn directories(&self) -> NativeDirectories {
        self.directories.clone()
    }

    fn play_change_events(&self) -> Arc<PlayChangeEmitter> {
        self.events.clone()
    }
}
