// Host function table and the native module built on top of it

use podium_sound_core::{
    CurrentTimeCallback, DoneCallback, NativeDirectories, NativeSoundModule, PendingCall,
    PendingCalls, PlatformCapabilities, PlayCallback, PlayChangeEmitter, PrepareCallback,
    PrepareOptions, SoundError, SoundKey, SystemVolumeCallback,
};
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::sync::Arc;

/// Entry points the host engine provides.
///
/// Calls that carry a `request_id` are asynchronous: the host answers them
/// later through the matching `podium_sound_complete_*` export. Optional
/// entries may be null on platforms without that feature.
///
/// The host guarantees that every function pointer and `context` stay valid,
/// and callable from any thread, for the life of the process.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PodiumSoundHost {
    pub context: *mut c_void,
    pub prepare: extern "C" fn(
        context: *mut c_void,
        path: *const c_char,
        key: i32,
        options_json: *const c_char,
        request_id: u64,
    ),
    pub play: extern "C" fn(context: *mut c_void, key: i32, request_id: u64),
    pub pause: extern "C" fn(context: *mut c_void, key: i32, request_id: u64),
    pub stop: extern "C" fn(context: *mut c_void, key: i32, request_id: u64),
    pub reset: Option<extern "C" fn(context: *mut c_void, key: i32)>,
    pub release: extern "C" fn(context: *mut c_void, key: i32),
    pub set_volume:
        extern "C" fn(context: *mut c_void, key: i32, left: f32, right: f32, stereo: bool),
    pub get_current_time: extern "C" fn(context: *mut c_void, key: i32, request_id: u64),
    pub set_current_time: extern "C" fn(context: *mut c_void, key: i32, position: f64),
    pub set_speakerphone_on: Option<extern "C" fn(context: *mut c_void, key: i32, on: bool)>,
    pub get_system_volume: Option<extern "C" fn(context: *mut c_void, request_id: u64)>,
    pub set_system_volume: Option<extern "C" fn(context: *mut c_void, volume: f32)>,
    pub enable: extern "C" fn(context: *mut c_void, enabled: bool),
    pub set_active: Option<extern "C" fn(context: *mut c_void, active: bool)>,
    /// Nullable, copied at install time
    pub main_bundle_path: *const c_char,
    pub document_dir: *const c_char,
    pub library_dir: *const c_char,
    pub caches_dir: *const c_char,
}

/// Copy a nullable C string.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn c_string_opt(ptr: *const c_char) -> podium_sound_core::Result<Option<String>> {
    if ptr.is_null() {
        return Ok(None);
    }
    let text = CStr::from_ptr(ptr).to_str()?;
    Ok(Some(text.to_string()))
}

fn to_c_string(text: &str) -> podium_sound_core::Result<CString> {
    CString::new(text).map_err(|e| SoundError::InvalidString(e.to_string()))
}

/// [`NativeSoundModule`] that forwards to a [`PodiumSoundHost`].
pub struct FfiSoundModule {
    host: PodiumSoundHost,
    pending: Arc<PendingCalls>,
    events: Arc<PlayChangeEmitter>,
    directories: NativeDirectories,
}

// The host contract on `PodiumSoundHost` makes the table shareable.
unsafe impl Send for FfiSoundModule {}
unsafe impl Sync for FfiSoundModule {}

impl FfiSoundModule {
    /// # Safety
    /// `host` must satisfy the [`PodiumSoundHost`] contract and its directory
    /// pointers must be null or valid C strings.
    pub unsafe fn new(host: PodiumSoundHost) -> podium_sound_core::Result<Self> {
        let directories = NativeDirectories {
            main_bundle: c_string_opt(host.main_bundle_path)?,
            document: c_string_opt(host.document_dir)?,
            library: c_string_opt(host.library_dir)?,
            caches: c_string_opt(host.caches_dir)?,
        };

        Ok(Self {
            host,
            pending: Arc::new(PendingCalls::new()),
            events: Arc::new(PlayChangeEmitter::new()),
            directories,
        })
    }

    pub fn pending(&self) -> &Arc<PendingCalls> {
        &self.pending
    }

    pub fn events(&self) -> &Arc<PlayChangeEmitter> {
        &self.events
    }

    /// Turn off the features whose optional entries the host left null, so
    /// the backend reports them as unsupported instead of forwarding.
    pub fn restrict(&self, mut capabilities: PlatformCapabilities) -> PlatformCapabilities {
        capabilities.stateful_reset &= self.host.reset.is_some();
        capabilities.system_volume &= self.host.get_system_volume.is_some()
            && self.host.set_system_volume.is_some()
            && self.host.set_speakerphone_on.is_some();
        capabilities.session_activation &= self.host.set_active.is_some();
        capabilities
    }

    fn missing(&self, name: &str) {
        log::warn!("Host does not provide {}, call dropped", name);
    }
}

impl NativeSoundModule for FfiSoundModule {
    fn prepare(
        &self,
        path: &str,
        key: SoundKey,
        options: &PrepareOptions,
        on_prepared: PrepareCallback,
    ) {
        let encoded = to_c_string(path).and_then(|path| {
            let options = to_c_string(&options.to_json()?)?;
            Ok((path, options))
        });

        match encoded {
            Ok((path, options)) => {
                let request_id = self.pending.register(PendingCall::Prepare(on_prepared));
                (self.host.prepare)(
                    self.host.context,
                    path.as_ptr(),
                    key.raw(),
                    options.as_ptr(),
                    request_id,
                );
            }
            Err(e) => {
                // Nothing reached the engine; answer the caller directly
                log::error!("Failed to encode prepare request for key {}: {}", key, e);
                on_prepared(Some(podium_sound_core::NativeError::new(e.to_string())), None);
            }
        }
    }

    fn play(&self, key: SoundKey, on_end: PlayCallback) {
        let request_id = self.pending.register(PendingCall::Play(on_end));
        (self.host.play)(self.host.context, key.raw(), request_id);
    }

    fn pause(&self, key: SoundKey, on_done: DoneCallback) {
        let request_id = self.pending.register(PendingCall::Done(on_done));
        (self.host.pause)(self.host.context, key.raw(), request_id);
    }

    fn stop(&self, key: SoundKey, on_done: DoneCallback) {
        let request_id = self.pending.register(PendingCall::Done(on_done));
        (self.host.stop)(self.host.context, key.raw(), request_id);
    }

    fn reset(&self, key: SoundKey) {
        match self.host.reset {
            Some(reset) => reset(self.host.context, key.raw()),
            None => self.missing("reset"),
        }
    }

    fn release(&self, key: SoundKey) {
        (self.host.release)(self.host.context, key.raw());
    }

    fn set_volume(&self, key: SoundKey, left: f32, right: Option<f32>) {
        (self.host.set_volume)(
            self.host.context,
            key.raw(),
            left,
            right.unwrap_or(left),
            right.is_some(),
        );
    }

    fn get_current_time(&self, key: SoundKey, on_time: CurrentTimeCallback) {
        let request_id = self.pending.register(PendingCall::CurrentTime(on_time));
        (self.host.get_current_time)(self.host.context, key.raw(), request_id);
    }

    fn set_current_time(&self, key: SoundKey, position: f64) {
        (self.host.set_current_time)(self.host.context, key.raw(), position);
    }

    fn set_speakerphone_on(&self, key: SoundKey, on: bool) {
        match self.host.set_speakerphone_on {
            Some(set_speakerphone_on) => set_speakerphone_on(self.host.context, key.raw(), on),
            None => self.missing("set_speakerphone_on"),
        }
    }

    fn get_system_volume(&self, on_volume: SystemVolumeCallback) {
        match self.host.get_system_volume {
            Some(get_system_volume) => {
                let request_id = self.pending.register(PendingCall::SystemVolume(on_volume));
                get_system_volume(self.host.context, request_id);
            }
            None => self.missing("get_system_volume"),
        }
    }

    fn set_system_volume(&self, volume: f32) {
        match self.host.set_system_volume {
            Some(set_system_volume) => set_system_volume(self.host.context, volume),
            None => self.missing("set_system_volume"),
        }
    }

    fn enable(&self, enabled: bool) {
        (self.host.enable)(self.host.context, enabled);
    }

    fn set_active(&self, active: bool) {
        match self.host.set_active {
            Some(set_active) => set_active(self.host.context, active),
            None => self.missing("set_active"),
        }
    }

    fn directories(&self) -> NativeDirectories {
        self.directories.clone()
    }

    fn play_change_events(&self) -> Arc<PlayChangeEmitter> {
        self.events.clone()
    }
}
