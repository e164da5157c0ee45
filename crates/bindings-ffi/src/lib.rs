// C ABI bridge for Podium sound
// The host (Swift/Objective-C on iOS, C++ on Windows) installs its engine
// entry points once, then answers asynchronous requests through the exports below.

mod host;

pub use host::{FfiSoundModule, PodiumSoundHost};

use host::c_string_opt;
use once_cell::sync::OnceCell;
use podium_sound_core::{
    CapabilityBackend, NativeError, PendingCalls, Platform, PlayChangeEmitter, PlayChangeEvent,
    Result, SoundError, SoundKey, SoundProps, SoundSystem,
};
use std::os::raw::c_char;
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();
static BRIDGE: OnceCell<FfiBridge> = OnceCell::new();

/// Initialize logging for the host platform
pub fn init_logging() {
    INIT_LOGGER.call_once(|| {
        #[cfg(target_os = "ios")]
        {
            let _ = oslog::OsLogger::new("com.opoojkk.podium.sound")
                .level_filter(log::LevelFilter::Debug)
                .init();
        }

        #[cfg(not(target_os = "ios"))]
        {
            let _ = env_logger::builder()
                .is_test(false)
                .filter_level(log::LevelFilter::Info)
                .try_init();
        }
    });
}

/// Installed bridge: the sound system plus the channels native answers use.
pub struct FfiBridge {
    system: Arc<SoundSystem>,
    pending: Arc<PendingCalls>,
    events: Arc<PlayChangeEmitter>,
}

impl FfiBridge {
    /// # Safety
    /// `host` must satisfy the [`PodiumSoundHost`] contract.
    pub unsafe fn new(host: PodiumSoundHost, platform: Platform) -> Result<Self> {
        let module = FfiSoundModule::new(host)?;
        let pending = module.pending().clone();
        let events = module.events().clone();
        let capabilities = module.restrict(platform.capabilities());
        if capabilities != platform.capabilities() {
            log::info!("Host lacks optional entries, capabilities narrowed to {:?}", capabilities);
        }
        let backend = Arc::new(CapabilityBackend::new(module, capabilities));

        Ok(Self {
            system: SoundSystem::new(backend),
            pending,
            events,
        })
    }

    pub fn system(&self) -> &Arc<SoundSystem> {
        &self.system
    }

    pub fn complete_prepare(
        &self,
        request_id: u64,
        error: Option<NativeError>,
        duration: Option<f64>,
    ) -> bool {
        let props = Some(SoundProps { duration });
        self.pending.complete_prepare(request_id, error, props)
    }

    pub fn complete_play(&self, request_id: u64, success: bool) -> bool {
        self.pending.complete_play(request_id, success)
    }

    pub fn complete_void(&self, request_id: u64) -> bool {
        self.pending.complete_done(request_id)
    }

    pub fn complete_current_time(&self, request_id: u64, position: f64, is_playing: bool) -> bool {
        self.pending.complete_current_time(request_id, position, is_playing)
    }

    pub fn complete_system_volume(&self, request_id: u64, volume: f32) -> bool {
        self.pending.complete_system_volume(request_id, volume)
    }

    pub fn emit_play_change(&self, key: i32, is_playing: bool) {
        self.events.emit(PlayChangeEvent {
            player_key: SoundKey::from_raw(key),
            is_playing,
        });
    }
}

/// Sound system of the installed bridge.
pub fn sound_system() -> Result<Arc<SoundSystem>> {
    BRIDGE
        .get()
        .map(|bridge| bridge.system().clone())
        .ok_or(SoundError::BridgeNotInstalled)
}

fn platform_from_code(code: i32) -> Option<Platform> {
    match code {
        0 => Some(Platform::Android),
        1 => Some(Platform::Ios),
        2 => Some(Platform::Windows),
        _ => None,
    }
}

fn with_bridge(f: impl FnOnce(&FfiBridge) -> bool) -> i32 {
    match BRIDGE.get() {
        Some(bridge) => {
            if f(bridge) {
                0
            } else {
                -1
            }
        }
        None => {
            log::error!("{}", SoundError::BridgeNotInstalled);
            -1
        }
    }
}

/// Install the host engine.
/// `platform`: 0=Android, 1=iOS, 2=Windows
/// Returns: 0 on success, -1 on error (null host, unknown platform, already installed)
///
/// # Safety
/// `host` must be null or point to a table satisfying the [`PodiumSoundHost`] contract.
#[no_mangle]
pub unsafe extern "C" fn podium_sound_install(host: *const PodiumSoundHost, platform: i32) -> i32 {
    init_logging();

    if host.is_null() {
        log::error!("Null host table provided");
        return -1;
    }
    let Some(platform) = platform_from_code(platform) else {
        log::error!("Unknown platform code: {}", platform);
        return -1;
    };

    let bridge = match FfiBridge::new(*host, platform) {
        Ok(bridge) => bridge,
        Err(e) => {
            log::error!("Failed to install sound host: {}", e);
            return -1;
        }
    };

    match BRIDGE.set(bridge) {
        Ok(()) => {
            log::info!("Sound host installed for {}", platform);
            0
        }
        Err(_) => {
            log::error!("Sound host already installed");
            -1
        }
    }
}

/// Answer a `prepare` request. A non-null `error_message` marks failure.
/// Returns: 0 if the request was pending, -1 otherwise
///
/// # Safety
/// `error_code` and `error_message` must be null or valid C strings.
#[no_mangle]
pub unsafe extern "C" fn podium_sound_complete_prepare(
    request_id: u64,
    error_code: *const c_char,
    error_message: *const c_char,
    duration: f64,
    has_duration: bool,
) -> i32 {
    let error = match (c_string_opt(error_code), c_string_opt(error_message)) {
        (Ok(code), Ok(Some(message))) => Some(NativeError { code, message }),
        (Ok(_), Ok(None)) => None,
        (Err(e), _) | (_, Err(e)) => Some(NativeError::new(e.to_string())),
    };
    let duration = has_duration.then_some(duration);

    with_bridge(|bridge| bridge.complete_prepare(request_id, error, duration))
}

/// Answer a `play` request.
#[no_mangle]
pub extern "C" fn podium_sound_complete_play(request_id: u64, success: bool) -> i32 {
    with_bridge(|bridge| bridge.complete_play(request_id, success))
}

/// Answer a `pause` or `stop` request.
#[no_mangle]
pub extern "C" fn podium_sound_complete_void(request_id: u64) -> i32 {
    with_bridge(|bridge| bridge.complete_void(request_id))
}

/// Answer a `get_current_time` request.
#[no_mangle]
pub extern "C" fn podium_sound_complete_current_time(
    request_id: u64,
    position: f64,
    is_playing: bool,
) -> i32 {
    with_bridge(|bridge| bridge.complete_current_time(request_id, position, is_playing))
}

/// Answer a `get_system_volume` request.
#[no_mangle]
pub extern "C" fn podium_sound_complete_system_volume(request_id: u64, volume: f32) -> i32 {
    with_bridge(|bridge| bridge.complete_system_volume(request_id, volume))
}

/// Report a play-state change for the player registered under `key`.
#[no_mangle]
pub extern "C" fn podium_sound_emit_play_change(key: i32, is_playing: bool) -> i32 {
    with_bridge(|bridge| {
        bridge.emit_play_change(key, is_playing);
        true
    })
}
