// JNI bindings for Android
// Bridges NativeSoundBridge (Kotlin/Java) and the Rust sound sessions

mod module;

pub use module::{JniSoundModule, BRIDGE_CLASS};

use jni::objects::{JClass, JString};
use jni::sys::{jboolean, jdouble, jfloat, jint, jlong, JNI_ERR, JNI_VERSION_1_6};
use jni::{JNIEnv, JavaVM};
use module::jni_error;
use once_cell::sync::OnceCell;
use podium_sound_core::{
    CapabilityBackend, NativeError, PendingCalls, Platform, PlayChangeEmitter, PlayChangeEvent,
    Result, SoundError, SoundKey, SoundProps, SoundSystem,
};
use std::ffi::c_void;
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();
static BRIDGE: OnceCell<JniBridge> = OnceCell::new();

/// Initialize logging based on platform
pub fn init_logging() {
    INIT_LOGGER.call_once(|| {
        #[cfg(target_os = "android")]
        {
            android_logger::init_once(
                android_logger::Config::default()
                    .with_max_level(log::LevelFilter::Debug)
                    .with_tag("PodiumSound"),
            );
        }

        #[cfg(all(not(target_os = "android"), feature = "desktop"))]
        {
            let _ = env_logger::builder()
                .is_test(false)
                .filter_level(log::LevelFilter::Info)
                .try_init();
        }
    });
}

/// Routes Java answers back to the parked Rust continuations.
pub struct Completions {
    pending: Arc<PendingCalls>,
    events: Arc<PlayChangeEmitter>,
}

impl Completions {
    pub fn new(pending: Arc<PendingCalls>, events: Arc<PlayChangeEmitter>) -> Self {
        Self { pending, events }
    }

    pub fn prepared(
        &self,
        request_id: u64,
        error: Option<NativeError>,
        duration: Option<f64>,
    ) -> bool {
        self.pending
            .complete_prepare(request_id, error, Some(SoundProps { duration }))
    }

    pub fn played(&self, request_id: u64, success: bool) -> bool {
        self.pending.complete_play(request_id, success)
    }

    pub fn done(&self, request_id: u64) -> bool {
        self.pending.complete_done(request_id)
    }

    pub fn current_time(&self, request_id: u64, position: f64, is_playing: bool) -> bool {
        self.pending.complete_current_time(request_id, position, is_playing)
    }

    pub fn system_volume(&self, request_id: u64, volume: f32) -> bool {
        self.pending.complete_system_volume(request_id, volume)
    }

    pub fn play_change(&self, key: i32, is_playing: bool) {
        self.events.emit(PlayChangeEvent {
            player_key: SoundKey::from_raw(key),
            is_playing,
        });
    }
}

struct JniBridge {
    system: Arc<SoundSystem>,
    completions: Completions,
}

impl JniBridge {
    fn new(module: JniSoundModule) -> Self {
        let completions = Completions::new(module.pending().clone(), module.events().clone());
        let backend = Arc::new(CapabilityBackend::for_platform(module, Platform::Android));
        Self {
            system: SoundSystem::new(backend),
            completions,
        }
    }
}

/// Sound system bound to the loading JVM.
pub fn sound_system() -> Result<Arc<SoundSystem>> {
    BRIDGE
        .get()
        .map(|bridge| bridge.system.clone())
        .ok_or(SoundError::BridgeNotInstalled)
}

fn install(vm: JavaVM) -> Result<()> {
    let bridge_class = {
        let mut env = vm.get_env().map_err(jni_error)?;
        let class = env.find_class(BRIDGE_CLASS).map_err(jni_error)?;
        env.new_global_ref(class).map_err(jni_error)?
    };

    BRIDGE
        .set(JniBridge::new(JniSoundModule::new(vm, bridge_class)))
        .map_err(|_| SoundError::Bridge("library loaded twice".to_string()))
}

/// A Java-side failure is marked by a non-null message; a bare code doubles
/// as the message.
fn prepared_error(code: Option<String>, message: Option<String>) -> Option<NativeError> {
    match (code, message) {
        (code, Some(message)) => Some(NativeError { code, message }),
        (Some(code), None) => Some(NativeError::with_code(code.clone(), code)),
        (None, None) => None,
    }
}

// Helper function to convert a nullable Java string to a Rust string
fn optional_string(env: &mut JNIEnv, value: &JString) -> Result<Option<String>> {
    if value.is_null() {
        return Ok(None);
    }
    let text: String = env.get_string(value).map_err(jni_error)?.into();
    Ok(Some(text))
}

fn with_completions(f: impl FnOnce(&Completions) -> bool) -> jint {
    match BRIDGE.get() {
        Some(bridge) => {
            if f(&bridge.completions) {
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

/// Called by the JVM on `System.loadLibrary`.
#[no_mangle]
pub extern "system" fn JNI_OnLoad(vm: JavaVM, _reserved: *mut c_void) -> jint {
    init_logging();

    match install(vm) {
        Ok(()) => {
            log::info!("Sound bridge installed for {}", Platform::Android);
            JNI_VERSION_1_6
        }
        Err(e) => {
            log::error!("Failed to install sound bridge: {}", e);
            JNI_ERR
        }
    }
}

/// Answer `NativeSoundBridge.prepare`
#[no_mangle]
pub extern "system" fn Java_com_opoojkk_podium_sound_NativeSoundBridge_nativeOnPrepared(
    mut env: JNIEnv,
    _class: JClass,
    request_id: jlong,
    error_code: JString,
    error_message: JString,
    duration: jdouble,
    has_duration: jboolean,
) -> jint {
    let error = match (
        optional_string(&mut env, &error_code),
        optional_string(&mut env, &error_message),
    ) {
        (Ok(code), Ok(message)) => prepared_error(code, message),
        (Err(e), _) | (_, Err(e)) => Some(NativeError::new(e.to_string())),
    };
    let duration = (has_duration != 0).then_some(duration);

    with_completions(|completions| completions.prepared(request_id as u64, error, duration))
}

/// Answer `NativeSoundBridge.play`
#[no_mangle]
pub extern "system" fn Java_com_opoojkk_podium_sound_NativeSoundBridge_nativeOnPlayed(
    _env: JNIEnv,
    _class: JClass,
    request_id: jlong,
    success: jboolean,
) -> jint {
    with_completions(|completions| completions.played(request_id as u64, success != 0))
}

/// Answer `NativeSoundBridge.pause` or `NativeSoundBridge.stop`
#[no_mangle]
pub extern "system" fn Java_com_opoojkk_podium_sound_NativeSoundBridge_nativeOnDone(
    _env: JNIEnv,
    _class: JClass,
    request_id: jlong,
) -> jint {
    with_completions(|completions| completions.done(request_id as u64))
}

/// Answer `NativeSoundBridge.getCurrentTime`
#[no_mangle]
pub extern "system" fn Java_com_opoojkk_podium_sound_NativeSoundBridge_nativeOnCurrentTime(
    _env: JNIEnv,
    _class: JClass,
    request_id: jlong,
    position: jdouble,
    is_playing: jboolean,
) -> jint {
    with_completions(|completions| {
        completions.current_time(request_id as u64, position, is_playing != 0)
    })
}

/// Answer `NativeSoundBridge.getSystemVolume`
#[no_mangle]
pub extern "system" fn Java_com_opoojkk_podium_sound_NativeSoundBridge_nativeOnSystemVolume(
    _env: JNIEnv,
    _class: JClass,
    request_id: jlong,
    volume: jfloat,
) -> jint {
    with_completions(|completions| completions.system_volume(request_id as u64, volume))
}

/// Play-state change of the player registered under `key`
#[no_mangle]
pub extern "system" fn Java_com_opoojkk_podium_sound_NativeSoundBridge_nativeOnPlayChange(
    _env: JNIEnv,
    _class: JClass,
    key: jint,
    is_playing: jboolean,
) -> jint {
    with_completions(|completions| {
        completions.play_change(key, is_playing != 0);
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use podium_sound_core::{PendingCall, PlayChangeListener};

    fn completions() -> (Completions, Arc<PendingCalls>, Arc<PlayChangeEmitter>) {
        let pending = Arc::new(PendingCalls::new());
        let events = Arc::new(PlayChangeEmitter::new());
        (Completions::new(pending.clone(), events.clone()), pending, events)
    }

    #[test]
    fn test_prepared_error_from_java_strings() {
        assert_eq!(prepared_error(None, None), None);
        assert_eq!(
            prepared_error(Some("-1004".to_string()), Some("resource not found".to_string())),
            Some(NativeError::with_code("-1004", "resource not found"))
        );
        assert_eq!(
            prepared_error(None, Some("io".to_string())),
            Some(NativeError::new("io"))
        );
        assert_eq!(
            prepared_error(Some("E_FAIL".to_string()), None),
            Some(NativeError::with_code("E_FAIL", "E_FAIL"))
        );
    }

    #[test]
    fn test_prepared_forwards_duration() {
        let (completions, pending, _) = completions();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let id = pending.register(PendingCall::Prepare(Box::new(
            move |error: Option<NativeError>, props: Option<SoundProps>| {
                *sink.lock() = Some((error, props));
            },
        )));

        assert!(completions.prepared(id, None, Some(12.5)));
        assert_eq!(*seen.lock(), Some((None, Some(SoundProps::with_duration(12.5)))));
        assert!(!completions.prepared(id, None, None));
    }

    #[test]
    fn test_request_ids_survive_jlong_round_trip() {
        let (completions, pending, _) = completions();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let id = pending.register(PendingCall::SystemVolume(Box::new(move |v: f32| {
            *sink.lock() = Some(v)
        })));

        let from_java = id as i64 as u64;
        assert!(completions.system_volume(from_java, 0.75));
        assert_eq!(*seen.lock(), Some(0.75));
    }

    #[test]
    fn test_play_change_reaches_listeners() {
        let (completions, _, events) = completions();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: PlayChangeListener = Arc::new(move |event: &PlayChangeEvent| {
            sink.lock().push((event.player_key.raw(), event.is_playing));
        });
        let subscription = events.add_listener(listener);

        completions.play_change(-323977428, true);
        completions.play_change(-323977428, false);
        assert_eq!(*seen.lock(), vec![(-323977428, true), (-323977428, false)]);
        assert!(subscription.remove());
    }

    #[test]
    fn test_exports_without_bridge_report_failure() {
        // JNI_OnLoad never ran in this process
        assert!(matches!(sound_system(), Err(SoundError::BridgeNotInstalled)));
        assert_eq!(with_completions(|_| true), -1);
    }
}
