// Native module backed by static methods on the Java bridge class

use jni::objects::{GlobalRef, JClass, JObject, JValueOwned};
use jni::JavaVM;
use podium_sound_core::{
    CurrentTimeCallback, DoneCallback, NativeDirectories, NativeError, NativeSoundModule,
    PendingCall, PendingCalls, PlayCallback, PlayChangeEmitter, PrepareCallback, PrepareOptions,
    Result, SoundError, SoundKey, SystemVolumeCallback,
};
use std::sync::Arc;

/// Fully qualified name of the Java class the engine lives behind.
pub const BRIDGE_CLASS: &str = "com/opoojkk/podium/sound/NativeSoundBridge";

pub(crate) fn jni_error(err: jni::errors::Error) -> SoundError {
    SoundError::Bridge(err.to_string())
}

/// Argument for a static bridge call
#[derive(Debug, Clone, Copy)]
enum JavaArg<'a> {
    Str(&'a str),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
}

/// Answer a parked call whose request never reached Java.
///
/// Prepare and play continuations always fire, so they receive a failure;
/// the others are dropped.
pub(crate) fn fail_request(pending: &PendingCalls, request_id: u64, error: &SoundError) {
    match pending.cancel(request_id) {
        Some(PendingCall::Prepare(on_prepared)) => {
            on_prepared(Some(NativeError::new(error.to_string())), None)
        }
        Some(PendingCall::Play(on_end)) => on_end(false),
        Some(_) | None => {}
    }
}

/// [`NativeSoundModule`] that calls `NativeSoundBridge` through JNI.
///
/// Java answers asynchronous calls through the `native*` exports of this
/// library, passing back the request id it was given.
pub struct JniSoundModule {
    vm: JavaVM,
    bridge_class: GlobalRef,
    pending: Arc<PendingCalls>,
    events: Arc<PlayChangeEmitter>,
}

impl JniSoundModule {
    pub fn new(vm: JavaVM, bridge_class: GlobalRef) -> Self {
        Self {
            vm,
            bridge_class,
            pending: Arc::new(PendingCalls::new()),
            events: Arc::new(PlayChangeEmitter::new()),
        }
    }

    pub fn pending(&self) -> &Arc<PendingCalls> {
        &self.pending
    }

    pub fn events(&self) -> &Arc<PlayChangeEmitter> {
        &self.events
    }

    fn call_static(&self, method: &str, sig: &str, args: &[JavaArg<'_>]) -> Result<()> {
        let mut env = self.vm.attach_current_thread().map_err(jni_error)?;

        let mut values: Vec<JValueOwned> = Vec::with_capacity(args.len());
        for arg in args {
            values.push(match *arg {
                JavaArg::Str(text) => {
                    JValueOwned::Object(JObject::from(env.new_string(text).map_err(jni_error)?))
                }
                JavaArg::Int(value) => JValueOwned::Int(value),
                JavaArg::Long(value) => JValueOwned::Long(value),
                JavaArg::Float(value) => JValueOwned::Float(value),
                JavaArg::Double(value) => JValueOwned::Double(value),
                JavaArg::Bool(value) => JValueOwned::Bool(value as u8),
            });
        }
        let borrowed: Vec<_> = values.iter().map(|value| value.borrow()).collect();

        let class = <&JClass>::from(self.bridge_class.as_obj());
        if let Err(e) = env.call_static_method(class, method, sig, &borrowed) {
            if env.exception_check().unwrap_or(false) {
                let _ = env.exception_describe();
                let _ = env.exception_clear();
            }
            return Err(jni_error(e));
        }
        Ok(())
    }

    fn command(&self, method: &str, sig: &str, args: &[JavaArg<'_>]) {
        if let Err(e) = self.call_static(method, sig, args) {
            log::error!("NativeSoundBridge.{} failed: {}", method, e);
        }
    }

    fn request(&self, call: PendingCall, method: &str, sig: &str, args: &[JavaArg<'_>]) {
        let request_id = self.pending.register(call);
        let mut with_id = args.to_vec();
        with_id.push(JavaArg::Long(request_id as i64));

        if let Err(e) = self.call_static(method, sig, &with_id) {
            log::error!("NativeSoundBridge.{} failed for request {}: {}", method, request_id, e);
            fail_request(&self.pending, request_id, &e);
        }
    }
}

impl NativeSoundModule for JniSoundModule {
    fn prepare(
        &self,
        path: &str,
        key: SoundKey,
        options: &PrepareOptions,
        on_prepared: PrepareCallback,
    ) {
        let options = match options.to_json() {
            Ok(options) => options,
            Err(e) => {
                log::error!("Failed to encode prepare options for key {}: {}", key, e);
                on_prepared(Some(NativeError::new(e.to_string())), None);
                return;
            }
        };

        self.request(
            PendingCall::Prepare(on_prepared),
            "prepare",
            "(Ljava/lang/String;ILjava/lang/String;J)V",
            &[JavaArg::Str(path), JavaArg::Int(key.raw()), JavaArg::Str(&options)],
        );
    }

    fn play(&self, key: SoundKey, on_end: PlayCallback) {
        self.request(PendingCall::Play(on_end), "play", "(IJ)V", &[JavaArg::Int(key.raw())]);
    }

    fn pause(&self, key: SoundKey, on_done: DoneCallback) {
        self.request(PendingCall::Done(on_done), "pause", "(IJ)V", &[JavaArg::Int(key.raw())]);
    }

    fn stop(&self, key: SoundKey, on_done: DoneCallback) {
        self.request(PendingCall::Done(on_done), "stop", "(IJ)V", &[JavaArg::Int(key.raw())]);
    }

    fn reset(&self, key: SoundKey) {
        self.command("reset", "(I)V", &[JavaArg::Int(key.raw())]);
    }

    fn release(&self, key: SoundKey) {
        self.command("release", "(I)V", &[JavaArg::Int(key.raw())]);
    }

    fn set_volume(&self, key: SoundKey, left: f32, right: Option<f32>) {
        self.command(
            "setVolume",
            "(IFF)V",
            &[JavaArg::Int(key.raw()), JavaArg::Float(left), JavaArg::Float(right.unwrap_or(left))],
        );
    }

    fn get_current_time(&self, key: SoundKey, on_time: CurrentTimeCallback) {
        self.request(
            PendingCall::CurrentTime(on_time),
            "getCurrentTime",
            "(IJ)V",
            &[JavaArg::Int(key.raw())],
        );
    }

    fn set_current_time(&self, key: SoundKey, position: f64) {
        self.command(
            "setCurrentTime",
            "(ID)V",
            &[JavaArg::Int(key.raw()), JavaArg::Double(position)],
        );
    }

    fn set_speakerphone_on(&self, key: SoundKey, on: bool) {
        self.command("setSpeakerphoneOn", "(IZ)V", &[JavaArg::Int(key.raw()), JavaArg::Bool(on)]);
    }

    fn get_system_volume(&self, on_volume: SystemVolumeCallback) {
        self.request(PendingCall::SystemVolume(on_volume), "getSystemVolume", "(J)V", &[]);
    }

    fn set_system_volume(&self, volume: f32) {
        self.command("setSystemVolume", "(F)V", &[JavaArg::Float(volume)]);
    }

    fn enable(&self, enabled: bool) {
        self.command("enable", "(Z)V", &[JavaArg::Bool(enabled)]);
    }

    fn set_active(&self, _active: bool) {
        // No audio session to activate on Android
        log::debug!("set_active ignored on Android");
    }

    fn directories(&self) -> NativeDirectories {
        NativeDirectories::default()
    }

    fn play_change_events(&self) -> Arc<PlayChangeEmitter> {
        self.events.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use podium_sound_core::SoundProps;

    #[test]
    fn test_fail_request_answers_prepare_with_error() {
        let pending = PendingCalls::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let id = pending.register(PendingCall::Prepare(Box::new(
            move |error: Option<NativeError>, props: Option<SoundProps>| {
                *sink.lock() = Some((error, props));
            },
        )));

        fail_request(&pending, id, &SoundError::Bridge("no JVM".to_string()));

        let (error, props) = seen.lock().take().unwrap();
        assert_eq!(error.unwrap().message, "Bridge error: no JVM");
        assert!(props.is_none());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_fail_request_ends_play_unsuccessfully() {
        let pending = PendingCalls::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let id = pending.register(PendingCall::Play(Box::new(move |ok: bool| {
            *sink.lock() = Some(ok)
        })));

        fail_request(&pending, id, &SoundError::BridgeNotInstalled);
        assert_eq!(*seen.lock(), Some(false));
    }

    #[test]
    fn test_fail_request_drops_silent_continuations() {
        let pending = PendingCalls::new();
        let id = pending.register(PendingCall::Done(Box::new(|| panic!("must not fire"))));
        fail_request(&pending, id, &SoundError::BridgeNotInstalled);
        assert!(pending.is_empty());

        // Unknown ids are a no-op
        fail_request(&pending, 999, &SoundError::BridgeNotInstalled);
    }
}
