// Process-wide sound operations

use std::sync::Arc;

use crate::backend::{Dispatch, NativeAudioBackend};
use crate::directories::NativeDirectories;
use crate::error::Result;
use crate::native::{PrepareCallback, PrepareOptions};
use crate::platform::PlatformCapabilities;
use crate::sound::Sound;
use crate::source::{AssetResolver, NoAssets, SoundSource};

/// Shared context every [`Sound`] is created in: the selected backend, the
/// asset resolver and the directory constants read from the native layer.
pub struct SoundSystem {
    backend: Arc<dyn NativeAudioBackend>,
    resolver: Arc<dyn AssetResolver>,
    directories: NativeDirectories,
}

impl SoundSystem {
    pub fn new(backend: Arc<dyn NativeAudioBackend>) -> Arc<Self> {
        Self::with_resolver(backend, Arc::new(NoAssets))
    }

    pub fn with_resolver(
        backend: Arc<dyn NativeAudioBackend>,
        resolver: Arc<dyn AssetResolver>,
    ) -> Arc<Self> {
        let directories = backend.directories();
        log::info!(
            "Sound system ready on {} (bundle: {:?})",
            backend.capabilities().platform,
            directories.main_bundle
        );

        Arc::new(Self {
            backend,
            resolver,
            directories,
        })
    }

    pub fn backend(&self) -> &Arc<dyn NativeAudioBackend> {
        &self.backend
    }

    pub fn resolver(&self) -> &dyn AssetResolver {
        self.resolver.as_ref()
    }

    pub fn capabilities(&self) -> &PlatformCapabilities {
        self.backend.capabilities()
    }

    /// Create a sound and start preparing it. See [`Sound::new`].
    pub fn create_sound(
        self: &Arc<Self>,
        source: impl Into<SoundSource>,
        options: PrepareOptions,
        on_prepared: Option<PrepareCallback>,
    ) -> Result<Sound> {
        Sound::new(self.clone(), source.into(), options, on_prepared)
    }

    /// Turn the native engine on or off.
    pub fn enable(&self, enabled: bool) {
        self.backend.enable(enabled);
    }

    /// Activate the audio session. Only iOS needs this; elsewhere it is
    /// reported as [`Dispatch::Unsupported`].
    pub fn set_active(&self, active: bool) -> Dispatch {
        self.backend.set_active(active)
    }

    pub fn directories(&self) -> &NativeDirectories {
        &self.directories
    }

    pub fn main_bundle(&self) -> Option<&str> {
        self.directories.main_bundle.as_deref()
    }

    pub fn document_dir(&self) -> Option<&str> {
        self.directories.document.as_deref()
    }

    pub fn library_dir(&self) -> Option<&str> {
        self.directories.library.as_deref()
    }

    pub fn caches_dir(&self) -> Option<&str> {
        self.directories.caches.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CapabilityBackend;
    use crate::platform::Platform;
    use crate::testing::{Call, RecordingModule};

    fn system(platform: Platform, module: Arc<RecordingModule>) -> Arc<SoundSystem> {
        SoundSystem::new(Arc::new(CapabilityBackend::for_platform(module, platform)))
    }

    #[test]
    fn test_enable_forwards_everywhere() {
        for platform in [Platform::Android, Platform::Ios, Platform::Windows] {
            let module = Arc::new(RecordingModule::new());
            system(platform, module.clone()).enable(true);
            assert_eq!(module.calls(), vec![Call::Enable(true)]);
        }
    }

    #[test]
    fn test_set_active_only_on_ios() {
        let module = Arc::new(RecordingModule::new());
        assert_eq!(system(Platform::Ios, module.clone()).set_active(true), Dispatch::Forwarded);
        assert_eq!(module.calls(), vec![Call::SetActive(true)]);

        for platform in [Platform::Android, Platform::Windows] {
            let module = Arc::new(RecordingModule::new());
            assert_eq!(system(platform, module.clone()).set_active(true), Dispatch::Unsupported);
            assert!(module.calls().is_empty());
        }
    }

    #[test]
    fn test_directories_are_read_at_startup() {
        let module = Arc::new(RecordingModule::with_directories(NativeDirectories {
            main_bundle: Some("/app/Bundle".to_string()),
            document: Some("/app/Documents".to_string()),
            library: Some("/app/Library".to_string()),
            caches: Some("/app/Library/Caches".to_string()),
        }));
        let system = system(Platform::Ios, module);

        assert_eq!(system.main_bundle(), Some("/app/Bundle"));
        assert_eq!(system.document_dir(), Some("/app/Documents"));
        assert_eq!(system.library_dir(), Some("/app/Library"));
        assert_eq!(system.caches_dir(), Some("/app/Library/Caches"));
    }

    #[test]
    fn test_missing_directories() {
        let system = system(Platform::Android, Arc::new(RecordingModule::new()));
        assert_eq!(system.main_bundle(), None);
        assert_eq!(system.caches_dir(), None);
    }
}
