// Core session layer for Podium sound playback
// Maps sound sources to keyed native players on Android, iOS and Windows

pub mod backend;
pub mod directories;
pub mod error;
pub mod events;
pub mod key;
pub mod native;
pub mod pending;
pub mod platform;
pub mod sound;
pub mod source;
pub mod system;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use backend::{select_backend, CapabilityBackend, Dispatch, NativeAudioBackend};
pub use directories::NativeDirectories;
pub use error::{NativeError, Result, SoundError};
pub use events::{PlayChangeEmitter, PlayChangeEvent, PlayChangeListener, Subscription};
pub use key::{djb2, AssetId, SoundKey};
pub use native::{
    CurrentTimeCallback, DoneCallback, NativeSoundModule, OptionValue, PlayCallback,
    PrepareCallback, PrepareOptions, SoundProps, SystemVolumeCallback,
};
pub use pending::{PendingCall, PendingCalls};
pub use platform::{Platform, PlatformCapabilities, VolumeChannels};
pub use sound::{Sound, UNKNOWN_DURATION};
pub use source::{
    derive_key, is_relative_path, normalize_resource_name, resolve_path, AssetResolver, NoAssets,
    ResolvedAsset, ResolvedPath, SoundSource,
};
pub use system::SoundSystem;
