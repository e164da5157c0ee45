// Platform variants and the capability table that drives per-platform behavior

use std::fmt;

/// Native backend variant the process is running against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Android,
    Ios,
    Windows,
}

impl Platform {
    /// Variant matching the compilation target. Anything that is neither
    /// Android nor Windows talks to the iOS-style engine.
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Platform::Android
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Ios
        }
    }

    pub fn capabilities(self) -> PlatformCapabilities {
        match self {
            Platform::Android => PlatformCapabilities {
                platform: self,
                stateful_reset: true,
                system_volume: true,
                play_change_events: true,
                session_activation: false,
                volume_channels: VolumeChannels::Stereo,
                lowercase_resource_names: true,
            },
            Platform::Ios => PlatformCapabilities {
                platform: self,
                stateful_reset: false,
                system_volume: false,
                play_change_events: true,
                session_activation: true,
                volume_channels: VolumeChannels::Mono,
                lowercase_resource_names: false,
            },
            Platform::Windows => PlatformCapabilities {
                platform: self,
                stateful_reset: false,
                system_volume: false,
                play_change_events: false,
                session_activation: false,
                volume_channels: VolumeChannels::Stereo,
                lowercase_resource_names: false,
            },
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Platform::Android => write!(f, "android"),
            Platform::Ios => write!(f, "ios"),
            Platform::Windows => write!(f, "windows"),
        }
    }
}

/// How the native `setVolume` call expects its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeChannels {
    /// Single scalar
    Mono,
    /// Left/right pair, both set to the same value
    Stereo,
}

/// Feature set of one native backend variant.
///
/// Built from [`Platform::capabilities`] and injected into the backend, so
/// every platform branch can be exercised from tests on any host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    pub platform: Platform,
    /// Native `reset` exists and clears the player state
    pub stateful_reset: bool,
    /// System volume and speakerphone routing can be controlled
    pub system_volume: bool,
    /// Native layer emits play-state change events
    pub play_change_events: bool,
    /// `setActive` must be forwarded to activate the audio session
    pub session_activation: bool,
    pub volume_channels: VolumeChannels,
    /// Relative resource names are looked up lowercased and without extension
    pub lowercase_resource_names: bool,
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Platform::current().capabilities()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_android_supports_reset_and_system_volume() {
        for platform in [Platform::Android, Platform::Ios, Platform::Windows] {
            let caps = platform.capabilities();
            let expected = platform == Platform::Android;
            assert_eq!(caps.stateful_reset, expected);
            assert_eq!(caps.system_volume, expected);
            assert_eq!(caps.lowercase_resource_names, expected);
        }
    }

    #[test]
    fn test_windows_has_no_play_change_events() {
        assert!(!Platform::Windows.capabilities().play_change_events);
        assert!(Platform::Android.capabilities().play_change_events);
        assert!(Platform::Ios.capabilities().play_change_events);
    }

    #[test]
    fn test_volume_channels() {
        assert_eq!(Platform::Android.capabilities().volume_channels, VolumeChannels::Stereo);
        assert_eq!(Platform::Windows.capabilities().volume_channels, VolumeChannels::Stereo);
        assert_eq!(Platform::Ios.capabilities().volume_channels, VolumeChannels::Mono);
    }

    #[test]
    fn test_session_activation_only_on_ios() {
        assert!(Platform::Ios.capabilities().session_activation);
        assert!(!Platform::Android.capabilities().session_activation);
        assert!(!Platform::Windows.capabilities().session_activation);
    }
}
