// Sound key derivation
//
// The native engine addresses every prepared player by a 32-bit key. Bundled
// assets reuse their bundler-issued identifier; everything else hashes the
// resolved path with DJB2.

use std::fmt;

use serde::{Deserialize, Serialize};

const DJB2_SEED: u32 = 5381;

/// Identifier the asset bundler assigns to a resource shipped inside the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub i32);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

/// Key the native engine uses to look up a prepared player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundKey(i32);

impl SoundKey {
    /// Wrap a key reported by the native side (e.g. in a play-state event).
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Key for a bundled asset: the asset identifier, unchanged.
    pub const fn for_asset(id: AssetId) -> Self {
        Self(id.0)
    }

    /// Key for a file reference: DJB2 over the final resolved path.
    pub fn for_path(path: &str) -> Self {
        Self(djb2(path))
    }

    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for SoundKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// DJB2 hash (`hash * 33 + c`) over the UTF-16 code units of `input`.
///
/// Arithmetic wraps at 32 bits and the result is read back as a signed
/// integer. For ASCII input this is the plain byte-wise DJB2.
pub fn djb2(input: &str) -> i32 {
    let hash = input.encode_utf16().fold(DJB2_SEED, |hash, unit| {
        (hash << 5)
            .wrapping_add(hash)
            .wrapping_add(u32::from(unit))
    });
    hash as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_djb2_reference_values() {
        assert_eq!(djb2(""), 5381);
        assert_eq!(djb2("a"), 177670);
        assert_eq!(djb2("sound"), 274653294);
        assert_eq!(djb2("sound.mp3"), -323977428);
        assert_eq!(djb2("/data/user/0/files/beep.wav"), 1649681124);
    }

    #[test]
    fn test_path_key_is_deterministic() {
        let first = SoundKey::for_path("whoosh.mp3");
        let second = SoundKey::for_path("whoosh.mp3");
        assert_eq!(first, second);
        assert_eq!(first.raw(), 1306996667);
    }

    #[test]
    fn test_case_sensitive_hash() {
        assert_ne!(SoundKey::for_path("Sound.MP3"), SoundKey::for_path("sound.mp3"));
        assert_eq!(djb2("Sound.MP3"), 1562497740);
    }

    #[test]
    fn test_asset_key_passes_through() {
        assert_eq!(SoundKey::for_asset(AssetId(42)).raw(), 42);
        assert_eq!(SoundKey::for_asset(AssetId(42)), SoundKey::from_raw(42));
    }

    #[test]
    fn test_non_ascii_uses_utf16_units() {
        // 'é' is a single UTF-16 unit (0xE9) but two UTF-8 bytes
        let expected = (DJB2_SEED << 5).wrapping_add(DJB2_SEED).wrapping_add(0xE9) as i32;
        assert_eq!(djb2("é"), expected);
    }
}
