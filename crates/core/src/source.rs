// Sound source resolution
//
// Turns what the caller asked for into the one string handed to the native
// engine, and the key derived from it. Preparation and key derivation must
// both read the resolved path, or the native handle and the session key drift
// apart.

use crate::error::{Result, SoundError};
use crate::key::{AssetId, SoundKey};
use crate::platform::PlatformCapabilities;

/// What to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// Resource shipped inside the app bundle
    Asset(AssetId),
    /// File name or path, optionally relative to `base_path`
    File {
        path: String,
        base_path: Option<String>,
    },
}

impl SoundSource {
    pub fn file(path: impl Into<String>) -> Self {
        SoundSource::File {
            path: path.into(),
            base_path: None,
        }
    }

    /// `path` inside `base_path`, typically one of the
    /// [`NativeDirectories`](crate::directories::NativeDirectories).
    pub fn in_dir(path: impl Into<String>, base_path: impl Into<String>) -> Self {
        SoundSource::File {
            path: path.into(),
            base_path: Some(base_path.into()),
        }
    }
}

impl From<AssetId> for SoundSource {
    fn from(id: AssetId) -> Self {
        SoundSource::Asset(id)
    }
}

/// Bundled asset as located by the asset resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub uri: String,
    pub id: AssetId,
}

/// Maps bundled asset identifiers to a loadable URI.
pub trait AssetResolver: Send + Sync {
    fn resolve(&self, id: AssetId) -> Option<ResolvedAsset>;
}

impl<F> AssetResolver for F
where
    F: Fn(AssetId) -> Option<ResolvedAsset> + Send + Sync,
{
    fn resolve(&self, id: AssetId) -> Option<ResolvedAsset> {
        self(id)
    }
}

/// Resolver for hosts without bundled assets.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAssets;

impl AssetResolver for NoAssets {
    fn resolve(&self, _id: AssetId) -> Option<ResolvedAsset> {
        None
    }
}

/// Final native path for a sound source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPath {
    Asset(ResolvedAsset),
    File(String),
}

impl ResolvedPath {
    pub fn is_asset(&self) -> bool {
        matches!(self, ResolvedPath::Asset(_))
    }

    /// String passed to native `prepare`.
    pub fn native_path(&self) -> &str {
        match self {
            ResolvedPath::Asset(asset) => &asset.uri,
            ResolvedPath::File(path) => path,
        }
    }
}

/// A path is relative unless it starts with `/`, `http`, `https` or `asset`.
pub fn is_relative_path(path: &str) -> bool {
    !(path.starts_with('/') || path.starts_with("http") || path.starts_with("asset"))
}

/// Lowercase `name` and drop its final `.ext` suffix.
///
/// Only the last dot counts, and only when something follows it, so `"a."`
/// is kept as is.
pub fn normalize_resource_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    match lowered.rfind('.') {
        Some(dot) if dot + 1 < lowered.len() => lowered[..dot].to_string(),
        _ => lowered,
    }
}

/// Resolve `source` to the path the native engine will load.
pub fn resolve_path(
    source: &SoundSource,
    resolver: &dyn AssetResolver,
    capabilities: &PlatformCapabilities,
) -> Result<ResolvedPath> {
    match source {
        SoundSource::Asset(id) => resolver
            .resolve(*id)
            .map(ResolvedPath::Asset)
            .ok_or(SoundError::UnresolvedAsset(*id)),
        SoundSource::File { path, base_path } => {
            let resolved = match base_path {
                Some(base) => format!("{}/{}", base, path),
                None if capabilities.lowercase_resource_names && is_relative_path(path) => {
                    normalize_resource_name(path)
                }
                None => path.clone(),
            };
            Ok(ResolvedPath::File(resolved))
        }
    }
}

/// Key for a resolved source: asset id for bundled assets, DJB2 of the
/// native path otherwise.
pub fn derive_key(resolved: &ResolvedPath) -> SoundKey {
    match resolved {
        ResolvedPath::Asset(asset) => SoundKey::for_asset(asset.id),
        ResolvedPath::File(path) => SoundKey::for_path(path),
    }
}
