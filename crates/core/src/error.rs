// Error handling for the sound session layer

use std::fmt;

use crate::key::AssetId;

/// Failure reported by the native engine in a completion callback.
///
/// The session layer never builds one of these itself; it only forwards what
/// the native side handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    /// Engine-specific error code, if the platform reports one
    pub code: Option<String>,
    /// Human readable description
    pub message: String,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for NativeError {}

/// Sound layer error types
#[derive(Debug, Clone)]
pub enum SoundError {
    /// A bundled asset descriptor the asset resolver does not know
    UnresolvedAsset(AssetId),

    /// No native bridge has been installed for this process
    BridgeNotInstalled,

    /// Native bridge call failed before reaching the engine
    Bridge(String),

    /// A string crossing the native boundary was not valid
    InvalidString(String),

    /// Prepare options could not be encoded for the native side
    Serialization(String),
}

impl fmt::Display for SoundError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SoundError::UnresolvedAsset(id) => write!(f, "Unresolved asset: {}", id),
            SoundError::BridgeNotInstalled => write!(f, "Native sound bridge is not installed"),
            SoundError::Bridge(msg) => write!(f, "Bridge error: {}", msg),
            SoundError::InvalidString(msg) => write!(f, "Invalid string: {}", msg),
            SoundError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for SoundError {}

/// Result type alias for sound operations
pub type Result<T> = std::result::Result<T, SoundError>;

impl From<serde_json::Error> for SoundError {
    fn from(err: serde_json::Error) -> Self {
        SoundError::Serialization(err.to_string())
    }
}

impl From<std::str::Utf8Error> for SoundError {
    fn from(err: std::str::Utf8Error) -> Self {
        SoundError::InvalidString(err.to_string())
    }
}
