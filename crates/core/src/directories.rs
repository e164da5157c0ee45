// Well-known native directories, exposed for building file references

/// Paths the native layer reports once at startup.
///
/// Platforms that have no such directory leave the field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeDirectories {
    pub main_bundle: Option<String>,
    pub document: Option<String>,
    pub library: Option<String>,
    pub caches: Option<String>,
}
