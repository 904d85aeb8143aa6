use thiserror::Error;

/// Errors surfaced to callers of the preference facade.
///
/// Storage problems never show up here; they degrade to "source
/// unavailable" and reads fall back to defaults.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrefsError {
    #[error("Preferences are read-only: '{operation}' is not supported")]
    Unsupported { operation: &'static str },

    #[error("Preferences have already been loaded")]
    AlreadyLoaded,
}
