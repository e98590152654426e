//! Unified error types for the watering controller.
//!
//! [`Error`] covers the boot-time failures `main` reports; [`LedgerError`]
//! is what the persistent ledger returns at run time. Both are `Copy` so
//! they can be carried inside [`AppEvent`](crate::app::events::AppEvent)s
//! without allocation.
//!
//! Nothing in here is fatal to the control loop. Uninitialised storage is
//! recovered by a full reset, an absent RTC by the build timestamp, and a
//! failed ledger write is reported and retried implicitly by the next
//! state-affecting event.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Boot-time failures surfaced by `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    /// The configured-marker is absent or wrong: storage was never initialised.
    NotConfigured,
    /// The marker is valid but the stored layout version is not ours.
    LayoutMismatch { found: u8 },
    /// A field is missing or failed to decode. Carries the field key.
    Corrupted(&'static str),
    /// The storage backend failed.
    Storage(StorageError),
}

impl LedgerError {
    /// True when the ledger should be re-initialised with a full reset
    /// rather than treated as a transient I/O failure.
    pub fn needs_reset(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "not configured"),
            Self::LayoutMismatch { found } => write!(f, "layout version {found} not supported"),
            Self::Corrupted(field) => write!(f, "field '{field}' corrupted"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

impl From<StorageError> for LedgerError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::NotFound => Self::Config("not found"),
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::StorageFull => Self::Config("storage full"),
            ConfigError::IoError => Self::Config("I/O error"),
        }
    }
}
