//! Reveal error types

use std::fmt;

use thiserror::Error;

/// Which user hook produced a [`RevealError::CallbackError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HookKind {
    BeforeReveal,
    AfterReveal,
    BeforeReset,
    AfterReset,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::BeforeReveal => "beforeReveal",
            HookKind::AfterReveal => "afterReveal",
            HookKind::BeforeReset => "beforeReset",
            HookKind::AfterReset => "afterReset",
        };
        f.write_str(name)
    }
}

/// Errors reported by the reveal engine
///
/// None of these are fatal: the engine logs them, skips the affected element
/// (or degrades the whole instance to a no-op) and keeps running.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RevealError {
    /// Options failed semantic validation
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Container selector matched nothing; the root container is used instead
    #[error("Container not found: {0}")]
    MissingContainer(String),

    /// Reveal target matched no nodes
    #[error("Target not found: {0}")]
    MissingTarget(String),

    /// Host lacks a required capability
    #[error("Environment not supported: {0}")]
    UnsupportedEnvironment(String),

    /// A user hook returned an error or panicked
    #[error("Callback {hook} failed: {message}")]
    CallbackError { hook: HookKind, message: String },

    /// The instance has been destroyed
    #[error("Instance destroyed")]
    Destroyed,
}

impl RevealError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RevealError::InvalidConfiguration(message.into())
    }
}

/// Result type for reveal operations
pub type Result<T> = std::result::Result<T, RevealError>;
