//! Shared error type across tally crates.

use thiserror::Error;

use crate::kind::MetricKind;

/// Coarse error classes (stable, used in log fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad or missing configuration, including a kind with no registration.
    Configuration,
    /// One entry could not be folded into its exported family.
    Fold,
    /// Rendering the exposition text failed.
    Export,
    /// Anything else.
    Internal,
}

impl ErrorClass {
    /// String representation used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Configuration => "CONFIGURATION",
            ErrorClass::Fold => "FOLD",
            ErrorClass::Export => "EXPORT",
            ErrorClass::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TallyError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("no registration for metric kind {0}")]
    UnregisteredKind(MetricKind),
    #[error("fold failed for {kind}: {reason}")]
    Fold { kind: MetricKind, reason: String },
    #[error("export: {0}")]
    Export(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl TallyError {
    /// Shorthand for a fold error.
    pub fn fold(kind: MetricKind, reason: impl Into<String>) -> Self {
        TallyError::Fold {
            kind,
            reason: reason.into(),
        }
    }

    /// Map to a stable error class.
    pub fn class(&self) -> ErrorClass {
        match self {
            TallyError::Config(_) | TallyError::UnsupportedVersion => ErrorClass::Configuration,
            TallyError::UnregisteredKind(_) => ErrorClass::Configuration,
            TallyError::Fold { .. } => ErrorClass::Fold,
            TallyError::Export(_) => ErrorClass::Export,
            TallyError::Internal(_) => ErrorClass::Internal,
        }
    }
}

impl From<std::fmt::Error> for TallyError {
    fn from(e: std::fmt::Error) -> Self {
        TallyError::Export(format!("render failed: {e}"))
    }
}
