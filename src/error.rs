//! Fatal bootstrap errors.
//!
//! Degraded dependencies (cache or local network unreachable) and transient
//! probe failures never surface here; they are absorbed into log lines,
//! `None` handles and health snapshot fields.

use thiserror::Error;

use crate::config::ConfigError;
use crate::identity::IdentityError;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Required configuration absent, malformed or semantically invalid.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Key material unreadable, malformed, mismatched or not provisionable.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
}

impl BootstrapError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_identity_mismatch(&self) -> bool {
        matches!(self, Self::Identity(IdentityError::Mismatch { .. }))
    }
}
