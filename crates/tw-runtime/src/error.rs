use thiserror::Error;

use crate::capability::CapabilitySlot;

/// Errors from binding or checking capability slots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The slot already has an implementation.
    #[error("capability `{0}` is already bound")]
    AlreadyBound(CapabilitySlot),

    /// The slot has no implementation.
    #[error("capability `{0}` is not bound")]
    Unbound(CapabilitySlot),
}

/// Convenience alias for registry results.
pub type RegistryResult<T> = Result<T, RegistryError>;
