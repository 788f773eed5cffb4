//! Broker error types.
//!
//! Authorization failures are deliberately absent: a denied lookup or an
//! unregister by a non-owner is reported exactly like "not found".

use super::traits::Category;

/// Reasons a registration is refused. No state changes on any of them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    /// The value is already registered, under this or another interface.
    #[error("context is already registered")]
    AlreadyRegistered,

    /// The value does not declare the interface, directly or through an
    /// extension chain.
    #[error("context does not implement interface {interface}")]
    NotImplemented { interface: String },

    /// The value's interfaces lead to more than one root contract.
    #[error("context implements several root contracts: {categories:?}")]
    AmbiguousCategory { categories: Vec<Category> },

    /// The structural fingerprint of the interface does not match the one
    /// it declares.
    #[error("contract fingerprint mismatch for {interface}: expected {expected}, actual {actual}")]
    FingerprintMismatch {
        interface: String,
        expected: String,
        actual: String,
    },
}

/// Lookup failures that are the caller's fault rather than "not found".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// Ordinal outside the registered entries of a non-empty bucket.
    #[error("ordinal {ordinal} out of range for {interface} ({len} registered)")]
    OrdinalOutOfRange {
        interface: String,
        ordinal: usize,
        len: usize,
    },
}

pub type LookupResult<T> = Result<T, LookupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_interface() {
        let err = LookupError::OrdinalOutOfRange {
            interface: "MemoryContext".into(),
            ordinal: 2,
            len: 2,
        };
        assert_eq!(
            err.to_string(),
            "ordinal 2 out of range for MemoryContext (2 registered)"
        );

        let err = RegisterError::NotImplemented {
            interface: "CpuContext".into(),
        };
        assert!(err.to_string().contains("CpuContext"));
    }
}
