//! Error types for container operations

use crate::key::ServiceKey;
use std::fmt;
use thiserror::Error;

/// The ordered chain of contracts that formed a dependency cycle.
///
/// The chain lists every contract on the active resolution path in
/// construction order and ends with the repeated entry, e.g.
/// `ServiceA -> ServiceB -> ServiceA`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyChain(Vec<ServiceKey>);

impl DependencyChain {
    pub(crate) fn new(keys: Vec<ServiceKey>) -> Self {
        Self(keys)
    }

    /// The contracts on the chain, in resolution order.
    #[inline]
    pub fn keys(&self) -> &[ServiceKey] {
        &self.0
    }

    /// Whether the chain passes through contract `T`.
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        let type_id = std::any::TypeId::of::<T>();
        self.0.iter().any(|k| k.type_id() == type_id)
    }
}

impl fmt::Display for DependencyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            f.write_str(key.type_name())?;
            if let Some(name) = key.name() {
                write!(f, "[{name}]")?;
            }
        }
        Ok(())
    }
}

/// Errors that can occur during container operations
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// No registration exists for the requested contract (and name)
    #[error("service not registered: {key}")]
    NotRegistered {
        /// The contract that was requested
        key: ServiceKey,
    },

    /// A contract reappeared on the active resolution path
    #[error("circular dependency detected: {chain}")]
    CircularDependency {
        /// Resolution path including the repeated entry
        chain: DependencyChain,
    },

    /// The scope was already disposed
    #[error("scope is disposed - no further resolutions allowed")]
    ScopeDisposed,

    /// The registration described no usable provider
    #[error("invalid registration for {key}: {reason}")]
    InvalidRegistration {
        /// The contract being registered
        key: ServiceKey,
        /// What was wrong with the registration
        reason: &'static str,
    },

    /// Internal error
    #[error("internal container error: {0}")]
    Internal(String),
}

impl DiError {
    /// Create a `NotRegistered` error for an unnamed contract
    #[inline]
    pub fn not_registered<T: ?Sized + 'static>() -> Self {
        Self::NotRegistered {
            key: ServiceKey::of::<T>(),
        }
    }

    /// Create a `NotRegistered` error from a key
    #[inline]
    pub fn not_registered_key(key: ServiceKey) -> Self {
        Self::NotRegistered { key }
    }

    /// Create a `CircularDependency` error from the active chain
    #[inline]
    pub(crate) fn circular(keys: Vec<ServiceKey>) -> Self {
        Self::CircularDependency {
            chain: DependencyChain::new(keys),
        }
    }

    /// True when the error is a missing-registration failure.
    ///
    /// The default-fallback resolution forms substitute a default only for
    /// this case; every other error keeps propagating.
    #[inline]
    pub fn is_not_registered(&self) -> bool {
        matches!(self, Self::NotRegistered { .. })
    }
}

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, DiError>;
