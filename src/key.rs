//! Contract identity keys
//!
//! A [`ServiceKey`] identifies one registration slot: the contract's `TypeId`
//! plus an optional name, so the same contract can be registered under
//! several named variants.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Identity of a registered contract: type plus optional name.
///
/// Equality and hashing use the type id and the name; the captured type name
/// is carried only for diagnostics.
///
/// # Examples
///
/// ```rust
/// use wirecell::ServiceKey;
///
/// struct Database;
///
/// let unnamed = ServiceKey::of::<Database>();
/// let named = ServiceKey::named::<Database>("replica");
/// assert_ne!(unnamed, named);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<Arc<str>>,
}

impl ServiceKey {
    /// Key for an unnamed registration of contract `T`.
    ///
    /// `T` may be unsized, so trait objects work: `ServiceKey::of::<dyn Repo>()`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: None,
        }
    }

    /// Key for a named registration of contract `T`.
    #[inline]
    pub fn named<T: ?Sized + 'static>(name: impl Into<Arc<str>>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: Some(name.into()),
        }
    }

    /// Key for contract `T` with an optional name.
    #[inline]
    pub fn maybe_named<T: ?Sized + 'static>(name: Option<&str>) -> Self {
        match name {
            Some(n) => Self::named::<T>(n),
            None => Self::of::<T>(),
        }
    }

    /// The contract's `TypeId`.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Human-readable contract type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The registration name, if any.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} (name: {:?})", self.type_name, name),
            None => f.write_str(self.type_name),
        }
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Key({}, {:?})", self.type_name, name),
            None => write!(f, "Key({})", self.type_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Marker: Send + Sync {}

    struct ServiceA;
    struct ServiceB;

    #[test]
    fn keys_compare_by_type() {
        assert_eq!(ServiceKey::of::<ServiceA>(), ServiceKey::of::<ServiceA>());
        assert_ne!(ServiceKey::of::<ServiceA>(), ServiceKey::of::<ServiceB>());
    }

    #[test]
    fn keys_compare_by_name() {
        let a = ServiceKey::named::<ServiceA>("a");
        let b = ServiceKey::named::<ServiceA>("b");
        assert_ne!(a, b);
        assert_eq!(a, ServiceKey::named::<ServiceA>("a"));
        assert_ne!(a, ServiceKey::of::<ServiceA>());
    }

    #[test]
    fn trait_object_keys() {
        let key = ServiceKey::of::<dyn Marker>();
        assert_eq!(key, ServiceKey::of::<dyn Marker>());
        assert_ne!(key, ServiceKey::of::<ServiceA>());
    }

    #[test]
    fn display_includes_name() {
        let key = ServiceKey::maybe_named::<ServiceA>(Some("primary"));
        let text = format!("{key}");
        assert!(text.contains("ServiceA"));
        assert!(text.contains("primary"));
    }
}
