//! Injectable marker, lifetimes and bootstrap definitions

use std::fmt;

/// Marker trait for types that can act as container contracts.
///
/// Automatically implemented for every `Send + Sync + 'static` type,
/// including trait objects whose traits carry those bounds. You never
/// implement this manually.
///
/// # Examples
///
/// ```rust
/// // Any Send + Sync + 'static type qualifies, no impl needed.
/// struct Database {
///     url: String,
/// }
///
/// // Trait objects qualify too:
/// trait Repository: Send + Sync {}
/// ```
pub trait Injectable: Send + Sync + 'static {}

impl<T: ?Sized + Send + Sync + 'static> Injectable for T {}

/// Instance reuse policy for a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// New instance on every resolve; ownership passes to the caller.
    #[default]
    Transient,

    /// One lazily-constructed instance per container.
    Singleton,

    /// One instance per [`Scope`](crate::Scope), released on dispose.
    Scoped,
}

impl Lifetime {
    /// Whether instances of this lifetime are cached anywhere.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifetime::Singleton | Lifetime::Scoped)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Transient => f.write_str("transient"),
            Lifetime::Singleton => f.write_str("singleton"),
            Lifetime::Scoped => f.write_str("scoped"),
        }
    }
}

/// One entry of a bootstrap registration table.
///
/// A `ServiceDef` pairs a contract's name with a function that registers it
/// into a container. Collect defs into a slice and apply them with
/// [`Container::install`](crate::Container::install) from a single startup
/// routine; the [`service_def!`](crate::service_def) macro builds one per
/// lifetime.
///
/// # Examples
///
/// ```rust
/// use wirecell::{service_def, Container, ServiceDef};
///
/// #[derive(Default)]
/// struct Config {
///     debug: bool,
/// }
///
/// struct AuditLog;
///
/// static SERVICES: &[ServiceDef] = &[
///     service_def!(singleton Config, Config::default),
///     service_def!(transient AuditLog, || AuditLog),
/// ];
///
/// let container = Container::new();
/// container.install(SERVICES);
/// assert!(container.is_registered::<Config>());
/// ```
#[derive(Clone, Copy)]
pub struct ServiceDef {
    /// Human-readable contract type name
    pub type_name: &'static str,
    /// Registration function applied at install time
    pub register: fn(&crate::Container),
}

impl fmt::Debug for ServiceDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDef")
            .field("type_name", &self.type_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_is_default() {
        assert_eq!(Lifetime::default(), Lifetime::Transient);
    }

    #[test]
    fn cached_lifetimes() {
        assert!(!Lifetime::Transient.is_cached());
        assert!(Lifetime::Singleton.is_cached());
        assert!(Lifetime::Scoped.is_cached());
    }

    #[test]
    fn lifetime_display() {
        assert_eq!(format!("{}", Lifetime::Transient), "transient");
        assert_eq!(format!("{}", Lifetime::Singleton), "singleton");
        assert_eq!(format!("{}", Lifetime::Scoped), "scoped");
    }
}
