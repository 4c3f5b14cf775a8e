//! Registrations: how one instance gets built
//!
//! A [`Registration`] binds a contract key to exactly one provider - a
//! zero-argument factory or a resolver-aware constructor - plus a lifetime,
//! an optional name and an optional disposer. Instances are stored
//! type-erased as `Arc<dyn Any + Send + Sync>` wrapping an `Arc<T>`, so
//! unsized contracts (trait objects) erase the same way sized ones do.

use crate::container::Resolver;
use crate::error::{DiError, Result};
use crate::key::ServiceKey;
use crate::provider::{Injectable, Lifetime};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// Type-erased instance as stored in the caches.
pub(crate) type Erased = Arc<dyn Any + Send + Sync>;

/// Zero-argument factory; self-sufficient, receives no injection.
pub(crate) type FactoryFn = Arc<dyn Fn() -> Erased + Send + Sync>;

/// Resolver-aware constructor; resolves collaborators through the handle.
pub(crate) type ConstructorFn = Arc<dyn Fn(&Resolver<'_>) -> Result<Erased> + Send + Sync>;

/// Per-instance cleanup hook captured at registration time.
pub(crate) type DisposerFn =
    Arc<dyn Fn(&Erased) -> std::result::Result<(), DisposeError> + Send + Sync>;

/// Error type disposers may fail with.
pub type DisposeError = Box<dyn std::error::Error + Send + Sync>;

/// Cleanup capability for scoped instances.
///
/// A scoped registration built with [`RegistrationBuilder::disposable`] has
/// this invoked once when its owning scope is disposed. Failures are logged
/// per instance and never block disposal of sibling instances.
pub trait Disposable: Send + Sync {
    /// Release whatever the instance holds.
    fn dispose(&self) -> std::result::Result<(), DisposeError>;
}

/// Wrap a typed instance for storage.
#[inline]
pub(crate) fn erase<T: ?Sized + Injectable>(instance: Arc<T>) -> Erased {
    Arc::new(instance)
}

/// Recover the typed instance from storage.
#[inline]
pub(crate) fn downcast<T: ?Sized + Injectable>(erased: &Erased, key: &ServiceKey) -> Result<Arc<T>> {
    erased
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(|| DiError::Internal(format!("stored instance does not match contract {key}")))
}

/// How the instance gets built.
pub(crate) enum Provider {
    /// Zero-argument factory
    Factory(FactoryFn),
    /// Constructor resolving collaborators through the container
    Constructor(ConstructorFn),
}

/// Immutable description of how to build one instance.
///
/// Created through [`Registration::of`]; stored in the container's registry
/// under its [`ServiceKey`], last write wins.
///
/// # Examples
///
/// ```rust
/// use wirecell::{Container, Registration};
///
/// struct Database {
///     url: String,
/// }
///
/// let reg = Registration::of::<Database>()
///     .singleton()
///     .named("primary")
///     .factory(|| Database { url: "postgres://localhost".into() })
///     .build()
///     .unwrap();
///
/// let container = Container::new();
/// container.register(reg);
/// assert!(container.is_registered_named::<Database>("primary"));
/// ```
pub struct Registration {
    key: ServiceKey,
    lifetime: Lifetime,
    provider: Provider,
    disposer: Option<DisposerFn>,
}

impl Registration {
    /// Start describing a registration for contract `T`.
    #[inline]
    pub fn of<T: ?Sized + Injectable>() -> RegistrationBuilder<T> {
        RegistrationBuilder {
            lifetime: Lifetime::default(),
            name: None,
            factory: None,
            constructor: None,
            disposer: None,
            _contract: PhantomData,
        }
    }

    pub(crate) fn from_parts(
        key: ServiceKey,
        lifetime: Lifetime,
        provider: Provider,
        disposer: Option<DisposerFn>,
    ) -> Self {
        Self {
            key,
            lifetime,
            provider,
            disposer,
        }
    }

    pub(crate) fn with_factory<T, F>(key: ServiceKey, lifetime: Lifetime, factory: F) -> Self
    where
        T: Injectable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::from_parts(
            key,
            lifetime,
            Provider::Factory(Arc::new(move || erase(Arc::new(factory())))),
            None,
        )
    }

    pub(crate) fn with_factory_arc<T, F>(key: ServiceKey, lifetime: Lifetime, factory: F) -> Self
    where
        T: ?Sized + Injectable,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        Self::from_parts(
            key,
            lifetime,
            Provider::Factory(Arc::new(move || erase(factory()))),
            None,
        )
    }

    pub(crate) fn with_constructor<T, F>(key: ServiceKey, lifetime: Lifetime, ctor: F) -> Self
    where
        T: Injectable,
        F: Fn(&Resolver<'_>) -> Result<T> + Send + Sync + 'static,
    {
        Self::from_parts(
            key,
            lifetime,
            Provider::Constructor(Arc::new(move |resolver: &Resolver<'_>| {
                Ok(erase(Arc::new(ctor(resolver)?)))
            })),
            None,
        )
    }

    pub(crate) fn with_constructor_arc<T, F>(key: ServiceKey, lifetime: Lifetime, ctor: F) -> Self
    where
        T: ?Sized + Injectable,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        Self::from_parts(
            key,
            lifetime,
            Provider::Constructor(Arc::new(move |resolver: &Resolver<'_>| {
                Ok(erase(ctor(resolver)?))
            })),
            None,
        )
    }

    /// The contract identity this registration is stored under.
    #[inline]
    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    /// The registration's lifetime policy.
    #[inline]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Whether a cleanup hook was attached.
    #[inline]
    pub fn has_disposer(&self) -> bool {
        self.disposer.is_some()
    }

    #[inline]
    pub(crate) fn disposer(&self) -> Option<DisposerFn> {
        self.disposer.clone()
    }

    /// Build one instance.
    ///
    /// Factories run with no arguments; constructors receive the resolver
    /// handle and may recursively resolve collaborators through it.
    pub(crate) fn instantiate(&self, resolver: &Resolver<'_>) -> Result<Erased> {
        #[cfg(feature = "logging")]
        trace!(
            target: "wirecell",
            service = self.key.type_name(),
            lifetime = %self.lifetime,
            "Creating instance"
        );

        match &self.provider {
            Provider::Factory(factory) => Ok(factory()),
            Provider::Constructor(ctor) => ctor(resolver),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("has_disposer", &self.disposer.is_some())
            .finish()
    }
}

/// Fluent description of a [`Registration`].
///
/// Exactly one of [`factory`](Self::factory) /
/// [`constructor`](Self::constructor) (or their `_arc` forms) must be
/// supplied; [`build`](Self::build) fails with
/// [`DiError::InvalidRegistration`] otherwise.
pub struct RegistrationBuilder<T: ?Sized> {
    lifetime: Lifetime,
    name: Option<Arc<str>>,
    factory: Option<FactoryFn>,
    constructor: Option<ConstructorFn>,
    disposer: Option<DisposerFn>,
    _contract: PhantomData<*const T>,
}

impl<T: ?Sized + Injectable> RegistrationBuilder<T> {
    /// Set the lifetime policy.
    #[inline]
    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// New instance per resolve (the default).
    #[inline]
    pub fn transient(self) -> Self {
        self.lifetime(Lifetime::Transient)
    }

    /// One instance per container.
    #[inline]
    pub fn singleton(self) -> Self {
        self.lifetime(Lifetime::Singleton)
    }

    /// One instance per scope.
    #[inline]
    pub fn scoped(self) -> Self {
        self.lifetime(Lifetime::Scoped)
    }

    /// Register under a name, independent of the unnamed slot.
    #[inline]
    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Supply a zero-argument factory.
    ///
    /// Factories are self-sufficient: they receive no injection.
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        T: Sized,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(move || erase(Arc::new(factory()))));
        self
    }

    /// Supply a zero-argument factory producing an `Arc` directly.
    ///
    /// This is the factory form for trait-object contracts.
    pub fn factory_arc<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(move || erase(factory())));
        self
    }

    /// Supply a constructor that resolves collaborators through the handle.
    pub fn constructor<F>(mut self, ctor: F) -> Self
    where
        T: Sized,
        F: Fn(&Resolver<'_>) -> Result<T> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(move |resolver: &Resolver<'_>| {
            Ok(erase(Arc::new(ctor(resolver)?)))
        }));
        self
    }

    /// Constructor form for trait-object contracts.
    pub fn constructor_arc<F>(mut self, ctor: F) -> Self
    where
        F: Fn(&Resolver<'_>) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(move |resolver: &Resolver<'_>| {
            Ok(erase(ctor(resolver)?))
        }));
        self
    }

    /// Attach the contract's [`Disposable`] impl as the cleanup hook.
    pub fn disposable(mut self) -> Self
    where
        T: Disposable,
    {
        self.disposer = Some(Arc::new(|erased: &Erased| {
            match erased.downcast_ref::<Arc<T>>() {
                Some(instance) => instance.dispose(),
                None => Ok(()),
            }
        }));
        self
    }

    /// Validate and produce the [`Registration`].
    pub fn build(self) -> Result<Registration> {
        let key = ServiceKey::maybe_named::<T>(self.name.as_deref());

        let provider = match (self.factory, self.constructor) {
            (Some(factory), None) => Provider::Factory(factory),
            (None, Some(ctor)) => Provider::Constructor(ctor),
            (None, None) => {
                return Err(DiError::InvalidRegistration {
                    key,
                    reason: "neither a factory nor a constructor was supplied",
                });
            }
            (Some(_), Some(_)) => {
                return Err(DiError::InvalidRegistration {
                    key,
                    reason: "both a factory and a constructor were supplied",
                });
            }
        };

        Ok(Registration::from_parts(
            key,
            self.lifetime,
            provider,
            self.disposer,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget {
        id: u32,
    }

    impl Disposable for Widget {
        fn dispose(&self) -> std::result::Result<(), DisposeError> {
            Ok(())
        }
    }

    #[test]
    fn builder_requires_a_provider() {
        let err = Registration::of::<Widget>().build().unwrap_err();
        assert!(matches!(err, DiError::InvalidRegistration { .. }));
    }

    #[test]
    fn builder_rejects_two_providers() {
        let err = Registration::of::<Widget>()
            .factory(|| Widget { id: 1 })
            .constructor(|_| Ok(Widget { id: 2 }))
            .build()
            .unwrap_err();
        assert!(matches!(err, DiError::InvalidRegistration { .. }));
    }

    #[test]
    fn builder_defaults_to_transient() {
        let reg = Registration::of::<Widget>()
            .factory(|| Widget { id: 1 })
            .build()
            .unwrap();
        assert_eq!(reg.lifetime(), Lifetime::Transient);
        assert!(!reg.has_disposer());
    }

    #[test]
    fn builder_records_name_and_disposer() {
        let reg = Registration::of::<Widget>()
            .scoped()
            .named("gadget")
            .factory(|| Widget { id: 7 })
            .disposable()
            .build()
            .unwrap();
        assert_eq!(reg.key().name(), Some("gadget"));
        assert_eq!(reg.lifetime(), Lifetime::Scoped);
        assert!(reg.has_disposer());
    }

    #[test]
    fn erase_round_trips() {
        let key = ServiceKey::of::<Widget>();
        let erased = erase(Arc::new(Widget { id: 9 }));
        let widget = downcast::<Widget>(&erased, &key).unwrap();
        assert_eq!(widget.id, 9);
    }

    #[test]
    fn downcast_mismatch_is_internal_error() {
        let key = ServiceKey::of::<String>();
        let erased = erase(Arc::new(Widget { id: 9 }));
        let err = downcast::<String>(&erased, &key).unwrap_err();
        assert!(matches!(err, DiError::Internal(_)));
    }
}
