//! The service container
//!
//! The `Container` owns the registry and the singleton cache, and is the
//! entry point for registration and resolution. Cloning a container is cheap
//! and yields a handle to the same underlying state.

use crate::cycle::CycleGuard;
use crate::error::Result;
use crate::key::ServiceKey;
use crate::provider::{Injectable, Lifetime, ServiceDef};
use crate::registration::{downcast, Erased, Registration};
use crate::registry::Registry;
use crate::scope::Scope;
use ahash::RandomState;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::any::TypeId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::debug;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// Thread-safe service container.
///
/// Registers contracts to providers under one of three lifetimes and
/// resolves instances with constructor injection. Contracts are concrete
/// types or `Send + Sync` trait objects.
///
/// # Examples
///
/// ```rust
/// use wirecell::Container;
///
/// struct Database {
///     url: String,
/// }
///
/// let container = Container::new();
/// container.singleton(|| Database { url: "postgres://localhost".into() });
///
/// let db = container.resolve::<Database>().unwrap();
/// assert_eq!(db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct Container {
    registry: Arc<Registry>,
    /// Lazily-populated singleton instances, one cell per key
    singletons: Arc<DashMap<ServiceKey, Arc<OnceCell<Erased>>, RandomState>>,
    /// Distinguishes this container's entries on the resolution stack
    id: u64,
}

impl Container {
    /// Create a new, empty container.
    #[inline]
    pub fn new() -> Self {
        let id = NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "logging")]
        debug!(
            target: "wirecell",
            container_id = id,
            "Creating new container"
        );

        Self {
            registry: Arc::new(Registry::new()),
            singletons: Arc::new(DashMap::with_hasher(RandomState::new())),
            id,
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Store a registration; last write for a key wins.
    ///
    /// A cached singleton for the same key is discarded so the new
    /// registration takes effect on the next resolve.
    pub fn register(&self, registration: Registration) {
        #[cfg(feature = "logging")]
        debug!(
            target: "wirecell",
            service = registration.key().type_name(),
            name = registration.key().name(),
            lifetime = %registration.lifetime(),
            container_id = self.id,
            "Registering service"
        );

        self.singletons.remove(registration.key());
        self.registry.insert(registration);
    }

    /// Register a transient factory: a new instance on every resolve.
    #[inline]
    pub fn transient<T, F>(&self, factory: F)
    where
        T: Injectable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register(Registration::with_factory(
            ServiceKey::of::<T>(),
            Lifetime::Transient,
            factory,
        ));
    }

    /// Register a singleton factory: constructed once, on first resolve.
    #[inline]
    pub fn singleton<T, F>(&self, factory: F)
    where
        T: Injectable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register(Registration::with_factory(
            ServiceKey::of::<T>(),
            Lifetime::Singleton,
            factory,
        ));
    }

    /// Register a scoped factory: one instance per [`Scope`].
    #[inline]
    pub fn scoped<T, F>(&self, factory: F)
    where
        T: Injectable,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register(Registration::with_factory(
            ServiceKey::of::<T>(),
            Lifetime::Scoped,
            factory,
        ));
    }

    /// Register a transient constructor with injected collaborators.
    ///
    /// ```rust
    /// use wirecell::Container;
    ///
    /// struct Repo;
    /// struct Service {
    ///     repo: std::sync::Arc<Repo>,
    /// }
    ///
    /// let container = Container::new();
    /// container.transient(|| Repo);
    /// container.transient_with(|r| {
    ///     Ok(Service {
    ///         repo: r.resolve()?,
    ///     })
    /// });
    ///
    /// assert!(container.resolve::<Service>().is_ok());
    /// ```
    #[inline]
    pub fn transient_with<T, F>(&self, ctor: F)
    where
        T: Injectable,
        F: Fn(&Resolver<'_>) -> Result<T> + Send + Sync + 'static,
    {
        self.register(Registration::with_constructor(
            ServiceKey::of::<T>(),
            Lifetime::Transient,
            ctor,
        ));
    }

    /// Register a singleton constructor with injected collaborators.
    #[inline]
    pub fn singleton_with<T, F>(&self, ctor: F)
    where
        T: Injectable,
        F: Fn(&Resolver<'_>) -> Result<T> + Send + Sync + 'static,
    {
        self.register(Registration::with_constructor(
            ServiceKey::of::<T>(),
            Lifetime::Singleton,
            ctor,
        ));
    }

    /// Register a scoped constructor with injected collaborators.
    #[inline]
    pub fn scoped_with<T, F>(&self, ctor: F)
    where
        T: Injectable,
        F: Fn(&Resolver<'_>) -> Result<T> + Send + Sync + 'static,
    {
        self.register(Registration::with_constructor(
            ServiceKey::of::<T>(),
            Lifetime::Scoped,
            ctor,
        ));
    }

    /// Register a transient factory for a trait-object contract.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use wirecell::Container;
    ///
    /// trait Greeter: Send + Sync {
    ///     fn greet(&self) -> String;
    /// }
    ///
    /// struct English;
    /// impl Greeter for English {
    ///     fn greet(&self) -> String {
    ///         "hello".into()
    ///     }
    /// }
    ///
    /// let container = Container::new();
    /// container.transient_trait::<dyn Greeter, _>(|| Arc::new(English));
    ///
    /// let greeter = container.resolve::<dyn Greeter>().unwrap();
    /// assert_eq!(greeter.greet(), "hello");
    /// ```
    #[inline]
    pub fn transient_trait<T, F>(&self, factory: F)
    where
        T: ?Sized + Injectable,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.register(Registration::with_factory_arc(
            ServiceKey::of::<T>(),
            Lifetime::Transient,
            factory,
        ));
    }

    /// Register a singleton factory for a trait-object contract.
    #[inline]
    pub fn singleton_trait<T, F>(&self, factory: F)
    where
        T: ?Sized + Injectable,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.register(Registration::with_factory_arc(
            ServiceKey::of::<T>(),
            Lifetime::Singleton,
            factory,
        ));
    }

    /// Register a scoped factory for a trait-object contract.
    #[inline]
    pub fn scoped_trait<T, F>(&self, factory: F)
    where
        T: ?Sized + Injectable,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.register(Registration::with_factory_arc(
            ServiceKey::of::<T>(),
            Lifetime::Scoped,
            factory,
        ));
    }

    /// Register a transient constructor for a trait-object contract.
    #[inline]
    pub fn transient_trait_with<T, F>(&self, ctor: F)
    where
        T: ?Sized + Injectable,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        self.register(Registration::with_constructor_arc(
            ServiceKey::of::<T>(),
            Lifetime::Transient,
            ctor,
        ));
    }

    /// Register a singleton constructor for a trait-object contract.
    #[inline]
    pub fn singleton_trait_with<T, F>(&self, ctor: F)
    where
        T: ?Sized + Injectable,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        self.register(Registration::with_constructor_arc(
            ServiceKey::of::<T>(),
            Lifetime::Singleton,
            ctor,
        ));
    }

    /// Register a scoped constructor for a trait-object contract.
    #[inline]
    pub fn scoped_trait_with<T, F>(&self, ctor: F)
    where
        T: ?Sized + Injectable,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        self.register(Registration::with_constructor_arc(
            ServiceKey::of::<T>(),
            Lifetime::Scoped,
            ctor,
        ));
    }

    /// Apply a bootstrap table of service definitions.
    pub fn install(&self, defs: &[ServiceDef]) {
        for def in defs {
            (def.register)(self);
        }

        #[cfg(feature = "logging")]
        debug!(
            target: "wirecell",
            container_id = self.id,
            services_installed = defs.len(),
            "Installed service definitions"
        );
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve an instance of contract `T`.
    ///
    /// Returns `Arc<T>` for zero-copy sharing. Singleton contracts are
    /// constructed at most once across all threads; a slow singleton
    /// construction blocks only resolvers of the same key. A contract
    /// registered as scoped resolves here like a transient - use
    /// [`create_scope`](Self::create_scope) to get per-scope caching.
    #[inline]
    pub fn resolve<T: ?Sized + Injectable>(&self) -> Result<Arc<T>> {
        Resolver::root(self).resolve::<T>()
    }

    /// Resolve the variant of `T` registered under `name`.
    #[inline]
    pub fn resolve_named<T: ?Sized + Injectable>(&self, name: &str) -> Result<Arc<T>> {
        Resolver::root(self).resolve_named::<T>(name)
    }

    /// Resolve, returning `None` on any failure.
    #[inline]
    pub fn try_resolve<T: ?Sized + Injectable>(&self) -> Option<Arc<T>> {
        self.resolve::<T>().ok()
    }

    /// Named form of [`try_resolve`](Self::try_resolve).
    #[inline]
    pub fn try_resolve_named<T: ?Sized + Injectable>(&self, name: &str) -> Option<Arc<T>> {
        self.resolve_named::<T>(name).ok()
    }

    /// Resolve a key to a type-erased instance.
    ///
    /// This is the single construction path: registry lookup, cycle guard,
    /// then the lifetime branch. The guard is dropped on every exit, so the
    /// resolution stack is restored on success and failure alike.
    pub(crate) fn resolve_erased(
        &self,
        key: &ServiceKey,
        resolver: &Resolver<'_>,
    ) -> Result<Erased> {
        let registration = match self.registry.get(key) {
            Ok(registration) => registration,
            Err(err) => {
                #[cfg(feature = "logging")]
                debug!(
                    target: "wirecell",
                    service = key.type_name(),
                    name = key.name(),
                    container_id = self.id,
                    "Service not registered"
                );
                return Err(err);
            }
        };

        let _guard = CycleGuard::enter(self.id, key)?;

        match registration.lifetime() {
            Lifetime::Singleton => {
                let cell = self.singleton_cell(key);
                cell.get_or_try_init(|| registration.instantiate(resolver))
                    .cloned()
            }
            // Scoped without an active scope resolves like a transient.
            Lifetime::Transient | Lifetime::Scoped => registration.instantiate(resolver),
        }
    }

    /// Fetch (or create) the singleton cell for a key.
    ///
    /// The cell is cloned out so no map guard is held while a provider runs;
    /// recursive resolutions re-enter the map freely.
    fn singleton_cell(&self, key: &ServiceKey) -> Arc<OnceCell<Erased>> {
        self.singletons
            .entry(key.clone())
            .or_default()
            .clone()
    }

    // =========================================================================
    // Probes and introspection
    // =========================================================================

    /// Whether an unnamed registration exists for `T`.
    #[inline]
    pub fn is_registered<T: ?Sized + Injectable>(&self) -> bool {
        self.registry.contains(&ServiceKey::of::<T>())
    }

    /// Whether a registration exists for `T` under `name`.
    #[inline]
    pub fn is_registered_named<T: ?Sized + Injectable>(&self, name: &str) -> bool {
        self.registry.contains(&ServiceKey::named::<T>(name))
    }

    /// Every name-variant registered for contract `T`.
    pub fn registrations_of<T: ?Sized + 'static>(&self) -> Vec<Arc<Registration>> {
        self.registry.get_all(TypeId::of::<T>())
    }

    /// Number of registrations.
    #[inline]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether the container holds no registrations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    // =========================================================================
    // Scopes and lifecycle
    // =========================================================================

    /// Open a new scope bound to this container.
    #[inline]
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.clone())
    }

    /// Run a closure against a fresh scope; the scope is disposed when the
    /// closure exits, normally or by unwinding.
    pub fn with_scope<R>(&self, f: impl FnOnce(&Scope) -> R) -> R {
        let scope = self.create_scope();
        f(&scope)
    }

    /// Drop every registration and cached singleton.
    pub fn clear(&self) {
        let count = self.registry.len();
        self.registry.clear();
        self.singletons.clear();

        #[cfg(feature = "logging")]
        debug!(
            target: "wirecell",
            container_id = self.id,
            services_removed = count,
            "Container cleared"
        );
        #[cfg(not(feature = "logging"))]
        let _ = count;
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("service_count", &self.len())
            .field("cached_singletons", &self.singletons.len())
            .finish()
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolution handle passed to constructors.
///
/// Carries the resolving container and, when resolution started inside a
/// [`Scope`], that scope - so nested scoped collaborators land in the same
/// scope cache. Constructors use it to pull their declared collaborators:
///
/// ```rust
/// use std::sync::Arc;
/// use wirecell::Container;
///
/// struct Config {
///     retries: u32,
/// }
///
/// struct Client {
///     config: Arc<Config>,
/// }
///
/// let container = Container::new();
/// container.transient_with(|r| {
///     Ok(Client {
///         // unregistered Config falls back to the supplied default
///         config: r.resolve_or(Config { retries: 3 })?,
///     })
/// });
///
/// let client = container.resolve::<Client>().unwrap();
/// assert_eq!(client.config.retries, 3);
/// ```
pub struct Resolver<'a> {
    container: &'a Container,
    scope: Option<&'a Scope>,
}

impl<'a> Resolver<'a> {
    #[inline]
    pub(crate) fn root(container: &'a Container) -> Self {
        Self {
            container,
            scope: None,
        }
    }

    #[inline]
    pub(crate) fn scoped(container: &'a Container, scope: &'a Scope) -> Self {
        Self {
            container,
            scope: Some(scope),
        }
    }

    /// Resolve an instance of contract `T`.
    pub fn resolve<T: ?Sized + Injectable>(&self) -> Result<Arc<T>> {
        let key = ServiceKey::of::<T>();
        let erased = self.resolve_key(&key)?;
        downcast::<T>(&erased, &key)
    }

    /// Resolve the variant of `T` registered under `name`.
    pub fn resolve_named<T: ?Sized + Injectable>(&self, name: &str) -> Result<Arc<T>> {
        let key = ServiceKey::named::<T>(name);
        let erased = self.resolve_key(&key)?;
        downcast::<T>(&erased, &key)
    }

    /// Resolve `T`, falling back to `default` only when `T` is unregistered.
    ///
    /// Every other failure - a cycle, a failing nested constructor -
    /// propagates untouched.
    #[inline]
    pub fn resolve_or<T: Injectable>(&self, default: T) -> Result<Arc<T>> {
        self.resolve_or_else(move || default)
    }

    /// Lazy form of [`resolve_or`](Self::resolve_or).
    pub fn resolve_or_else<T: Injectable, F: FnOnce() -> T>(&self, default: F) -> Result<Arc<T>> {
        match self.resolve::<T>() {
            Err(err) if err.is_not_registered() => Ok(Arc::new(default())),
            other => other,
        }
    }

    /// [`resolve_or`](Self::resolve_or) with `T::default()`.
    #[inline]
    pub fn resolve_or_default<T: Injectable + Default>(&self) -> Result<Arc<T>> {
        self.resolve_or_else(T::default)
    }

    /// Whether an unnamed registration exists for `T`.
    #[inline]
    pub fn is_registered<T: ?Sized + Injectable>(&self) -> bool {
        self.container.is_registered::<T>()
    }

    /// The container this handle resolves against.
    #[inline]
    pub fn container(&self) -> &Container {
        self.container
    }

    fn resolve_key(&self, key: &ServiceKey) -> Result<Erased> {
        match self.scope {
            Some(scope) => scope.resolve_erased(key, self),
            None => self.container.resolve_erased(key, self),
        }
    }
}
