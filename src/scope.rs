//! Scopes: bounded resolution contexts
//!
//! A [`Scope`] caches scoped-lifetime instances and disposes them when the
//! scope ends. Dropping a scope disposes it, so cleanup runs on normal and
//! unwinding exits alike.

use crate::container::{Container, Resolver};
use crate::cycle::CycleGuard;
use crate::error::{DiError, Result};
use crate::key::ServiceKey;
use crate::provider::{Injectable, Lifetime};
use crate::registration::{DisposerFn, Erased};
use ahash::RandomState;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// One cached scoped instance: a lazily-filled cell plus the cleanup hook
/// captured from the registration when the slot was created.
struct ScopedSlot {
    cell: OnceCell<Erased>,
    disposer: Option<DisposerFn>,
}

struct ScopeState {
    slots: HashMap<ServiceKey, Arc<ScopedSlot>, RandomState>,
    disposed: bool,
}

/// A bounded resolution context with its own instance cache.
///
/// Created by [`Container::create_scope`]. Scoped-lifetime contracts are
/// constructed at most once per scope per key; other lifetimes delegate to
/// the owning container. [`dispose`](Self::dispose) is idempotent and runs
/// automatically on drop.
///
/// # Examples
///
/// ```rust
/// use wirecell::Container;
///
/// struct Session {
///     user: String,
/// }
///
/// let container = Container::new();
/// container.scoped(|| Session { user: "anna".into() });
///
/// let scope = container.create_scope();
/// let a = scope.resolve::<Session>().unwrap();
/// let b = scope.resolve::<Session>().unwrap();
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
///
/// scope.dispose();
/// assert!(scope.resolve::<Session>().is_err());
/// ```
pub struct Scope {
    container: Container,
    id: u64,
    state: Mutex<ScopeState>,
}

impl Scope {
    pub(crate) fn new(container: Container) -> Self {
        let id = NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "logging")]
        debug!(
            target: "wirecell",
            scope_id = id,
            container_id = container.id(),
            "Creating scope"
        );

        Self {
            container,
            id,
            state: Mutex::new(ScopeState {
                slots: HashMap::with_hasher(RandomState::new()),
                disposed: false,
            }),
        }
    }

    /// Unique identifier of this scope.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The container this scope resolves against.
    #[inline]
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Resolve an instance of contract `T` within this scope.
    #[inline]
    pub fn resolve<T: ?Sized + Injectable>(&self) -> Result<Arc<T>> {
        Resolver::scoped(&self.container, self).resolve::<T>()
    }

    /// Resolve the variant of `T` registered under `name` within this scope.
    #[inline]
    pub fn resolve_named<T: ?Sized + Injectable>(&self, name: &str) -> Result<Arc<T>> {
        Resolver::scoped(&self.container, self).resolve_named::<T>(name)
    }

    /// Resolve, returning `None` on any failure.
    #[inline]
    pub fn try_resolve<T: ?Sized + Injectable>(&self) -> Option<Arc<T>> {
        self.resolve::<T>().ok()
    }

    /// Whether this scope has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .disposed
    }

    /// Resolve a key within this scope.
    ///
    /// Scoped-lifetime contracts memoize in the slot map; everything else
    /// delegates to the container with the scope kept on the resolver, so
    /// nested scoped collaborators still land here.
    pub(crate) fn resolve_erased(
        &self,
        key: &ServiceKey,
        resolver: &Resolver<'_>,
    ) -> Result<Erased> {
        let registration = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.disposed {
                return Err(DiError::ScopeDisposed);
            }
            self.container.registry().get(key)?
        };

        if registration.lifetime() != Lifetime::Scoped {
            return self.container.resolve_erased(key, resolver);
        }

        let slot = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.disposed {
                return Err(DiError::ScopeDisposed);
            }
            Arc::clone(state.slots.entry(key.clone()).or_insert_with(|| {
                Arc::new(ScopedSlot {
                    cell: OnceCell::new(),
                    disposer: registration.disposer(),
                })
            }))
        };

        let _guard = CycleGuard::enter(self.container.id(), key)?;
        slot.cell
            .get_or_try_init(|| registration.instantiate(resolver))
            .cloned()
    }

    /// Dispose every cached instance and mark the scope disposed.
    ///
    /// Idempotent: the second and later calls are no-ops. Each instance's
    /// cleanup hook runs at most once; a failing hook is logged and never
    /// blocks disposal of the remaining instances.
    pub fn dispose(&self) {
        let slots: Vec<(ServiceKey, Arc<ScopedSlot>)> = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.slots.drain().collect()
        };

        #[cfg(feature = "logging")]
        debug!(
            target: "wirecell",
            scope_id = self.id,
            instances = slots.len(),
            "Disposing scope"
        );

        for (key, slot) in slots {
            let (Some(instance), Some(disposer)) = (slot.cell.get(), slot.disposer.as_ref())
            else {
                continue;
            };
            if let Err(err) = disposer(instance) {
                #[cfg(feature = "logging")]
                warn!(
                    target: "wirecell",
                    scope_id = self.id,
                    service = key.type_name(),
                    error = %err,
                    "Scoped instance cleanup failed"
                );
                #[cfg(not(feature = "logging"))]
                let _ = (&key, err);
            }
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
