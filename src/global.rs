//! The process-wide container
//!
//! A lazily-created `Container` shared by the whole process, for
//! applications that want registration and resolution without threading a
//! container handle everywhere. Prefer constructing a root [`Container`] at
//! your entry point and passing it down; this module is the thin
//! convenience layer over that.

use crate::container::Container;
use crate::error::Result;
use crate::provider::Injectable;
use crate::scope::Scope;
use std::sync::{Arc, PoisonError, RwLock};

static GLOBAL: RwLock<Option<Arc<Container>>> = RwLock::new(None);

/// The process-wide container, created on first access.
///
/// Uses double-checked locking: the read path returns the existing instance,
/// and only the first caller takes the write lock to construct it.
///
/// # Examples
///
/// ```
/// use wirecell::global;
///
/// fn register_services() {
///     global().singleton(|| String::from("hello from global"));
/// }
/// ```
pub fn global() -> Arc<Container> {
    if let Some(container) = GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return Arc::clone(container);
    }

    let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    // re-check: another thread may have won the race
    if let Some(container) = slot.as_ref() {
        return Arc::clone(container);
    }
    let container = Arc::new(Container::new());
    *slot = Some(Arc::clone(&container));
    container
}

/// Drop the process-wide container reference.
///
/// The next [`global`] call builds a fresh container with no prior
/// registrations. Intended for test isolation; handles obtained earlier
/// keep working against the old instance.
pub fn reset_global() {
    let mut slot = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    *slot = None;
}

/// Run a closure against a fresh scope on the process-wide container.
///
/// The scope is disposed when the closure exits, normally or by unwinding.
pub fn scoped<R>(f: impl FnOnce(&Scope) -> R) -> R {
    global().with_scope(f)
}

/// Return `value` if supplied, otherwise resolve `T` from the process-wide
/// container.
///
/// This backs functions that accept an optional collaborator and inject it
/// only when the caller did not pass one:
///
/// ```
/// use std::sync::Arc;
/// use wirecell::{global, supplied_or};
///
/// struct Clock;
///
/// fn timestamp(clock: Option<Arc<Clock>>) -> wirecell::Result<()> {
///     let _clock = supplied_or(clock)?;
///     Ok(())
/// }
///
/// global().singleton(|| Clock);
/// assert!(timestamp(None).is_ok());
/// assert!(timestamp(Some(Arc::new(Clock))).is_ok());
/// ```
pub fn supplied_or<T: ?Sized + Injectable>(value: Option<Arc<T>>) -> Result<Arc<T>> {
    match value {
        Some(value) => Ok(value),
        None => global().resolve::<T>(),
    }
}
