//! Public macros for ergonomic registration and resolution.

/// Resolves a service from the process-wide container, panicking if absent.
///
/// This is the assert-it-is-wired form: use it where a missing registration
/// is a programming error. For a fallible version call
/// [`global()`](crate::global)`.resolve(...)` directly.
///
/// # Panics
///
/// Panics if the service cannot be resolved.
///
/// # Examples
///
/// ```
/// use wirecell::{global, resolve};
///
/// global().singleton(|| String::from("hello"));
///
/// let message = resolve!(String);
/// assert_eq!(*message, "hello");
/// ```
///
/// ```
/// use std::sync::Arc;
/// use wirecell::{global, resolve};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "Hello!".to_string()
///     }
/// }
///
/// global().singleton_trait::<dyn Greeter, _>(|| Arc::new(English));
///
/// let greeter = resolve!(trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
    // Concrete type: resolve!(MyService)
    ($type:ty) => {
        $crate::global().resolve::<$type>().unwrap_or_else(|err| {
            panic!(
                "failed to resolve required service {}: {}",
                ::std::any::type_name::<$type>(),
                err
            )
        })
    };

    // Named concrete type: resolve!(MyService, "name")
    ($type:ty, $name:expr) => {
        $crate::global()
            .resolve_named::<$type>($name)
            .unwrap_or_else(|err| {
                panic!(
                    "failed to resolve required service {} (name: {}): {}",
                    ::std::any::type_name::<$type>(),
                    $name,
                    err
                )
            })
    };

    // Trait object: resolve!(trait MyTrait)
    // `:ident` captures the trait's name so `dyn Trait` can be formed here.
    (trait $trait_ident:ident) => {
        $crate::global()
            .resolve::<dyn $trait_ident>()
            .unwrap_or_else(|err| {
                panic!(
                    "failed to resolve required service {}: {}",
                    ::std::any::type_name::<dyn $trait_ident>(),
                    err
                )
            })
    };

    // Named trait object: resolve!(trait MyTrait, "name")
    (trait $trait_ident:ident, $name:expr) => {
        $crate::global()
            .resolve_named::<dyn $trait_ident>($name)
            .unwrap_or_else(|err| {
                panic!(
                    "failed to resolve required service {} (name: {}): {}",
                    ::std::any::type_name::<dyn $trait_ident>(),
                    $name,
                    err
                )
            })
    };
}

/// Builds one [`ServiceDef`](crate::ServiceDef) bootstrap entry, with one
/// arm per lifetime.
///
/// # Examples
///
/// ```
/// use wirecell::{service_def, Container, ServiceDef};
///
/// #[derive(Default)]
/// struct Config;
/// struct Job;
///
/// static SERVICES: &[ServiceDef] = &[
///     service_def!(singleton Config, Config::default),
///     service_def!(transient Job, || Job),
/// ];
///
/// let container = Container::new();
/// container.install(SERVICES);
/// assert_eq!(container.len(), 2);
/// ```
#[macro_export]
macro_rules! service_def {
    (singleton $type:ty, $factory:expr) => {
        $crate::ServiceDef {
            type_name: stringify!($type),
            register: |container: &$crate::Container| {
                container.singleton::<$type, _>($factory);
            },
        }
    };
    (scoped $type:ty, $factory:expr) => {
        $crate::ServiceDef {
            type_name: stringify!($type),
            register: |container: &$crate::Container| {
                container.scoped::<$type, _>($factory);
            },
        }
    };
    (transient $type:ty, $factory:expr) => {
        $crate::ServiceDef {
            type_name: stringify!($type),
            register: |container: &$crate::Container| {
                container.transient::<$type, _>($factory);
            },
        }
    };
}
