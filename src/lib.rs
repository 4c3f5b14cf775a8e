//! # Wirecell - Service Container for Rust
//!
//! A thread-safe inversion-of-control runtime: register contracts to
//! providers, resolve instances with constructor injection, and let the
//! container manage lifetimes - including per-scope instances with
//! deterministic disposal and dependency-cycle detection with the full
//! offending chain.
//!
//! ## Features
//!
//! - **Three lifetimes** - transient (new instance per resolve), singleton
//!   (one per container, constructed at most once under concurrency), scoped
//!   (one per [`Scope`], disposed with it)
//! - **Constructor injection** - constructors receive a [`Resolver`] and pull
//!   their collaborators from it, with default fallbacks for optional ones
//! - **Trait-object contracts** - register `dyn Trait` against any
//!   implementation
//! - **Named variants** - the same contract under several names
//! - **Cycle detection** - a circular dependency fails immediately with the
//!   ordered chain instead of overflowing the stack
//! - **Observable** - optional `tracing` integration with JSON or pretty
//!   output
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use wirecell::Container;
//!
//! trait Repository: Send + Sync {
//!     fn load(&self) -> String;
//! }
//!
//! struct PgRepository;
//! impl Repository for PgRepository {
//!     fn load(&self) -> String {
//!         "row".into()
//!     }
//! }
//!
//! struct Service {
//!     repo: Arc<dyn Repository>,
//! }
//!
//! let container = Container::new();
//! container.transient_trait::<dyn Repository, _>(|| Arc::new(PgRepository));
//! container.transient_with(|r| {
//!     Ok(Service {
//!         repo: r.resolve()?,
//!     })
//! });
//!
//! let service = container.resolve::<Service>().unwrap();
//! assert_eq!(service.repo.load(), "row");
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use wirecell::Container;
//!
//! struct RequestContext {
//!     id: u64,
//! }
//!
//! let container = Container::new();
//! container.scoped(|| RequestContext { id: 7 });
//!
//! let scope = container.create_scope();
//! let a = scope.resolve::<RequestContext>().unwrap();
//! let b = scope.resolve::<RequestContext>().unwrap();
//! assert!(std::sync::Arc::ptr_eq(&a, &b));
//! // dropping the scope disposes its instances
//! ```
//!
//! ## Process-wide container
//!
//! ```rust
//! use wirecell::{global, resolve};
//!
//! #[derive(Default)]
//! struct Config {
//!     verbose: bool,
//! }
//!
//! global().singleton(Config::default);
//! let config = resolve!(Config);
//! assert!(!config.verbose);
//! ```

mod container;
mod cycle;
mod error;
mod global;
mod key;
#[cfg(feature = "logging")]
pub mod logging;
mod macros;
mod provider;
mod registration;
mod registry;
mod scope;

pub use container::{Container, Resolver};
pub use error::{DependencyChain, DiError, Result};
pub use global::{global, reset_global, scoped, supplied_or};
pub use key::ServiceKey;
pub use provider::{Injectable, Lifetime, ServiceDef};
pub use registration::{Disposable, DisposeError, Registration, RegistrationBuilder};
pub use registry::Registry;
pub use scope::Scope;

// Re-export tracing macros for convenience when logging is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Container, DiError, Disposable, Injectable, Lifetime, Registration, Resolver, Result,
        Scope, ServiceDef, ServiceKey,
    };
    pub use std::sync::Arc;
}
