//! Core container implementation for xwire.
//!
//! Providers are registered under a logical name and an environment;
//! runs resolve names recursively, choosing one provider per name from
//! the active environments, and memoize each value for the run.

pub mod container;
pub mod entrypoint;
pub mod environment;
pub mod error;
pub mod global;
pub mod graph;
pub mod key;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod settings;

pub use container::{Container, ContainerBuilder, prelude};
pub use entrypoint::Entrypoint;
pub use environment::{ActiveEnvironments, SelectionMode};
pub use error::{BoxError, Result, WireError};
pub use global::Injectable;
pub use graph::{PlanStep, ResolutionPlan};
pub use key::{MAIN_ENVIRONMENT, ProviderKey};
pub use provider::{Dependencies, Provider, ProviderModule, ProviderSink, Value};
pub use registry::Registry;
pub use resolver::Resolver;
pub use settings::Settings;
