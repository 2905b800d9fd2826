//! # The Container — heart of xwire
//!
//! Holds the frozen registry and the run settings, and drives entry
//! points: every [`Container::run`] gets its own [`Resolver`], so
//! resolved values never leak from one run into the next.
//!
//! # Architecture
//! ```text
//! ContainerBuilder  ──build()──>  Container
//!                                    │
//!                                 run(entrypoint)
//!                                    │
//!                                    ▼
//!                           Resolver (one per run)
//! ```
//!
//! # Examples
//! ```rust
//! use xwire_container::prelude::*;
//!
//! let container = Container::builder()
//!     .provider(Provider::value("db_string", String::from("sqlite:///prod.db")))
//!     .provider(Provider::new("users", ["db_string"], |_| {
//!         Ok(vec![String::from("from the database")])
//!     }))
//!     .provider(
//!         Provider::value("users", vec![String::from("u1"), String::from("u2")])
//!             .in_environment("fake_users"),
//!     )
//!     .environments("fake_users".parse().unwrap())
//!     .build()
//!     .expect("Failed to build container");
//!
//! let render = Entrypoint::new("render", ["users"], |deps| {
//!     let users = deps.get::<Vec<String>>("users")?;
//!     Ok::<_, WireError>(users.join(","))
//! });
//!
//! assert_eq!(container.run(&render).unwrap(), "u1,u2");
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::entrypoint::Entrypoint;
use crate::environment::{ActiveEnvironments, SelectionMode};
use crate::error::{Result, WireError};
use crate::graph::{Planner, ResolutionPlan};
use crate::provider::{Dependencies, Provider, ProviderModule, ProviderSink, Value};
use crate::registry::Registry;
use crate::resolver::Resolver;
use crate::settings::Settings;

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`] from provider registrations and run settings.
///
/// ```rust,ignore
/// let container = Container::builder()
///     .module(&RealStorage)
///     .module(&FakeData)
///     .environments(args.environments())
///     .validate_on_build(true)
///     .build()?;
/// ```
pub struct ContainerBuilder {
    registry: Registry,
    settings: Settings,
    validate: bool,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            registry: Registry::new(),
            settings: Settings::default(),
            validate: false,
        }
    }

    /// Starts from an existing registry.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Register a provider.
    pub fn provider(mut self, provider: Provider) -> Self {
        self.registry.register(provider);
        self
    }

    /// Add a [`ProviderModule`].
    pub fn module(mut self, module: &dyn ProviderModule) -> Self {
        self.registry.extend(module);
        self
    }

    /// Set the active environments.
    pub fn environments(mut self, environments: ActiveEnvironments) -> Self {
        self.settings.environments = environments;
        self
    }

    /// Set how ties between active environments are broken.
    pub fn selection(mut self, mode: SelectionMode) -> Self {
        self.settings.selection = mode;
        self
    }

    /// Replace all run settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Plan every active provider during [`build`](Self::build).
    ///
    /// Off by default: a broken provider that no run requests is not an
    /// error until something asks for it.
    pub fn validate_on_build(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Build the container.
    ///
    /// # Errors
    /// Only with [`validate_on_build`](Self::validate_on_build): any error
    /// the planner finds (unknown, circular or ambiguous dependencies).
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        info!(
            registered = self.registry.len(),
            environments = %self.settings.environments,
            selection = %self.settings.selection,
            "Building container"
        );

        let container = Container::from_registry(Arc::new(self.registry), self.settings);
        if self.validate {
            container.validate()?;
        }
        Ok(container)
    }
}

impl ProviderSink for ContainerBuilder {
    fn register(&mut self, provider: Provider) {
        self.registry.register(provider);
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Read-only registry plus run settings.
///
/// Cheap to clone; clones share the registry.
#[derive(Clone)]
pub struct Container {
    registry: Arc<Registry>,
    settings: Settings,
}

impl Container {
    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Wraps an already frozen registry.
    pub fn from_registry(registry: Arc<Registry>, settings: Settings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Starts a manual run. The run ends when the resolver is dropped.
    pub fn resolver(&self) -> Resolver<'_> {
        debug!("Starting manual run");
        Resolver::new(
            &self.registry,
            &self.settings.environments,
            self.settings.selection,
        )
    }

    /// Resolves a single name in a run of its own.
    pub fn resolve(&self, name: &str) -> Result<Value> {
        self.resolver().resolve(name)
    }

    /// Resolves a single name in a run of its own and downcasts it.
    pub fn resolve_as<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        let value = self.resolve(name)?;
        Dependencies::new(vec![(name.to_owned(), value)]).get::<T>(name)
    }

    /// Resolves every parameter of `entrypoint` and calls it.
    ///
    /// The run is all or nothing: the entry point is only called once
    /// every parameter has a value. Errors from the entry point itself
    /// are returned unchanged; resolution errors are converted with
    /// `E::from`. Run-scoped values are torn down after the entry point
    /// returns.
    #[instrument(
        skip(self, entrypoint),
        name = "run",
        fields(entrypoint = entrypoint.name())
    )]
    pub fn run<F, T, E>(&self, entrypoint: &Entrypoint<F>) -> std::result::Result<T, E>
    where
        F: Fn(&Dependencies) -> std::result::Result<T, E>,
        E: From<WireError>,
    {
        info!(
            parameters = ?entrypoint.parameters(),
            environments = %self.settings.environments,
            "Starting run"
        );

        let mut resolver = self.resolver();
        let mut values = Vec::with_capacity(entrypoint.parameters().len());
        for parameter in entrypoint.parameters() {
            values.push((parameter.clone(), resolver.resolve(parameter)?));
        }

        let args = Dependencies::new(values);
        let output = entrypoint.call(&args);
        drop(args);
        drop(resolver);

        info!(ok = output.is_ok(), "Run finished");
        output
    }

    /// Which provider each of `roots` and their dependencies would use.
    pub fn plan<I, S>(&self, roots: I) -> Result<ResolutionPlan>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Planner::new(
            &self.registry,
            &self.settings.environments,
            self.settings.selection,
        )
        .plan(roots)
    }

    /// Plans every provider available under the active environments.
    pub fn validate(&self) -> Result<ResolutionPlan> {
        Planner::new(
            &self.registry,
            &self.settings.environments,
            self.settings.selection,
        )
        .plan_all()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.registry.len())
            .field("environments", &self.settings.environments)
            .field("selection", &self.settings.selection)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder};
    pub use crate::entrypoint::Entrypoint;
    pub use crate::environment::{ActiveEnvironments, SelectionMode};
    pub use crate::error::{BoxError, Result, WireError};
    pub use crate::key::{MAIN_ENVIRONMENT, ProviderKey};
    pub use crate::provider::{Dependencies, Provider, ProviderModule, ProviderSink, Value};
    pub use crate::registry::Registry;
    pub use crate::resolver::Resolver;
    pub use crate::settings::Settings;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
