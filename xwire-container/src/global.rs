//! Process-wide registry.
//!
//! Providers reach the global registry two ways: statically, through
//! [`Injectable`] entries submitted with `inventory` (this is what the
//! `#[injectable]` attribute generates), and imperatively, through
//! [`register`]. The first run freezes the registry; afterwards
//! registration fails with [`WireError::RegistryFrozen`] until
//! [`reset`] is called.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::container::Container;
use crate::entrypoint::Entrypoint;
use crate::error::{BoxError, Result, WireError};
use crate::key::ProviderKey;
use crate::provider::{Dependencies, Provider, ProviderModule, ProviderSink, Value};
use crate::registry::Registry;
use crate::settings::Settings;

/// A provider described by a static registration table entry.
///
/// Built by the `#[injectable]` attribute; every field is a constant so
/// the entry can be collected at link time.
pub struct Injectable {
    pub name: &'static str,
    pub environment: &'static str,
    pub dependencies: &'static [&'static str],
    pub output_type: fn() -> &'static str,
    pub factory: fn(&Dependencies) -> std::result::Result<Value, BoxError>,
}

inventory::collect!(Injectable);

impl Injectable {
    /// Converts the table entry into a provider record.
    pub fn to_provider(&self) -> Provider {
        let factory = self.factory;
        Provider::from_raw(
            ProviderKey::new(self.name, self.environment),
            self.dependencies.iter().map(|d| (*d).to_owned()).collect(),
            (self.output_type)(),
            Arc::new(factory),
        )
    }
}

/// A registry holding every statically registered provider.
///
/// Link order decides which of two entries for the same name and
/// environment wins.
pub fn static_registry() -> Registry {
    let mut registry = Registry::new();
    for entry in inventory::iter::<Injectable> {
        registry.register(entry.to_provider());
    }
    debug!(registered = registry.len(), "Loaded static registration table");
    registry
}

struct GlobalState {
    registry: Registry,
    frozen: Option<Arc<Registry>>,
}

impl GlobalState {
    fn fresh() -> Self {
        Self {
            registry: static_registry(),
            frozen: None,
        }
    }
}

impl ProviderSink for GlobalState {
    fn register(&mut self, provider: Provider) {
        self.registry.register(provider);
    }
}

static GLOBAL: Lazy<RwLock<GlobalState>> = Lazy::new(|| RwLock::new(GlobalState::fresh()));

/// Adds `provider` to the process-wide registry.
///
/// # Errors
/// [`WireError::RegistryFrozen`] once a run has started.
pub fn register(provider: Provider) -> Result<()> {
    let mut state = GLOBAL.write();
    if state.frozen.is_some() {
        return Err(WireError::RegistryFrozen);
    }
    state.registry.register(provider);
    Ok(())
}

/// Adds every provider of `module` to the process-wide registry.
///
/// # Errors
/// [`WireError::RegistryFrozen`] once a run has started.
pub fn register_module(module: &dyn ProviderModule) -> Result<()> {
    let mut state = GLOBAL.write();
    if state.frozen.is_some() {
        return Err(WireError::RegistryFrozen);
    }
    module.register(&mut *state);
    Ok(())
}

/// Ends the registration phase and returns the read-only registry.
///
/// Idempotent: later calls return the same registry.
pub fn freeze() -> Arc<Registry> {
    let mut state = GLOBAL.write();
    if let Some(frozen) = &state.frozen {
        return Arc::clone(frozen);
    }

    info!(registered = state.registry.len(), "Freezing global registry");
    let frozen = Arc::new(state.registry.clone());
    state.frozen = Some(Arc::clone(&frozen));
    frozen
}

/// Returns `true` once [`freeze`] was called.
pub fn is_frozen() -> bool {
    GLOBAL.read().frozen.is_some()
}

/// A copy of the registry as it stands.
pub fn snapshot() -> Registry {
    GLOBAL.read().registry.clone()
}

/// Drops imperative registrations, reloads the static table and unfreezes.
///
/// Meant for test isolation.
pub fn reset() {
    debug!("Resetting global registry");
    *GLOBAL.write() = GlobalState::fresh();
}

/// A container over the frozen global registry.
pub fn container(settings: Settings) -> Container {
    Container::from_registry(freeze(), settings)
}

/// Freezes the global registry and runs `entrypoint` against it.
pub fn run<F, T, E>(entrypoint: &Entrypoint<F>, settings: Settings) -> std::result::Result<T, E>
where
    F: Fn(&Dependencies) -> std::result::Result<T, E>,
    E: From<WireError>,
{
    container(settings).run(entrypoint)
}
