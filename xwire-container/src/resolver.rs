//! Per-run resolution engine.
//!
//! A [`Resolver`] owns the resolution cache of exactly one run. Each
//! logical name moves through `Unvisited → Resolving → Resolved | Failed`
//! at most once; a resolved name is never constructed twice within the
//! run, and every consumer receives the same `Arc`.
//!
//! Dropping the resolver ends the run: teardown hooks run in reverse
//! construction order, then the cached values are released in that same
//! order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};
use xwire_support::rendering::{render_chain, suggest_similar};

use crate::environment::{ActiveEnvironments, SelectionMode, select};
use crate::error::{CircularDependencyError, Result, WireError};
use crate::provider::{Dependencies, Provider, TeardownFn, Value};
use crate::registry::Registry;

pub(crate) const MAX_SUGGESTIONS: usize = 3;

enum Slot {
    Resolving,
    Resolved(Value),
    Failed,
}

struct Constructed {
    name: String,
    value: Value,
    teardown: Option<TeardownFn>,
}

/// Resolves logical names for a single run.
pub struct Resolver<'a> {
    registry: &'a Registry,
    environments: &'a ActiveEnvironments,
    mode: SelectionMode,
    slots: HashMap<String, Slot>,
    stack: Vec<String>,
    constructed: Vec<Constructed>,
}

impl<'a> Resolver<'a> {
    /// Starts a run over `registry` with a fresh cache.
    pub fn new(
        registry: &'a Registry,
        environments: &'a ActiveEnvironments,
        mode: SelectionMode,
    ) -> Self {
        Self {
            registry,
            environments,
            mode,
            slots: HashMap::new(),
            stack: Vec::new(),
            constructed: Vec::new(),
        }
    }

    /// Resolves `name`, constructing its dependencies first.
    ///
    /// # Errors
    /// - [`WireError::UnknownDependency`]: no active provider for a name
    /// - [`WireError::CircularDependency`]: `name` is already being resolved
    /// - [`WireError::AmbiguousEnvironment`]: strict mode tie
    /// - [`WireError::ProviderInvocation`]: a factory failed
    /// - [`WireError::PreviouslyFailed`]: `name` failed earlier in this run
    pub fn resolve(&mut self, name: &str) -> Result<Value> {
        match self.slots.get(name) {
            Some(Slot::Resolved(value)) => {
                trace!(name, "Cache hit");
                return Ok(Arc::clone(value));
            }
            Some(Slot::Resolving) => {
                let mut chain = self.stack.clone();
                chain.push(name.to_owned());
                warn!(cycle = %render_chain(&chain), "Circular dependency detected!");
                return Err(WireError::CircularDependency(CircularDependencyError { chain }));
            }
            Some(Slot::Failed) => {
                return Err(WireError::PreviouslyFailed {
                    name: name.to_owned(),
                });
            }
            None => {}
        }

        self.slots.insert(name.to_owned(), Slot::Resolving);
        self.stack.push(name.to_owned());
        let outcome = self.construct(name);
        self.stack.pop();

        let slot = match &outcome {
            Ok(value) => Slot::Resolved(Arc::clone(value)),
            Err(_) => Slot::Failed,
        };
        self.slots.insert(name.to_owned(), slot);
        outcome
    }

    /// Returns `true` if `name` was constructed during this run.
    pub fn is_resolved(&self, name: &str) -> bool {
        matches!(self.slots.get(name), Some(Slot::Resolved(_)))
    }

    /// Names constructed so far, in construction order.
    pub fn constructed(&self) -> impl Iterator<Item = &str> {
        self.constructed.iter().map(|c| c.name.as_str())
    }

    fn construct(&mut self, name: &str) -> Result<Value> {
        let registry = self.registry;
        let provider = select(name, registry.candidates(name), self.environments, self.mode)
            .map_err(|error| self.locate(error))?;

        debug!(
            key = %provider.key(),
            dependencies = ?provider.dependencies(),
            "Resolving provider"
        );

        let mut values = Vec::with_capacity(provider.dependencies().len());
        for dependency in provider.dependencies() {
            let value = self.resolve(dependency)?;
            values.push((dependency.clone(), value));
        }

        let value = self.invoke(provider, &Dependencies::new(values))?;
        self.constructed.push(Constructed {
            name: name.to_owned(),
            value: Arc::clone(&value),
            teardown: provider.teardown().cloned(),
        });
        Ok(value)
    }

    fn invoke(&self, provider: &Provider, deps: &Dependencies) -> Result<Value> {
        provider.invoke(deps).map_err(|source| {
            warn!(key = %provider.key(), error = %source, "Provider failed");
            WireError::ProviderInvocation {
                key: provider.key().clone(),
                chain: self.stack.clone(),
                source,
            }
        })
    }

    fn locate(&self, error: WireError) -> WireError {
        locate(self.registry, &self.stack, error)
    }
}

/// Attaches the resolution chain to a selection error.
///
/// Unknown names also get the requiring parent and up to
/// [`MAX_SUGGESTIONS`] registered names close to the requested one.
pub(crate) fn locate(registry: &Registry, chain: &[String], error: WireError) -> WireError {
    match error {
        WireError::UnknownDependency(mut inner) => {
            inner.chain = chain.to_vec();
            inner.required_by = chain
                .len()
                .checked_sub(2)
                .map(|parent| chain[parent].clone());
            let available: Vec<&str> = registry.names().collect();
            inner.suggestions = suggest_similar(&inner.requested, &available, MAX_SUGGESTIONS);
            WireError::UnknownDependency(inner)
        }
        WireError::AmbiguousEnvironment(mut inner) => {
            inner.chain = chain.to_vec();
            WireError::AmbiguousEnvironment(inner)
        }
        other => other,
    }
}

impl Drop for Resolver<'_> {
    fn drop(&mut self) {
        self.slots.clear();
        while let Some(constructed) = self.constructed.pop() {
            if let Some(teardown) = &constructed.teardown {
                debug!(name = %constructed.name, "Tearing down");
                teardown(&constructed.value);
            }
        }
    }
}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("environments", self.environments)
            .field("mode", &self.mode)
            .field("resolving", &self.stack)
            .field("constructed", &self.constructed.len())
            .finish()
    }
}
