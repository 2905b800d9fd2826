//! Provider records and provider modules.
//!
//! A [`Provider`] is a factory for one logical name, tagged with an
//! environment and the ordered list of names it depends on. Providers
//! never see the resolver: their dependencies arrive already constructed
//! in a [`Dependencies`] bundle, bound by name.
//!
//! Related providers can be grouped in a [`ProviderModule`]:
//!
//! ```rust
//! use xwire_container::prelude::*;
//!
//! struct FakeData;
//!
//! impl ProviderModule for FakeData {
//!     fn register(&self, sink: &mut dyn ProviderSink) {
//!         sink.register(
//!             Provider::value("users", vec!["u1".to_string(), "u2".to_string()])
//!                 .in_environment("fake_users"),
//!         );
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.extend(&FakeData);
//! assert_eq!(registry.candidates("users").len(), 1);
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, Result, WireError};
use crate::key::ProviderKey;

/// An opaque resolved value.
///
/// Values are shared: every consumer within a run receives the same `Arc`.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Type-erased factory stored in a provider record.
pub type FactoryFn = Arc<dyn Fn(&Dependencies) -> std::result::Result<Value, BoxError> + Send + Sync>;

/// Hook run on a value when the run that constructed it ends.
pub type TeardownFn = Arc<dyn Fn(&Value) + Send + Sync>;

/// A registered factory for one logical name in one environment.
#[derive(Clone)]
pub struct Provider {
    key: ProviderKey,
    factory: FactoryFn,
    dependencies: Vec<String>,
    output_type: &'static str,
    teardown: Option<TeardownFn>,
}

impl Provider {
    /// Creates a main-environment provider from a typed factory.
    ///
    /// `dependencies` are the logical names the factory reads from its
    /// [`Dependencies`], in declaration order.
    pub fn new<T, F, I, S>(name: impl Into<String>, dependencies: I, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Dependencies) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_raw(
            ProviderKey::main(name),
            dependencies.into_iter().map(Into::into).collect(),
            type_name::<T>(),
            Arc::new(move |deps: &Dependencies| Ok(Arc::new(factory(deps)?) as Value)),
        )
    }

    /// Creates a main-environment provider that hands out a clone of `value`.
    pub fn value<T: Clone + Send + Sync + 'static>(name: impl Into<String>, value: T) -> Self {
        Self::new(name, Vec::<String>::new(), move |_| Ok(value.clone()))
    }

    /// Creates a provider from already type-erased parts.
    pub fn from_raw(
        key: ProviderKey,
        dependencies: Vec<String>,
        output_type: &'static str,
        factory: FactoryFn,
    ) -> Self {
        Self {
            key,
            factory,
            dependencies,
            output_type,
            teardown: None,
        }
    }

    /// Moves the provider into `environment`.
    pub fn in_environment(mut self, environment: impl Into<String>) -> Self {
        self.key = ProviderKey::new(self.key.name(), environment);
        self
    }

    /// Attaches a hook run on the constructed value when its run ends.
    ///
    /// The hook is skipped if the value is not a `T`.
    pub fn with_teardown<T: Send + Sync + 'static>(
        mut self,
        hook: impl Fn(&T) + Send + Sync + 'static,
    ) -> Self {
        self.teardown = Some(Arc::new(move |value: &Value| {
            if let Some(typed) = value.downcast_ref::<T>() {
                hook(typed);
            }
        }));
        self
    }

    pub fn key(&self) -> &ProviderKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        self.key.name()
    }

    pub fn environment(&self) -> &str {
        self.key.environment()
    }

    /// Declared dependency names, in declaration order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Type name of the value the factory produces.
    pub fn output_type(&self) -> &'static str {
        self.output_type
    }

    pub(crate) fn teardown(&self) -> Option<&TeardownFn> {
        self.teardown.as_ref()
    }

    pub(crate) fn invoke(&self, deps: &Dependencies) -> std::result::Result<Value, BoxError> {
        (self.factory)(deps)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("key", &self.key)
            .field("dependencies", &self.dependencies)
            .field("output_type", &self.output_type)
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}

/// Resolved values handed to a factory or an entry point, bound by name.
pub struct Dependencies {
    values: Vec<(String, Value)>,
}

impl Dependencies {
    pub(crate) fn new(values: Vec<(String, Value)>) -> Self {
        Self { values }
    }

    /// An empty bundle, for factories without dependencies.
    pub fn empty() -> Self {
        Self { values: Vec::new() }
    }

    /// Returns the value bound to `name`, downcast to `T`.
    ///
    /// # Errors
    /// - [`WireError::UndeclaredDependency`] if `name` was not declared
    /// - [`WireError::TypeMismatch`] if the value is not a `T`
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        let value = self.value(name).ok_or_else(|| WireError::UndeclaredDependency {
            name: name.to_owned(),
        })?;

        Arc::clone(value)
            .downcast::<T>()
            .map_err(|_| WireError::TypeMismatch {
                name: name.to_owned(),
                expected: type_name::<T>(),
            })
    }

    /// Returns the type-erased value bound to `name`.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    /// Bound names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// A group of related provider registrations.
///
/// Split registrations by concern (real storage, fakes for tests,
/// staging overrides) and add each module to a registry or builder.
pub trait ProviderModule {
    /// Register providers into `sink`.
    fn register(&self, sink: &mut dyn ProviderSink);

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        type_name::<Self>()
    }
}

/// Anything provider modules can register into.
pub trait ProviderSink {
    fn register(&mut self, provider: Provider);
}
