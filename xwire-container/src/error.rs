//! Error types for xwire resolution.
//!
//! Every resolution error carries the logical name it failed on and the
//! chain of names that led there, so a failed run can be traced back to
//! the entry point parameter that requested it.

use std::fmt;

use xwire_support::rendering::render_chain;

use crate::key::ProviderKey;

/// Boxed error returned by provider factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for all xwire operations.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// No provider is registered for the logical name under any active environment.
    #[error("{}", .0)]
    UnknownDependency(UnknownDependencyError),

    /// A name was requested while it was already being resolved.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A provider factory returned an error.
    #[error(
        "Failed to construct {key}\n  Chain: {}\n  Cause: {source}",
        render_chain(.chain)
    )]
    ProviderInvocation {
        key: ProviderKey,
        chain: Vec<String>,
        #[source]
        source: BoxError,
    },

    /// Strict selection found several active environments for one name.
    #[error("{}", .0)]
    AmbiguousEnvironment(AmbiguousEnvironmentError),

    /// A resolved value was not of the type its consumer asked for.
    #[error("Dependency {name:?} is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    /// A factory asked for a value it never declared.
    #[error("Dependency {name:?} was not declared by this provider")]
    UndeclaredDependency { name: String },

    /// The name already failed earlier in the same run.
    #[error("Dependency {name:?} already failed earlier in this run")]
    PreviouslyFailed { name: String },

    /// The process-wide registry no longer accepts registrations.
    #[error("Registry is frozen: a run has already started. Register providers before running")]
    RegistryFrozen,
}

impl WireError {
    /// The logical name the error is about, when there is one.
    pub fn logical_name(&self) -> Option<&str> {
        match self {
            Self::UnknownDependency(e) => Some(&e.requested),
            Self::CircularDependency(e) => e.chain.last().map(String::as_str),
            Self::ProviderInvocation { key, .. } => Some(key.name()),
            Self::AmbiguousEnvironment(e) => Some(&e.name),
            Self::TypeMismatch { name, .. }
            | Self::UndeclaredDependency { name }
            | Self::PreviouslyFailed { name } => Some(name),
            Self::RegistryFrozen => None,
        }
    }

    /// The resolution chain recorded with the error.
    pub fn chain(&self) -> &[String] {
        match self {
            Self::UnknownDependency(e) => &e.chain,
            Self::CircularDependency(e) => &e.chain,
            Self::ProviderInvocation { chain, .. } => chain,
            Self::AmbiguousEnvironment(e) => &e.chain,
            _ => &[],
        }
    }
}

/// Error when a logical name has no usable provider.
#[derive(Debug)]
pub struct UnknownDependencyError {
    /// The logical name that was requested
    pub requested: String,
    /// The name whose provider declared it (if any)
    pub required_by: Option<String>,
    /// Names from the first request down to `requested`
    pub chain: Vec<String>,
    /// Environments that provide the name but are not active
    pub inactive_environments: Vec<String>,
    /// Registered names close to `requested`
    pub suggestions: Vec<String>,
}

impl UnknownDependencyError {
    pub(crate) fn new(requested: impl Into<String>) -> Self {
        Self {
            requested: requested.into(),
            required_by: None,
            chain: Vec::new(),
            inactive_environments: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

impl fmt::Display for UnknownDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency not registered: {}", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if self.chain.len() > 1 {
            write!(f, "\n  Chain: {}", render_chain(&self.chain))?;
        }

        if !self.inactive_environments.is_empty() {
            write!(
                f,
                "\n  Provided only by inactive environments: {}",
                self.inactive_environments.join(", ")
            )?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        if self.inactive_environments.is_empty() {
            write!(
                f,
                "\n  Hint: register a provider named {:?}",
                self.requested
            )
        } else {
            write!(f, "\n  Hint: activate one of the environments above")
        }
    }
}

/// Error when a circular dependency is detected.
///
/// The chain starts at the first request and ends with the repeated name.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// Example: `["users", "dbcnx", "users"]`
    pub chain: Vec<String>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected:\n  {}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: one of these providers must stop declaring its dependency on the next"
        )
    }
}

/// Error when strict selection finds more than one active environment.
#[derive(Debug)]
pub struct AmbiguousEnvironmentError {
    pub name: String,
    /// Matching environments in activation order
    pub environments: Vec<String>,
    pub chain: Vec<String>,
}

impl fmt::Display for AmbiguousEnvironmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ambiguous environment for {}: {} are all active",
            self.name,
            self.environments.join(", ")
        )?;
        write!(
            f,
            "\n  Hint: activate only one of them, or use the latest-wins selection mode"
        )
    }
}

/// Convenient Result type for xwire operations.
pub type Result<T> = std::result::Result<T, WireError>;
