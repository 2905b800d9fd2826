//! Environment activation and provider selection.
//!
//! The active environments form an ordered list of increasing
//! specificity. [`MAIN_ENVIRONMENT`] is always part of it and sits first
//! unless the caller lists it explicitly somewhere else.
//!
//! # Selection policy
//! Among the providers registered for a logical name, only those whose
//! environment is active are candidates. The one whose environment comes
//! **latest** in the activation order wins, so `--dependencies=a,b` lets
//! `b` override `a`, and both override `main`.
//!
//! [`SelectionMode::Strict`] refuses to break ties between non-main
//! environments and reports [`WireError::AmbiguousEnvironment`] instead.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{AmbiguousEnvironmentError, Result, UnknownDependencyError, WireError};
use crate::key::MAIN_ENVIRONMENT;
use crate::provider::Provider;

/// Ordered set of active environment names.
///
/// # Examples
/// ```
/// use xwire_container::environment::ActiveEnvironments;
///
/// let active: ActiveEnvironments = "fake_users, fake_payments".parse().unwrap();
/// assert_eq!(active.as_slice(), ["main", "fake_users", "fake_payments"]);
/// assert!(active.rank("fake_payments") > active.rank("fake_users"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ActiveEnvironments {
    names: Vec<String>,
}

impl ActiveEnvironments {
    /// Only the main environment.
    pub fn main_only() -> Self {
        Self {
            names: vec![MAIN_ENVIRONMENT.to_owned()],
        }
    }

    /// Builds the activation order from `names`.
    ///
    /// Names are trimmed and empty ones dropped. A repeated name keeps
    /// its last position. `main` is prepended when missing.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            ordered.retain(|existing| existing != name);
            ordered.push(name.to_owned());
        }

        if !ordered.iter().any(|name| name == MAIN_ENVIRONMENT) {
            ordered.insert(0, MAIN_ENVIRONMENT.to_owned());
        }

        Self { names: ordered }
    }

    /// Parses a comma-separated list, e.g. `"fake_users, fake_payments"`.
    pub fn parse_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Position in the activation order; higher is more specific.
    pub fn rank(&self, environment: &str) -> Option<usize> {
        self.names.iter().position(|name| name == environment)
    }

    pub fn is_active(&self, environment: &str) -> bool {
        self.rank(environment).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }
}

impl Default for ActiveEnvironments {
    fn default() -> Self {
        Self::main_only()
    }
}

impl FromStr for ActiveEnvironments {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse_list(s))
    }
}

impl From<Vec<String>> for ActiveEnvironments {
    fn from(names: Vec<String>) -> Self {
        Self::new(names)
    }
}

impl From<ActiveEnvironments> for Vec<String> {
    fn from(active: ActiveEnvironments) -> Self {
        active.names
    }
}

impl fmt::Display for ActiveEnvironments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join(","))
    }
}

/// How ties between several active environments are broken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// The environment activated last wins.
    #[default]
    LatestWins,

    /// More than one active non-main environment is an error.
    Strict,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::LatestWins => write!(f, "latest-wins"),
            SelectionMode::Strict => write!(f, "strict"),
        }
    }
}

/// Picks the provider that satisfies `name`.
///
/// The returned errors carry no resolution chain; callers that know it
/// fill it in.
///
/// # Errors
/// - [`WireError::UnknownDependency`] when `candidates` is empty or none
///   of them is registered under an active environment
/// - [`WireError::AmbiguousEnvironment`] in strict mode only
pub fn select<'a>(
    name: &str,
    candidates: &'a [Provider],
    active: &ActiveEnvironments,
    mode: SelectionMode,
) -> Result<&'a Provider> {
    let mut matching: Vec<(usize, &'a Provider)> = candidates
        .iter()
        .filter_map(|provider| active.rank(provider.environment()).map(|rank| (rank, provider)))
        .collect();
    matching.sort_by_key(|(rank, _)| *rank);

    if mode == SelectionMode::Strict {
        let overrides: Vec<String> = matching
            .iter()
            .filter(|(_, provider)| !provider.key().is_main())
            .map(|(_, provider)| provider.environment().to_owned())
            .collect();

        if overrides.len() > 1 {
            return Err(WireError::AmbiguousEnvironment(AmbiguousEnvironmentError {
                name: name.to_owned(),
                environments: overrides,
                chain: Vec::new(),
            }));
        }
    }

    match matching.last() {
        Some((_, provider)) => {
            trace!(name, environment = provider.environment(), "Selected provider");
            Ok(*provider)
        }
        None => {
            let mut error = UnknownDependencyError::new(name);
            error.inactive_environments = candidates
                .iter()
                .map(|provider| provider.environment().to_owned())
                .collect();
            Err(WireError::UnknownDependency(error))
        }
    }
}
