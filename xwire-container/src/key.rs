//! Provider identification keys.
//!
//! A [`ProviderKey`] identifies one provider record: the logical name other
//! providers request it by, plus the environment it was registered under.
//! At most one provider exists per key.

use std::fmt;

/// The environment every provider belongs to unless told otherwise.
///
/// It is always active and always the least specific choice.
pub const MAIN_ENVIRONMENT: &str = "main";

/// Uniquely identifies a provider record.
///
/// # Examples
/// ```
/// use xwire_container::key::ProviderKey;
///
/// let real = ProviderKey::main("users");
/// let fake = ProviderKey::new("users", "fake_users");
/// assert_ne!(real, fake);
/// assert_eq!(fake.to_string(), "users (fake_users)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderKey {
    name: String,
    environment: String,
}

impl ProviderKey {
    /// Creates a key for `name` under `environment`.
    pub fn new(name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            environment: environment.into(),
        }
    }

    /// Creates a key for `name` under the main environment.
    #[inline]
    pub fn main(name: impl Into<String>) -> Self {
        Self::new(name, MAIN_ENVIRONMENT)
    }

    /// Returns the logical name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the environment tag.
    #[inline]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Returns `true` for keys registered under the main environment.
    #[inline]
    pub fn is_main(&self) -> bool {
        self.environment == MAIN_ENVIRONMENT
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.environment)
    }
}
