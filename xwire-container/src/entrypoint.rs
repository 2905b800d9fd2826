//! Entry points, the functions a run exists to call.

use std::fmt;

use crate::provider::Dependencies;

/// A callable together with the logical names of its parameters.
///
/// ```rust
/// use xwire_container::entrypoint::Entrypoint;
/// use xwire_container::error::WireError;
///
/// let render = Entrypoint::new("render", ["users"], |deps| {
///     let users = deps.get::<Vec<String>>("users")?;
///     Ok::<usize, WireError>(users.len())
/// });
/// assert_eq!(render.parameters(), ["users"]);
/// ```
pub struct Entrypoint<F> {
    name: String,
    parameters: Vec<String>,
    body: F,
}

impl<F> Entrypoint<F> {
    pub fn new<T, E, I, S>(name: impl Into<String>, parameters: I, body: F) -> Self
    where
        F: Fn(&Dependencies) -> Result<T, E>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical names the entry point needs, in declaration order.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Calls the entry point with already resolved arguments.
    pub fn call<T, E>(&self, args: &Dependencies) -> Result<T, E>
    where
        F: Fn(&Dependencies) -> Result<T, E>,
    {
        (self.body)(args)
    }
}

impl<F> fmt::Debug for Entrypoint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entrypoint")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish()
    }
}
