//! Provider registry: every provider record, grouped by logical name.
//!
//! The registry is filled during a registration phase and shared
//! read-only (behind an `Arc`) once resolution starts.

use std::collections::HashMap;

use tracing::{debug, warn};
use xwire_support::rendering::shorten_type_name;

use crate::provider::{Provider, ProviderModule, ProviderSink};

/// Records for one logical name whose declared output types disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConflict {
    pub name: String,
    /// `(environment, output type)` in registration order
    pub outputs: Vec<(String, &'static str)>,
}

/// Stores all provider records.
///
/// At most one record exists per `(name, environment)`; registering the
/// same pair again replaces the record in place.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    providers: HashMap<String, Vec<Provider>>,
    order: Vec<String>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `provider`, replacing any record with the same name and
    /// environment.
    ///
    /// Records for one name are expected to produce the same type in
    /// every environment. A disagreement is logged, not rejected: see
    /// [`Registry::output_conflicts`].
    pub fn register(&mut self, provider: Provider) {
        let name = provider.name().to_owned();
        if !self.providers.contains_key(&name) {
            self.order.push(name.clone());
        }
        let records = self.providers.entry(name.clone()).or_default();

        if let Some(other) = output_mismatch(records, &provider) {
            warn!(
                name = %name,
                environment = provider.environment(),
                output = %shorten_type_name(provider.output_type()),
                other_environment = other.environment(),
                other_output = %shorten_type_name(other.output_type()),
                "Providers for one logical name disagree on their output type"
            );
        }

        match records
            .iter_mut()
            .find(|existing| existing.environment() == provider.environment())
        {
            Some(existing) => {
                warn!(key = %provider.key(), "Replacing previously registered provider");
                *existing = provider;
            }
            None => {
                debug!(
                    key = %provider.key(),
                    dependencies = ?provider.dependencies(),
                    "Registered provider"
                );
                records.push(provider);
            }
        }
    }

    /// Registers every provider of `module`.
    pub fn extend(&mut self, module: &dyn ProviderModule) {
        debug!(module = module.name(), "Adding provider module");
        module.register(self);
    }

    /// All records registered under `name`, in registration order.
    ///
    /// Unknown names yield an empty slice.
    pub fn candidates(&self, name: &str) -> &[Provider] {
        self.providers.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Logical names in first-registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Returns every logical name whose records disagree on output type.
    pub fn output_conflicts(&self) -> Vec<OutputConflict> {
        self.names()
            .filter_map(|name| {
                let records = self.candidates(name);
                let first = records.first()?.output_type();
                if records.iter().all(|p| p.output_type() == first) {
                    return None;
                }
                Some(OutputConflict {
                    name: name.to_owned(),
                    outputs: records
                        .iter()
                        .map(|p| (p.environment().to_owned(), p.output_type()))
                        .collect(),
                })
            })
            .collect()
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.providers.clear();
        self.order.clear();
    }

    /// Returns the number of provider records.
    pub fn len(&self) -> usize {
        self.providers.values().map(Vec::len).sum()
    }

    /// Returns true if no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// First record under another environment whose output type differs.
///
/// The record `provider` is about to replace does not count.
fn output_mismatch<'r>(records: &'r [Provider], provider: &Provider) -> Option<&'r Provider> {
    records.iter().find(|other| {
        other.environment() != provider.environment()
            && other.output_type() != provider.output_type()
    })
}

impl ProviderSink for Registry {
    fn register(&mut self, provider: Provider) {
        Registry::register(self, provider);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn list(name: &str, items: &[&str]) -> Provider {
        let items: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        Provider::value(name, items)
    }

    #[test]
    fn register_and_get() {
        let mut reg = Registry::new();
        reg.register(list("users", &["u1"]));
        assert_eq!(reg.candidates("users").len(), 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unknown_name_has_no_candidates() {
        let reg = Registry::new();
        assert!(reg.candidates("users").is_empty());
        assert!(reg.is_empty());
    }

    #[test]
    fn candidates_keep_registration_order() {
        let mut reg = Registry::new();
        reg.register(list("users", &[]).in_environment("fake_users"));
        reg.register(list("users", &[]));
        reg.register(list("users", &[]).in_environment("staging"));

        let envs: Vec<&str> = reg.candidates("users").iter().map(Provider::environment).collect();
        assert_eq!(envs, ["fake_users", "main", "staging"]);
    }

    #[test]
    fn same_pair_replaces_in_place() {
        let mut reg = Registry::new();
        reg.register(list("users", &[]).in_environment("fake_users"));
        reg.register(list("users", &[]));
        reg.register(Provider::new("users", ["dbcnx"], |_| Ok(Vec::<String>::new())).in_environment("fake_users"));

        let records = reg.candidates("users");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].environment(), "fake_users");
        assert_eq!(records[0].dependencies(), ["dbcnx"]);
    }

    #[test]
    fn names_in_first_registration_order() {
        let mut reg = Registry::new();
        reg.register(list("users", &[]));
        reg.register(Provider::value("db_string", String::new()));
        reg.register(list("users", &[]).in_environment("fake_users"));

        assert_eq!(reg.names().collect::<Vec<_>>(), ["users", "db_string"]);
    }

    #[test]
    fn mismatched_outputs_are_reported_not_rejected() {
        // One real list of users, one fake list, and one payments map that
        // was registered under the "users" name by mistake.
        let mut reg = Registry::new();
        reg.register(list("users", &[]));
        reg.register(list("users", &["u1", "u2", "u3"]).in_environment("fake_users"));
        reg.register(
            Provider::value("users", Map::from([("u1".to_string(), 100i64)]))
                .in_environment("fake_payments"),
        );

        assert_eq!(reg.candidates("users").len(), 3);

        let conflicts = reg.output_conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].name, "users");
        assert_eq!(conflicts[0].outputs.len(), 3);
        assert_eq!(conflicts[0].outputs[2].0, "fake_payments");
        assert!(conflicts[0].outputs[2].1.contains("HashMap"));
    }

    #[test]
    fn replacing_a_record_is_not_an_output_mismatch() {
        let records = vec![list("users", &[]), list("users", &[]).in_environment("fake_users")];

        let replacement = Provider::value("users", 0u32);
        assert!(output_mismatch(&records[..1], &replacement).is_none());

        let other = output_mismatch(&records, &replacement.in_environment("fake_users")).unwrap();
        assert_eq!(other.environment(), "main");
    }

    #[test]
    fn retyped_replacement_leaves_no_conflict() {
        let mut reg = Registry::new();
        reg.register(list("users", &[]));
        reg.register(Provider::value("users", 0u32));

        assert_eq!(reg.candidates("users").len(), 1);
        assert!(reg.output_conflicts().is_empty());
    }

    #[test]
    fn consistent_outputs_have_no_conflicts() {
        let mut reg = Registry::new();
        reg.register(list("users", &[]));
        reg.register(list("users", &["u1"]).in_environment("fake_users"));
        assert!(reg.output_conflicts().is_empty());
    }

    #[test]
    fn clear_removes_everything() {
        let mut reg = Registry::new();
        reg.register(list("users", &[]));
        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.names().count(), 0);
    }
}
