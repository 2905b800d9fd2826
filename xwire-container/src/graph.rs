//! Static resolution planning.
//!
//! Walks the dependency graph exactly as a run would, choosing one
//! provider per name with the same selection rules, but without invoking
//! any factory. Useful to answer "which implementation would this run
//! use?" and to reject broken graphs before anything is constructed:
//! - Detects circular dependencies
//! - Checks that every requested name has an active provider
//! - Reports strict-mode environment ties

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, instrument, warn};
use xwire_support::rendering::{PlanEntry, render_chain, render_plan_vertical};

use crate::environment::{ActiveEnvironments, SelectionMode, select};
use crate::error::{CircularDependencyError, Result, WireError};
use crate::registry::Registry;
use crate::resolver::locate;

/// One name of a plan, with the provider chosen for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    pub name: String,
    pub environment: String,
    pub dependencies: Vec<String>,
    pub output_type: &'static str,
}

/// Names in the order a run would construct them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionPlan {
    pub steps: Vec<PlanStep>,
}

impl ResolutionPlan {
    /// Environment chosen for `name`, if the plan contains it.
    pub fn environment_of(&self, name: &str) -> Option<&str> {
        self.steps
            .iter()
            .find(|step| step.name == name)
            .map(|step| step.environment.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.environment_of(name).is_some()
    }

    /// Renders the plan one step per line, construction order top-down.
    pub fn render(&self) -> String {
        let entries: Vec<PlanEntry> = self
            .steps
            .iter()
            .map(|step| PlanEntry {
                name: step.name.clone(),
                environment: step.environment.clone(),
                dependencies: step.dependencies.clone(),
            })
            .collect();
        render_plan_vertical(&entries)
    }
}

/// Depth-first planner mirroring the resolver.
///
/// Maintains a "path" to detect cycles and a "planned" set so shared
/// dependencies appear once.
pub(crate) struct Planner<'a> {
    registry: &'a Registry,
    environments: &'a ActiveEnvironments,
    mode: SelectionMode,
    planned: HashSet<String>,
    path: Vec<String>,
    steps: Vec<PlanStep>,
}

impl<'a> Planner<'a> {
    pub fn new(
        registry: &'a Registry,
        environments: &'a ActiveEnvironments,
        mode: SelectionMode,
    ) -> Self {
        Self {
            registry,
            environments,
            mode,
            planned: HashSet::new(),
            path: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Plans `roots` and everything they depend on.
    #[instrument(skip_all, name = "resolution_plan")]
    pub fn plan<I, S>(mut self, roots: I) -> Result<ResolutionPlan>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for root in roots {
            self.visit(root.as_ref())?;
        }

        debug!(steps = self.steps.len(), "Resolution plan ready");
        Ok(ResolutionPlan { steps: self.steps })
    }

    /// Plans every name that has a provider in an active environment.
    pub fn plan_all(self) -> Result<ResolutionPlan> {
        let registry = self.registry;
        let environments = self.environments;
        let roots: Vec<String> = registry
            .names()
            .filter(|name| {
                registry
                    .candidates(name)
                    .iter()
                    .any(|p| environments.is_active(p.environment()))
            })
            .map(str::to_owned)
            .collect();
        self.plan(roots)
    }

    fn visit(&mut self, name: &str) -> Result<()> {
        if self.planned.contains(name) {
            return Ok(());
        }

        if self.path.iter().any(|n| n == name) {
            let mut chain = self.path.clone();
            chain.push(name.to_owned());
            warn!(cycle = %render_chain(&chain), "Circular dependency detected!");
            return Err(WireError::CircularDependency(CircularDependencyError { chain }));
        }

        self.path.push(name.to_owned());

        let registry = self.registry;
        let provider = match select(name, registry.candidates(name), self.environments, self.mode) {
            Ok(provider) => provider,
            Err(error) => return Err(self.locate(error)),
        };

        for dependency in provider.dependencies() {
            self.visit(dependency)?;
        }

        self.path.pop();
        self.planned.insert(name.to_owned());
        self.steps.push(PlanStep {
            name: name.to_owned(),
            environment: provider.environment().to_owned(),
            dependencies: provider.dependencies().to_vec(),
            output_type: provider.output_type(),
        });

        Ok(())
    }

    fn locate(&self, error: WireError) -> WireError {
        locate(self.registry, &self.path, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;

    fn node(name: &str, deps: &[&str]) -> Provider {
        Provider::new(name, deps.to_vec(), |_| Ok(()))
    }

    fn demo_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(Provider::value("db_string", String::from("memory://")));
        registry.register(node("dbcnx", &["db_string"]));
        registry.register(node("users", &["dbcnx"]));
        registry.register(node("users", &[]).in_environment("fake_users"));
        registry.register(node("payments", &["dbcnx"]));
        registry
    }

    #[test]
    fn plan_lists_construction_order() {
        let registry = demo_registry();
        let active = ActiveEnvironments::main_only();
        let plan = Planner::new(&registry, &active, SelectionMode::LatestWins)
            .plan(["users", "payments"])
            .unwrap();

        let names: Vec<&str> = plan.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["db_string", "dbcnx", "users", "payments"]);
    }

    #[test]
    fn plan_follows_active_environment() {
        let registry = demo_registry();
        let active = ActiveEnvironments::parse_list("fake_users");
        let plan = Planner::new(&registry, &active, SelectionMode::LatestWins)
            .plan(["users"])
            .unwrap();

        assert_eq!(plan.environment_of("users"), Some("fake_users"));
        assert!(!plan.contains("dbcnx"));
        assert!(plan.render().contains("[fake_users] users"));
    }

    #[test]
    fn diamond_dependency_ok() {
        let mut registry = Registry::new();
        registry.register(node("d", &[]));
        registry.register(node("b", &["d"]));
        registry.register(node("c", &["d"]));
        registry.register(node("a", &["b", "c"]));

        let active = ActiveEnvironments::main_only();
        let plan = Planner::new(&registry, &active, SelectionMode::LatestWins)
            .plan(["a"])
            .unwrap();
        assert_eq!(plan.steps.len(), 4);
    }

    #[test]
    fn detect_circular_dependency() {
        let mut registry = Registry::new();
        registry.register(node("a", &["b"]));
        registry.register(node("b", &["c"]));
        registry.register(node("c", &["a"]));

        let active = ActiveEnvironments::main_only();
        match Planner::new(&registry, &active, SelectionMode::LatestWins).plan(["a"]) {
            Err(WireError::CircularDependency(err)) => {
                assert_eq!(err.chain, ["a", "b", "c", "a"]);
            }
            other => panic!("Expected CircularDependency, got: {other:?}"),
        }
    }

    #[test]
    fn detect_missing_dependency() {
        let mut registry = Registry::new();
        registry.register(node("a", &["b"]));

        let active = ActiveEnvironments::main_only();
        match Planner::new(&registry, &active, SelectionMode::LatestWins).plan(["a"]) {
            Err(WireError::UnknownDependency(err)) => {
                assert_eq!(err.requested, "b");
                assert_eq!(err.required_by.as_deref(), Some("a"));
            }
            other => panic!("Expected UnknownDependency, got: {other:?}"),
        }
    }

    #[test]
    fn missing_dependency_gets_capped_suggestions() {
        let mut registry = Registry::new();
        for name in ["user", "users", "users_v2", "user_ids", "user_names"] {
            registry.register(node(name, &[]));
        }
        registry.register(node("render", &["user_"]));

        let active = ActiveEnvironments::main_only();
        match Planner::new(&registry, &active, SelectionMode::LatestWins).plan(["render"]) {
            Err(WireError::UnknownDependency(err)) => {
                assert_eq!(err.chain, ["render", "user_"]);
                assert_eq!(err.required_by.as_deref(), Some("render"));
                assert_eq!(err.suggestions.len(), crate::resolver::MAX_SUGGESTIONS);
                assert!(err.suggestions.iter().all(|s| s.starts_with("user")));
            }
            other => panic!("Expected UnknownDependency, got: {other:?}"),
        }
    }

    #[test]
    fn plan_all_skips_inactive_only_names() {
        let mut registry = demo_registry();
        registry.register(node("audit", &["missing"]).in_environment("staging"));

        let active = ActiveEnvironments::main_only();
        let plan = Planner::new(&registry, &active, SelectionMode::LatestWins)
            .plan_all()
            .unwrap();

        assert!(plan.contains("payments"));
        assert!(!plan.contains("audit"));
    }

    #[test]
    fn plan_all_reports_broken_active_provider() {
        let mut registry = demo_registry();
        registry.register(node("audit", &["missing"]).in_environment("staging"));

        let active = ActiveEnvironments::parse_list("staging");
        let result = Planner::new(&registry, &active, SelectionMode::LatestWins).plan_all();
        assert!(matches!(result, Err(WireError::UnknownDependency(_))));
    }
}
