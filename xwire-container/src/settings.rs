//! Run settings fixed once at startup.

use serde::{Deserialize, Serialize};

use crate::environment::{ActiveEnvironments, SelectionMode};

/// Which environments are active and how ties between them are broken.
///
/// Deserializable so applications can embed it in their own config:
///
/// ```json
/// { "environments": ["fake_users", "fake_payments"], "selection": "strict" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub environments: ActiveEnvironments,
    pub selection: SelectionMode,
}

impl Settings {
    /// Settings activating `environments` with the default selection mode.
    pub fn with_environments(environments: ActiveEnvironments) -> Self {
        Self {
            environments,
            ..Self::default()
        }
    }
}
