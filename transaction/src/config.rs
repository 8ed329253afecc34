//! Coordinator configuration.

use serde::Deserialize;

use crate::definition::TransactionDefinition;
use crate::error::{TransactionError, TransactionResult};

/// Configuration for a [`TransactionCoordinator`](crate::TransactionCoordinator).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    /// Definition used when a caller does not supply one.
    pub default_definition: TransactionDefinition,
    /// Fail a participating scope's commit with an unexpected rollback as
    /// soon as the shared transaction is rollback-only, instead of waiting
    /// for the owning scope.
    pub fail_early_on_global_rollback_only: bool,
    /// Roll the physical transaction back when its commit call fails.
    pub rollback_on_commit_failure: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_definition: TransactionDefinition::required(),
            fail_early_on_global_rollback_only: false,
            rollback_on_commit_failure: false,
        }
    }
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(source: &str) -> TransactionResult<Self> {
        serde_json::from_str(source)
            .map_err(|e| TransactionError::configuration(format!("invalid coordinator config: {e}")))
    }

    pub fn with_default_definition(mut self, definition: TransactionDefinition) -> Self {
        self.default_definition = definition;
        self
    }

    pub fn with_fail_early_on_global_rollback_only(mut self, enabled: bool) -> Self {
        self.fail_early_on_global_rollback_only = enabled;
        self
    }

    pub fn with_rollback_on_commit_failure(mut self, enabled: bool) -> Self {
        self.rollback_on_commit_failure = enabled;
        self
    }
}
