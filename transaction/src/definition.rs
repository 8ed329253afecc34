//! Transaction definitions: what a caller asks for when it opens a scope.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::TransactionError;

/// How a new logical scope relates to an already active transaction.
///
/// Only `Required` and `RequiresNew` are coordinated. The remaining names
/// are recognised so that definitions carrying them parse, but `begin`
/// rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Propagation {
    /// Join the active transaction, or open one if none is active.
    #[default]
    Required,
    /// Always open an independent transaction, suspending the active one.
    RequiresNew,
    Supports,
    Mandatory,
    NotSupported,
    Never,
    Nested,
}

impl Propagation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Propagation::Required => "REQUIRED",
            Propagation::RequiresNew => "REQUIRES_NEW",
            Propagation::Supports => "SUPPORTS",
            Propagation::Mandatory => "MANDATORY",
            Propagation::NotSupported => "NOT_SUPPORTED",
            Propagation::Never => "NEVER",
            Propagation::Nested => "NESTED",
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Propagation::Required | Propagation::RequiresNew)
    }
}

impl fmt::Display for Propagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Propagation {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        let propagation = match normalized.strip_prefix("PROPAGATION_").unwrap_or(normalized.as_str()) {
            "REQUIRED" => Propagation::Required,
            "REQUIRES_NEW" => Propagation::RequiresNew,
            "SUPPORTS" => Propagation::Supports,
            "MANDATORY" => Propagation::Mandatory,
            "NOT_SUPPORTED" => Propagation::NotSupported,
            "NEVER" => Propagation::Never,
            "NESTED" => Propagation::Nested,
            _ => {
                return Err(TransactionError::configuration(format!(
                    "unknown propagation: {s}"
                )))
            }
        };
        Ok(propagation)
    }
}

impl TryFrom<String> for Propagation {
    type Error = TransactionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Requested isolation level. Carried as metadata; the coordinator does not
/// enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Isolation {
    #[default]
    Default,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// Everything a caller specifies when beginning a scope.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct TransactionDefinition {
    pub propagation: Propagation,
    pub isolation: Isolation,
    pub read_only: bool,
    /// Name used in logs.
    pub name: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl TransactionDefinition {
    pub fn new(propagation: Propagation) -> Self {
        Self {
            propagation,
            ..Default::default()
        }
    }

    pub fn required() -> Self {
        Self::new(Propagation::Required)
    }

    pub fn requires_new() -> Self {
        Self::new(Propagation::RequiresNew)
    }

    /// Parse the propagation from its name (`"REQUIRES_NEW"`,
    /// `"PROPAGATION_REQUIRED"`, ...).
    pub fn parse(propagation: &str) -> Result<Self, TransactionError> {
        Ok(Self::new(propagation.parse()?))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Name for logs, falling back to the propagation.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.propagation.as_str())
    }
}
