//! Newtype wrappers for storage identifiers.
//!
//! These types keep a provider's natural key from being confused with a store
//! namespace (both are plain strings on the wire and on disk).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ProviderKind;

/// The provider-supplied identifier that names one notification instance.
///
/// Examples: an airtime `requestId`, a Kyanda `transactionRef`, an M-Pesa
/// `ConversationID`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NaturalKey(pub String);

impl NaturalKey {
    pub fn new(s: impl Into<String>) -> Self {
        NaturalKey(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NaturalKey {
    fn from(s: String) -> Self {
        NaturalKey(s)
    }
}

impl From<&str> for NaturalKey {
    fn from(s: &str) -> Self {
        NaturalKey(s.to_string())
    }
}

/// Selects between the production tables and their `_test` counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceMode {
    #[default]
    Production,
    Test,
}

/// Suffix appended to a provider table name in [`NamespaceMode::Test`].
pub const TEST_NAMESPACE_SUFFIX: &str = "_test";

/// A logical partition of the store within which natural keys are unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(pub String);

impl Namespace {
    pub fn new(s: impl Into<String>) -> Self {
        Namespace(s.into())
    }

    /// Returns the namespace a provider's notifications are written to.
    ///
    /// Names are always lowercase; the test namespace is the production
    /// table name with [`TEST_NAMESPACE_SUFFIX`] appended.
    pub fn for_provider(kind: ProviderKind, mode: NamespaceMode) -> Self {
        let mut name = kind.table_name().to_lowercase();
        if mode == NamespaceMode::Test {
            name.push_str(TEST_NAMESPACE_SUFFIX);
        }
        Namespace(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
