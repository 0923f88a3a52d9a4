//! Core domain types for the callback relay.

pub mod ids;
pub mod provider;

pub use ids::{Namespace, NamespaceMode, NaturalKey, TEST_NAMESPACE_SUFFIX};
pub use provider::ProviderKind;
