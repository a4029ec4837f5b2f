//! Core identifiers and the rendered configuration tree.
//!
//! Identifiers are opaque newtype strings so host, environment and plan-step
//! names cannot be confused with one another at call sites. The configuration
//! tree is an explicit tagged union so branch/leaf dispatch is exhaustive
//! rather than inferred from runtime type tests.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque identifier of a managed host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(String);

/// Opaque name of a configuration environment (e.g. a baseline branch or a
/// proposed-change branch).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentId(String);

/// Opaque identifier of one step of a compiled execution plan.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is empty or whitespace-only.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(HostId);
string_id!(EnvironmentId);
string_id!(PlanId);

/// One host's fully rendered configuration for one environment.
///
/// A node is either a `Branch` mapping field names to child trees, or a
/// `Leaf` holding an opaque value. Leaf values compare by whole-value
/// equality; in particular, sequences are opaque leaves, so a reordered
/// sequence counts as a modification. Conversion from JSON guarantees a
/// `Leaf` never holds an object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigTree {
    /// Mapping from field name to child node. Keys are unique by
    /// construction.
    Branch(BTreeMap<String, ConfigTree>),
    /// Opaque scalar (or sequence) value.
    Leaf(serde_json::Value),
}

impl ConfigTree {
    /// Creates an empty branch node.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Branch(BTreeMap::new())
    }

    /// Returns true if this node is a branch.
    #[must_use]
    pub const fn is_branch(&self) -> bool {
        matches!(self, Self::Branch(_))
    }
}

impl From<serde_json::Value> for ConfigTree {
    /// Converts raw rendered data into a typed tree.
    ///
    /// JSON objects become branches, recursively; every other value,
    /// including arrays, becomes an opaque leaf.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => Self::Branch(
                map.into_iter()
                    .map(|(key, child)| (key, Self::from(child)))
                    .collect(),
            ),
            other => Self::Leaf(other),
        }
    }
}

impl<'de> Deserialize<'de> for ConfigTree {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from(value))
    }
}
