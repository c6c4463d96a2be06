//! Node identity and payload types.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Canonical node identifier.
///
/// Ids arrive as strings or integers; both are normalized to one string key
/// at construction so `1` and `"1"` address the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&NodeId> for NodeId {
    fn from(value: &NodeId) -> Self {
        value.clone()
    }
}

macro_rules! node_id_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for NodeId {
                fn from(value: $t) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

node_id_from_int!(u32, u64, usize, i32, i64);

impl std::str::FromStr for NodeId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

struct NodeIdVisitor;

impl Visitor<'_> for NodeIdVisitor {
    type Value = NodeId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or integer node id")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<NodeId, E> {
        Ok(NodeId::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<NodeId, E> {
        Ok(NodeId::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<NodeId, E> {
        Ok(NodeId::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<NodeId, E> {
        Ok(NodeId::from(v))
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeIdVisitor)
    }
}

/// One entry of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Parent id, `None` for root nodes
    #[serde(default)]
    pub parent: Option<NodeId>,
    pub label: String,
    /// Root-to-node ids, only populated on export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<NodeId>>,
}

impl Node {
    pub fn root(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            label: label.into(),
            path: None,
        }
    }

    pub fn child(
        id: impl Into<NodeId>,
        parent: impl Into<NodeId>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent: Some(parent.into()),
            label: label.into(),
            path: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Shallow-merge the supplied patch fields. Returns whether `parent` changed.
    pub(crate) fn merge(&mut self, patch: NodePatch) -> bool {
        let mut parent_changed = false;
        if let Some(parent) = patch.parent {
            parent_changed = parent != self.parent;
            self.parent = parent;
        }
        if let Some(label) = patch.label {
            self.label = label;
        }
        parent_changed
    }
}

/// Partial node for updates: absent fields are preserved.
///
/// `parent: None` leaves the parent alone, `parent: Some(None)` turns the
/// node into a root. In JSON an absent key and an explicit `null` map to
/// those two cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePatch {
    pub id: NodeId,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<Option<NodeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl NodePatch {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            label: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent = Some(Some(parent.into()));
        self
    }

    pub fn with_root(mut self) -> Self {
        self.parent = Some(None);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<NodeId>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NodeId>::deserialize(deserializer).map(Some)
}
