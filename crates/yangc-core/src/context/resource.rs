//! Resource identifiers: instance paths over the resolved schema.
//!
//! A [`ResourceId`] is an ordered list of node keys identifying the branch
//! points from a root context down to a resource in the instance tree.
//! List entries add key-leaf values, leaf-list entries a single value; the
//! schema side ignores the values and follows schema identifiers only.

use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// A schema identifier: node name plus namespace URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemaId {
    /// Node name.
    pub name: String,
    /// Namespace URI.
    pub namespace: String,
}

impl SchemaId {
    /// Create a schema id.
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.namespace)
    }
}

/// An instance-addressing value carried by list and leaf-list keys.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyValue {
    String(String),
    Int64(i64),
    Uint64(u64),
    Bool(bool),
}

impl From<&str> for KeyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<u64> for KeyValue {
    fn from(v: u64) -> Self {
        Self::Uint64(v)
    }
}

impl From<bool> for KeyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(v) => f.write_str(v),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Uint64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// One branch point of a resource id.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKey {
    /// A plain branch point (container, leaf, choice-transparent child).
    Node(SchemaId),
    /// A list entry: schema id plus an ordered key-leaf map.
    List {
        /// The list's schema id.
        id: SchemaId,
        /// Key-leaf name → value, in key order.
        keys: IndexMap<String, KeyValue>,
    },
    /// A leaf-list entry: schema id plus the entry value. Terminal.
    LeafList {
        /// The leaf-list's schema id.
        id: SchemaId,
        /// The entry's value.
        value: KeyValue,
    },
}

impl NodeKey {
    /// The branch point's schema id.
    #[must_use]
    pub fn schema_id(&self) -> &SchemaId {
        match self {
            Self::Node(id) | Self::List { id, .. } | Self::LeafList { id, .. } => id,
        }
    }
}

/// Errors raised by [`ResourceIdBuilder`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ResourceIdError {
    /// A leaf-list branch point is terminal; nothing may follow it.
    #[error("leaf-list is a terminal branch point; nothing may be added after it")]
    LeafListIsTerminal,
    /// A key leaf needs a current branch point to attach to.
    #[error("no branch point to attach the key leaf to")]
    NoCurrentKey,
    /// `build` was called before any branch point was added.
    #[error("resource id has no branch points")]
    Empty,
}

/// An ordered path of node keys identifying a resource.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceId {
    keys: Vec<NodeKey>,
}

impl ResourceId {
    /// Start building a resource id.
    #[must_use]
    pub fn builder() -> ResourceIdBuilder {
        ResourceIdBuilder::default()
    }

    /// The node keys, root first.
    #[must_use]
    pub fn node_keys(&self) -> &[NodeKey] {
        &self.keys
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.keys {
            write!(f, "/{}", key.schema_id().name)?;
        }
        Ok(())
    }
}

/// Builder for [`ResourceId`].
///
/// The builder keeps one "current" key open so that key leaves can be
/// attached to it; adding the next branch point seals it.
#[derive(Debug, Default)]
pub struct ResourceIdBuilder {
    sealed: Vec<NodeKey>,
    current: Option<NodeKey>,
}

impl ResourceIdBuilder {
    /// Add a descendant branch point by schema identity.
    ///
    /// # Errors
    ///
    /// [`ResourceIdError::LeafListIsTerminal`] when the current branch
    /// point is a leaf-list entry.
    pub fn add_branch_point(
        mut self,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Result<Self, ResourceIdError> {
        if matches!(self.current, Some(NodeKey::LeafList { .. })) {
            return Err(ResourceIdError::LeafListIsTerminal);
        }
        if let Some(current) = self.current.take() {
            self.sealed.push(current);
        }
        self.current = Some(NodeKey::Node(SchemaId::new(name, namespace)));
        Ok(self)
    }

    /// Add a key-leaf value to the current branch point, promoting it to a
    /// list entry when necessary.
    ///
    /// # Errors
    ///
    /// [`ResourceIdError::LeafListIsTerminal`] on a leaf-list entry,
    /// [`ResourceIdError::NoCurrentKey`] when no branch point is open.
    pub fn add_key_leaf(
        mut self,
        name: impl Into<String>,
        _namespace: impl Into<String>,
        value: impl Into<KeyValue>,
    ) -> Result<Self, ResourceIdError> {
        match self.current.take() {
            None => Err(ResourceIdError::NoCurrentKey),
            Some(NodeKey::LeafList { .. }) => Err(ResourceIdError::LeafListIsTerminal),
            Some(NodeKey::Node(id)) => {
                let mut keys = IndexMap::new();
                keys.insert(name.into(), value.into());
                self.current = Some(NodeKey::List { id, keys });
                Ok(self)
            }
            Some(NodeKey::List { id, mut keys }) => {
                keys.insert(name.into(), value.into());
                self.current = Some(NodeKey::List { id, keys });
                Ok(self)
            }
        }
    }

    /// Add a leaf-list entry branch point. The resource id is complete
    /// after this: a leaf-list entry is terminal.
    ///
    /// # Errors
    ///
    /// [`ResourceIdError::LeafListIsTerminal`] when the current branch
    /// point is already a leaf-list entry.
    pub fn add_leaf_list_branch_point(
        mut self,
        name: impl Into<String>,
        namespace: impl Into<String>,
        value: impl Into<KeyValue>,
    ) -> Result<Self, ResourceIdError> {
        if matches!(self.current, Some(NodeKey::LeafList { .. })) {
            return Err(ResourceIdError::LeafListIsTerminal);
        }
        if let Some(current) = self.current.take() {
            self.sealed.push(current);
        }
        self.current = Some(NodeKey::LeafList {
            id: SchemaId::new(name, namespace),
            value: value.into(),
        });
        Ok(self)
    }

    /// Seal the current branch point and produce the resource id.
    ///
    /// # Errors
    ///
    /// [`ResourceIdError::Empty`] when no branch point was added.
    pub fn build(mut self) -> Result<ResourceId, ResourceIdError> {
        let Some(current) = self.current.take() else {
            return Err(ResourceIdError::Empty);
        };
        self.sealed.push(current);
        Ok(ResourceId { keys: self.sealed })
    }
}
