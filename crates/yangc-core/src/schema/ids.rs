//! Arena handles.
//!
//! Parent, child and sibling links in the schema tree are stored as
//! handles rather than references, and most of them are optional. Backing
//! each handle with `NonZeroU32` keeps `Option<NodeId>` at four bytes: the
//! handle stores its 0-based arena slot shifted up by one, leaving zero
//! free as the niche.

use core::num::NonZeroU32;

/// Handle of a node in a [`SchemaTree`](super::SchemaTree) arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Wrap a 0-based arena slot. `None` once the arena outgrows `u32`.
    pub(crate) fn new(slot: usize) -> Option<Self> {
        u32::try_from(slot)
            .ok()
            .and_then(|s| s.checked_add(1))
            .and_then(NonZeroU32::new)
            .map(Self)
    }

    /// The 0-based arena slot this handle points at.
    pub(crate) fn slot(self) -> usize {
        self.0.get() as usize - 1
    }
}

/// Handle of an interned string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrId(NonZeroU32);

impl StrId {
    /// Wrap a 0-based interner slot. `None` once the interner outgrows
    /// `u32`.
    pub(crate) fn new(slot: usize) -> Option<Self> {
        u32::try_from(slot)
            .ok()
            .and_then(|s| s.checked_add(1))
            .and_then(NonZeroU32::new)
            .map(Self)
    }

    /// The 0-based interner slot this handle points at.
    pub(crate) fn slot(self) -> usize {
        self.0.get() as usize - 1
    }
}
