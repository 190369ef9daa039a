//! Interned names and namespace URIs.
//!
//! Collision checks and child-map lookups compare schema ids constantly,
//! so node names and namespace URIs are interned once per tree and
//! compared as four-byte [`StrId`] handles. Every distinct string is
//! stored exactly once; a reverse map over the stored strings answers
//! `find` and keeps `intern` deduplicating, namespace URIs included.

use super::ids::StrId;
use std::collections::HashMap;

/// Deduplicating string store handing out dense [`StrId`] handles.
#[derive(Clone, Debug, Default)]
pub struct StringInterner {
    /// Distinct strings, indexed by handle slot.
    entries: Vec<Box<str>>,
    /// Content → handle, over the same allocations as `entries`.
    ids: HashMap<Box<str>, StrId>,
}

impl StringInterner {
    /// Create an empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning the handle of its stored copy. A string
    /// seen before yields the handle it got the first time.
    ///
    /// # Panics
    ///
    /// Panics when the number of distinct strings no longer fits a
    /// [`StrId`] (more than `u32::MAX - 1` entries).
    pub fn intern(&mut self, s: &str) -> StrId {
        if let Some(&id) = self.ids.get(s) {
            return id;
        }
        let id = StrId::new(self.entries.len()).expect("interner handle space exhausted");
        let stored: Box<str> = Box::from(s);
        self.entries.push(stored.clone());
        self.ids.insert(stored, id);
        id
    }

    /// The string behind a handle.
    ///
    /// A handle minted by a different tree's interner may be out of range
    /// here; that yields an empty string, not a panic.
    #[must_use]
    pub fn get(&self, id: StrId) -> &str {
        match self.entries.get(id.slot()) {
            Some(s) => s,
            None => "",
        }
    }

    /// The handle of an already-interned string, without interning it.
    #[must_use]
    pub fn find(&self, s: &str) -> Option<StrId> {
        self.ids.get(s).copied()
    }

    /// Number of distinct interned strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been interned yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
