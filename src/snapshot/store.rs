//! Process-lifetime cache of the synthesized object graph.
//!
//! Keys are object ids; values are pack-ready entries (type + payload).
//! The store is populated once by the snapshot walk and never mutated
//! afterwards; readers share it behind an `Arc` without locking.

use std::collections::HashMap;

use crate::{hash::ObjectHash, internal::pack::entry::Entry};

#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: HashMap<ObjectHash, Entry>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry under its own hash. Re-inserting an identical
    /// object (same content appearing twice in the tree) is a no-op.
    pub fn insert(&mut self, entry: Entry) {
        self.objects.entry(entry.hash).or_insert(entry);
    }

    pub fn get(&self, hash: &ObjectHash) -> Option<&Entry> {
        self.objects.get(hash)
    }

    pub fn contains(&self, hash: &ObjectHash) -> bool {
        self.objects.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over all stored entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.objects.values()
    }
}
