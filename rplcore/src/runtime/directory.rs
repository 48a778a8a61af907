//! Hierarchical variable store.

use crate::{object::Symbol, runtime::heap::Handle};

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Value(Handle),
    Directory(Directory),
}

/// Named entries in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directory {
    entries: Vec<(Symbol, Entry)>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &Symbol, case_sensitive: bool) -> Option<usize> {
        self.entries
            .iter()
            .position(|(entry, _)| entry.matches(name, case_sensitive))
    }

    pub fn get(&self, name: &Symbol, case_sensitive: bool) -> Option<&Entry> {
        self.position(name, case_sensitive)
            .map(|index| &self.entries[index].1)
    }

    pub fn get_mut(&mut self, name: &Symbol, case_sensitive: bool) -> Option<&mut Entry> {
        self.position(name, case_sensitive)
            .map(|index| &mut self.entries[index].1)
    }

    /// Insert or replace an entry, returning the previous one.
    pub fn insert(&mut self, name: Symbol, entry: Entry, case_sensitive: bool) -> Option<Entry> {
        match self.position(&name, case_sensitive) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].1, entry)),
            None => {
                self.entries.push((name, entry));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &Symbol, case_sensitive: bool) -> Option<Entry> {
        self.position(name, case_sensitive)
            .map(|index| self.entries.remove(index).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.iter().map(|(name, _)| name)
    }

    /// Every value handle in this directory and its subdirectories.
    pub fn handles(&self, out: &mut Vec<Handle>) {
        for (_, entry) in &self.entries {
            match entry {
                Entry::Value(handle) => out.push(*handle),
                Entry::Directory(dir) => dir.handles(out),
            }
        }
    }
}
