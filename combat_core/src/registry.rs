//! Dense content registries addressed by typed ids
//!
//! Content is loaded once into a `Registry<T>` per kind. Every cross reference
//! between content kinds is resolved to an `Id<T>` at load time, so nothing
//! downstream of the loader works with raw strings.

use crate::config::ConfigError;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A piece of content that lives in a registry
pub trait ContentDef {
    /// Human readable kind, used in error messages
    const KIND: &'static str;

    /// Namespaced key the definition is registered under
    fn key(&self) -> &str;
}

/// Index into a `Registry<T>`
pub struct Id<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    fn new(index: usize) -> Self {
        Id {
            index: index as u32,
            _marker: PhantomData,
        }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index)
    }
}

/// Vector of definitions plus a key → index map
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: Vec<T>,
    by_key: HashMap<String, Id<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            entries: Vec::new(),
            by_key: HashMap::new(),
        }
    }
}

impl<T: ContentDef> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. Keys must be unique within a registry.
    pub fn register(&mut self, def: T) -> Result<Id<T>, ConfigError> {
        if self.by_key.contains_key(def.key()) {
            return Err(ConfigError::DuplicateId {
                kind: T::KIND,
                id: def.key().to_string(),
            });
        }
        let id = Id::new(self.entries.len());
        self.by_key.insert(def.key().to_string(), id);
        self.entries.push(def);
        Ok(id)
    }

    /// Get a definition by id.
    ///
    /// Ids are only handed out by the registry that owns them, so indexing
    /// cannot go out of bounds for ids obtained from `self`.
    pub fn get(&self, id: Id<T>) -> &T {
        &self.entries[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.entries[id.index()]
    }

    /// Find a definition's id by key
    pub fn lookup(&self, key: &str) -> Option<Id<T>> {
        self.by_key.get(key).copied()
    }

    /// Like `lookup`, but an unknown key is a load error
    pub fn resolve(&self, key: &str) -> Result<Id<T>, ConfigError> {
        self.lookup(key).ok_or_else(|| ConfigError::UnknownReference {
            kind: T::KIND,
            name: key.to_string(),
        })
    }

    /// Key of a registered definition
    pub fn key_of(&self, id: Id<T>) -> &str {
        self.get(id).key()
    }

    pub fn ids(&self) -> impl Iterator<Item = Id<T>> {
        (0..self.entries.len()).map(Id::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        self.entries.iter().enumerate().map(|(i, def)| (Id::new(i), def))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Thing(&'static str);

    impl ContentDef for Thing {
        const KIND: &'static str = "thing";

        fn key(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        let a = registry.register(Thing("a")).unwrap();
        let b = registry.register(Thing("b")).unwrap();

        assert_ne!(a, b);
        assert_eq!(registry.lookup("b"), Some(b));
        assert_eq!(registry.key_of(a), "a");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut registry = Registry::new();
        registry.register(Thing("a")).unwrap();
        let err = registry.register(Thing("a")).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateId { kind: "thing", .. }));
    }

    #[test]
    fn test_resolve_unknown_key() {
        let registry: Registry<Thing> = Registry::new();
        let err = registry.resolve("missing").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
