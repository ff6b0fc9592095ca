//! ModifierTable - per-combatant accumulator of scoped modifier values

use super::{ModifierId, ModifierScope, ModifierSource, ModifierValue};
use std::collections::BTreeMap;

/// A single stored modifier contribution
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierEntry {
    pub source: ModifierSource,
    pub modifier: ModifierId,
    pub scope: ModifierScope,
    /// Raw value before scaling
    pub value: f64,
    pub negative_multiplier: f64,
    pub positive_multiplier: f64,
}

impl ModifierEntry {
    /// Value after applying the sign-dependent multiplier
    pub fn scaled_value(&self) -> f64 {
        if self.value < 0.0 {
            self.value * self.negative_multiplier
        } else {
            self.value * self.positive_multiplier
        }
    }
}

/// Accumulates modifier values from many independently removable sources.
///
/// Entries are indexed twice: by source, so removing a source only touches
/// that source's entries, and by `(modifier, scope, source)`, so totals are
/// summed in a fixed order and repeated teardown/rebuild is bit-identical.
#[derive(Debug, Clone, Default)]
pub struct ModifierTable {
    by_source: BTreeMap<ModifierSource, Vec<ModifierEntry>>,
    totals: BTreeMap<ModifierId, BTreeMap<ModifierScope, BTreeMap<ModifierSource, f64>>>,
    dirty: bool,
}

impl ModifierTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the modifiers of `source`, replacing anything it contributed before.
    ///
    /// Duplicate `(id, scope)` pairs in `values` are summed into one entry.
    pub fn add_modifiers(
        &mut self,
        source: impl Into<ModifierSource>,
        values: &[ModifierValue],
        negative_multiplier: f64,
        positive_multiplier: f64,
    ) {
        let source = source.into();
        self.remove_modifiers(source);
        if values.is_empty() {
            return;
        }

        let mut merged: BTreeMap<(ModifierId, ModifierScope), f64> = BTreeMap::new();
        for value in values {
            *merged.entry((value.id, value.scope)).or_insert(0.0) += value.value;
        }

        let entries: Vec<ModifierEntry> = merged
            .into_iter()
            .map(|((modifier, scope), value)| ModifierEntry {
                source,
                modifier,
                scope,
                value,
                negative_multiplier,
                positive_multiplier,
            })
            .collect();

        for entry in &entries {
            self.totals
                .entry(entry.modifier)
                .or_default()
                .entry(entry.scope)
                .or_default()
                .insert(source, entry.scaled_value());
        }
        self.by_source.insert(source, entries);
        self.dirty = true;
    }

    /// Remove every entry contributed by `source`.
    ///
    /// Returns whether anything was removed. Removing an unknown source is a no-op.
    pub fn remove_modifiers(&mut self, source: impl Into<ModifierSource>) -> bool {
        let source = source.into();
        let Some(entries) = self.by_source.remove(&source) else {
            return false;
        };

        for entry in &entries {
            let Some(scopes) = self.totals.get_mut(&entry.modifier) else {
                continue;
            };
            if let Some(sources) = scopes.get_mut(&entry.scope) {
                sources.remove(&source);
                if sources.is_empty() {
                    scopes.remove(&entry.scope);
                }
            }
            if scopes.is_empty() {
                self.totals.remove(&entry.modifier);
            }
        }
        self.dirty = true;
        true
    }

    /// Rescale an existing source in place. A no-op for unknown sources.
    pub fn update_modifiers(
        &mut self,
        source: impl Into<ModifierSource>,
        negative_multiplier: f64,
        positive_multiplier: f64,
    ) -> bool {
        let source = source.into();
        let Some(entries) = self.by_source.get_mut(&source) else {
            return false;
        };

        for entry in entries.iter_mut() {
            entry.negative_multiplier = negative_multiplier;
            entry.positive_multiplier = positive_multiplier;
            if let Some(slot) = self
                .totals
                .get_mut(&entry.modifier)
                .and_then(|scopes| scopes.get_mut(&entry.scope))
                .and_then(|sources| sources.get_mut(&source))
            {
                *slot = entry.scaled_value();
            }
        }
        self.dirty = true;
        true
    }

    /// Sum of every entry for `id` whose scope applies to `query`
    pub fn get_value(&self, id: ModifierId, query: ModifierScope) -> f64 {
        let Some(scopes) = self.totals.get(&id) else {
            return 0.0;
        };
        scopes
            .iter()
            .filter(|(scope, _)| scope.matches(&query))
            .flat_map(|(_, sources)| sources.values())
            .sum()
    }

    /// Shorthand for an unscoped query
    pub fn get(&self, id: ModifierId) -> f64 {
        self.get_value(id, ModifierScope::ANY)
    }

    /// Entries contributed by one source
    pub fn entries(&self, source: impl Into<ModifierSource>) -> &[ModifierEntry] {
        self.by_source
            .get(&source.into())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_source(&self, source: impl Into<ModifierSource>) -> bool {
        self.by_source.contains_key(&source.into())
    }

    pub fn sources(&self) -> impl Iterator<Item = &ModifierSource> {
        self.by_source.keys()
    }

    /// Totals per `(modifier, scope)` in deterministic order
    pub fn snapshot(&self) -> Vec<(ModifierId, ModifierScope, f64)> {
        self.totals
            .iter()
            .flat_map(|(id, scopes)| {
                scopes
                    .iter()
                    .map(move |(scope, sources)| (*id, *scope, sources.values().sum()))
            })
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }

    pub fn clear(&mut self) {
        if !self.by_source.is_empty() {
            self.dirty = true;
        }
        self.by_source.clear();
        self.totals.clear();
    }
}
