//! ConditionalModifierRegistry - live/dormant bookkeeping for conditional modifiers

use super::predicate::{PredicateContext, PredicateTrigger, PredicateWatchers, Subscription};
use super::ConditionalModifierDef;
use crate::error::CombatError;
use crate::modifier::{ConditionalKey, ModifierSource, ModifierTable, SourceId};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// Whether a registered conditional currently contributes its deltas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalState {
    Dormant,
    Live,
}

impl ConditionalState {
    fn from_met(met: bool) -> Self {
        if met {
            ConditionalState::Live
        } else {
            ConditionalState::Dormant
        }
    }
}

/// Mutable access to both combatants' tables
pub struct CombatantTables<'a> {
    pub player: &'a mut ModifierTable,
    pub enemy: &'a mut ModifierTable,
}

/// Conditionals offered by one source during a full rebuild
#[derive(Debug, Clone, Copy)]
pub struct ConditionalCandidate<'a> {
    pub origin: SourceId,
    pub conditionals: &'a [ConditionalModifierDef],
    pub negative_multiplier: f64,
    pub positive_multiplier: f64,
}

#[derive(Debug)]
struct ActiveConditional {
    definition: ConditionalModifierDef,
    negative_multiplier: f64,
    positive_multiplier: f64,
    state: ConditionalState,
    subscription: Subscription,
}

impl ActiveConditional {
    fn apply(&self, key: ConditionalKey, tables: &mut CombatantTables<'_>) {
        let source = ModifierSource::Conditional(key);
        tables.player.add_modifiers(
            source,
            &self.definition.modifiers,
            self.negative_multiplier,
            self.positive_multiplier,
        );
        tables.enemy.add_modifiers(
            source,
            &self.definition.enemy_modifiers,
            self.negative_multiplier,
            self.positive_multiplier,
        );
    }

    fn withdraw(key: ConditionalKey, tables: &mut CombatantTables<'_>) {
        let source = ModifierSource::Conditional(key);
        tables.player.remove_modifiers(source);
        tables.enemy.remove_modifiers(source);
    }
}

/// Every conditional modifier instantiated for one fight manager
#[derive(Debug, Default)]
pub struct ConditionalModifierRegistry {
    active: BTreeMap<ConditionalKey, ActiveConditional>,
    watchers: PredicateWatchers,
}

impl ConditionalModifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate the conditionals of one source.
    ///
    /// Each predicate is evaluated once for its initial state and a listener is
    /// subscribed. Conditionals that start live are folded into the tables.
    /// Re-adding a source replaces its previous conditionals.
    pub fn add_active_conditional_modifiers(
        &mut self,
        origin: SourceId,
        conditionals: &[ConditionalModifierDef],
        negative_multiplier: f64,
        positive_multiplier: f64,
        ctx: &PredicateContext,
        tables: &mut CombatantTables<'_>,
    ) -> usize {
        self.remove_active_conditional_modifiers(origin, tables);

        let mut registered = 0;
        for (index, definition) in conditionals.iter().enumerate() {
            let Ok(index) = u32::try_from(index) else {
                warn!(?origin, dropped = conditionals.len() - index, "too many conditional modifiers on one source");
                break;
            };
            let key = ConditionalKey { origin, index };
            let state = ConditionalState::from_met(definition.condition.evaluate(ctx));
            let subscription = definition.condition.subscribe(&mut self.watchers, key);
            let record = ActiveConditional {
                definition: definition.clone(),
                negative_multiplier,
                positive_multiplier,
                state,
                subscription,
            };
            if state == ConditionalState::Live {
                record.apply(key, tables);
            }
            trace!(?key, ?state, "registered conditional modifier");
            self.active.insert(key, record);
            registered += 1;
        }
        registered
    }

    /// Predicate-changed callback.
    ///
    /// Returns whether the conditional flipped. Repeating the current state is a
    /// no-op; an unregistered key is a contract violation.
    pub fn on_predicate_changed(
        &mut self,
        key: ConditionalKey,
        met: bool,
        tables: &mut CombatantTables<'_>,
    ) -> Result<bool, CombatError> {
        let record = self
            .active
            .get_mut(&key)
            .ok_or(CombatError::ConditionalNotActive(key))?;

        let next = ConditionalState::from_met(met);
        if record.state == next {
            return Ok(false);
        }

        match next {
            ConditionalState::Live => record.apply(key, tables),
            ConditionalState::Dormant => ActiveConditional::withdraw(key, tables),
        }
        record.state = next;
        debug!(?key, ?next, "conditional modifier changed state");
        Ok(true)
    }

    /// Change the multipliers of a registered conditional.
    ///
    /// A live conditional is rescaled in place through the table's update path.
    pub fn update_conditional_modifier_mult(
        &mut self,
        key: ConditionalKey,
        negative_multiplier: f64,
        positive_multiplier: f64,
        tables: &mut CombatantTables<'_>,
    ) -> Result<(), CombatError> {
        let record = self
            .active
            .get_mut(&key)
            .ok_or(CombatError::ConditionalNotActive(key))?;

        record.negative_multiplier = negative_multiplier;
        record.positive_multiplier = positive_multiplier;
        if record.state == ConditionalState::Live {
            let source = ModifierSource::Conditional(key);
            tables.player.update_modifiers(source, negative_multiplier, positive_multiplier);
            tables.enemy.update_modifiers(source, negative_multiplier, positive_multiplier);
        }
        Ok(())
    }

    /// Destroy one conditional, unsubscribing its listener
    pub fn remove_active_conditional(
        &mut self,
        key: ConditionalKey,
        tables: &mut CombatantTables<'_>,
    ) -> Result<(), CombatError> {
        let record = self
            .active
            .remove(&key)
            .ok_or(CombatError::ConditionalNotActive(key))?;
        self.destroy(key, record, tables);
        Ok(())
    }

    /// Destroy every conditional contributed by `origin`. Returns how many were removed.
    pub fn remove_active_conditional_modifiers(
        &mut self,
        origin: SourceId,
        tables: &mut CombatantTables<'_>,
    ) -> usize {
        let keys: Vec<ConditionalKey> = self
            .active
            .keys()
            .filter(|key| key.origin == origin)
            .copied()
            .collect();
        for key in &keys {
            if let Some(record) = self.active.remove(key) {
                self.destroy(*key, record, tables);
            }
        }
        keys.len()
    }

    /// Destroy every conditional. Every subscription handle is released.
    pub fn unregister_all(&mut self, tables: &mut CombatantTables<'_>) -> usize {
        let active = std::mem::take(&mut self.active);
        let count = active.len();
        for (key, record) in active {
            self.destroy(key, record, tables);
        }
        count
    }

    fn destroy(&mut self, key: ConditionalKey, record: ActiveConditional, tables: &mut CombatantTables<'_>) {
        if record.state == ConditionalState::Live {
            ActiveConditional::withdraw(key, tables);
        }
        self.watchers.unsubscribe(record.subscription);
    }

    /// Re-evaluate every conditional listening to one of `fired`.
    ///
    /// Returns the keys that flipped.
    pub fn refresh(
        &mut self,
        fired: &[PredicateTrigger],
        ctx: &PredicateContext,
        tables: &mut CombatantTables<'_>,
    ) -> Vec<ConditionalKey> {
        let mut flipped = Vec::new();
        for key in self.watchers.listeners_for(fired) {
            let Some(record) = self.active.get(&key) else {
                continue;
            };
            let met = record.definition.condition.evaluate(ctx);
            if let Ok(true) = self.on_predicate_changed(key, met, tables) {
                flipped.push(key);
            }
        }
        flipped
    }

    /// Full rebuild: unregister everything, then instantiate every candidate
    pub fn compute_active_conditional_modifiers(
        &mut self,
        candidates: &[ConditionalCandidate<'_>],
        ctx: &PredicateContext,
        tables: &mut CombatantTables<'_>,
    ) {
        self.unregister_all(tables);
        for candidate in candidates {
            self.add_active_conditional_modifiers(
                candidate.origin,
                candidate.conditionals,
                candidate.negative_multiplier,
                candidate.positive_multiplier,
                ctx,
                tables,
            );
        }
    }

    pub fn state(&self, key: ConditionalKey) -> Option<ConditionalState> {
        self.active.get(&key).map(|record| record.state)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ConditionalKey> {
        self.active.keys()
    }

    pub fn live_count(&self) -> usize {
        self.active
            .values()
            .filter(|record| record.state == ConditionalState::Live)
            .count()
    }

    /// Number of predicate listeners still subscribed
    pub fn subscription_count(&self) -> usize {
        self.watchers.len()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{CombatantView, Predicate};
    use crate::modifier::{ModifierId, ModifierValue};
    use crate::types::CombatantRole;

    fn low_hp_def() -> ConditionalModifierDef {
        ConditionalModifierDef {
            condition: Predicate::HitpointsBelow {
                target: CombatantRole::Player,
                percent: 50.0,
            },
            modifiers: vec![ModifierValue::new(ModifierId::DamageDealtPercent, 20.0)],
            enemy_modifiers: vec![ModifierValue::new(ModifierId::DamageTakenPercent, -10.0)],
        }
    }

    fn ctx(hitpoints: f64) -> PredicateContext {
        PredicateContext {
            player: CombatantView {
                hitpoints,
                max_hitpoints: 100.0,
                ..CombatantView::default()
            },
            enemy: CombatantView::default(),
        }
    }

    fn key() -> ConditionalKey {
        ConditionalKey {
            origin: SourceId::Gamemode,
            index: 0,
        }
    }

    #[test]
    fn test_initial_state_follows_predicate() {
        let (mut player, mut enemy) = (ModifierTable::new(), ModifierTable::new());
        let mut tables = CombatantTables { player: &mut player, enemy: &mut enemy };
        let mut registry = ConditionalModifierRegistry::new();

        registry.add_active_conditional_modifiers(SourceId::Gamemode, &[low_hp_def()], 1.0, 1.0, &ctx(30.0), &mut tables);

        assert_eq!(registry.state(key()), Some(ConditionalState::Live));
        assert!((player.get(ModifierId::DamageDealtPercent) - 20.0).abs() < f64::EPSILON);
        assert!((enemy.get(ModifierId::DamageTakenPercent) + 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_keys_beyond_u16_range_stay_distinct() {
        let (mut player, mut enemy) = (ModifierTable::new(), ModifierTable::new());
        let mut tables = CombatantTables { player: &mut player, enemy: &mut enemy };
        let mut registry = ConditionalModifierRegistry::new();
        let defs = vec![low_hp_def(); 70_000];

        let registered =
            registry.add_active_conditional_modifiers(SourceId::Gamemode, &defs, 1.0, 1.0, &ctx(80.0), &mut tables);

        assert_eq!(registered, 70_000);
        assert_eq!(registry.len(), 70_000);
        let last = ConditionalKey {
            origin: SourceId::Gamemode,
            index: 69_999,
        };
        assert_eq!(registry.state(last), Some(ConditionalState::Dormant));
    }

    #[test]
    fn test_same_state_callback_is_noop() {
        let (mut player, mut enemy) = (ModifierTable::new(), ModifierTable::new());
        let mut tables = CombatantTables { player: &mut player, enemy: &mut enemy };
        let mut registry = ConditionalModifierRegistry::new();
        registry.add_active_conditional_modifiers(SourceId::Gamemode, &[low_hp_def()], 1.0, 1.0, &ctx(80.0), &mut tables);
        tables.player.clear_dirty();

        for _ in 0..3 {
            assert_eq!(registry.on_predicate_changed(key(), false, &mut tables), Ok(false));
        }
        assert!(!tables.player.is_dirty());
        assert!(tables.player.get(ModifierId::DamageDealtPercent).abs() < f64::EPSILON);
    }

    #[test]
    fn test_flip_live_then_dormant() {
        let (mut player, mut enemy) = (ModifierTable::new(), ModifierTable::new());
        let mut tables = CombatantTables { player: &mut player, enemy: &mut enemy };
        let mut registry = ConditionalModifierRegistry::new();
        registry.add_active_conditional_modifiers(SourceId::Gamemode, &[low_hp_def()], 1.0, 1.0, &ctx(80.0), &mut tables);

        let flipped = registry.refresh(&[PredicateTrigger::Hitpoints(CombatantRole::Player)], &ctx(10.0), &mut tables);
        assert_eq!(flipped, vec![key()]);
        assert!((tables.player.get(ModifierId::DamageDealtPercent) - 20.0).abs() < f64::EPSILON);

        let flipped = registry.refresh(&[PredicateTrigger::Hitpoints(CombatantRole::Player)], &ctx(90.0), &mut tables);
        assert_eq!(flipped, vec![key()]);
        assert!(tables.player.get(ModifierId::DamageDealtPercent).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unrelated_trigger_does_not_reevaluate() {
        let (mut player, mut enemy) = (ModifierTable::new(), ModifierTable::new());
        let mut tables = CombatantTables { player: &mut player, enemy: &mut enemy };
        let mut registry = ConditionalModifierRegistry::new();
        registry.add_active_conditional_modifiers(SourceId::Gamemode, &[low_hp_def()], 1.0, 1.0, &ctx(80.0), &mut tables);

        let flipped = registry.refresh(&[PredicateTrigger::Barrier(CombatantRole::Player)], &ctx(10.0), &mut tables);
        assert!(flipped.is_empty());
        assert_eq!(registry.state(key()), Some(ConditionalState::Dormant));
    }

    #[test]
    fn test_update_mult_while_live() {
        let (mut player, mut enemy) = (ModifierTable::new(), ModifierTable::new());
        let mut tables = CombatantTables { player: &mut player, enemy: &mut enemy };
        let mut registry = ConditionalModifierRegistry::new();
        registry.add_active_conditional_modifiers(SourceId::Gamemode, &[low_hp_def()], 1.0, 1.0, &ctx(10.0), &mut tables);

        registry.update_conditional_modifier_mult(key(), 2.0, 3.0, &mut tables).unwrap();
        assert!((tables.player.get(ModifierId::DamageDealtPercent) - 60.0).abs() < f64::EPSILON);
        assert!((tables.enemy.get(ModifierId::DamageTakenPercent) + 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_update_mult_while_dormant_applies_on_flip() {
        let (mut player, mut enemy) = (ModifierTable::new(), ModifierTable::new());
        let mut tables = CombatantTables { player: &mut player, enemy: &mut enemy };
        let mut registry = ConditionalModifierRegistry::new();
        registry.add_active_conditional_modifiers(SourceId::Gamemode, &[low_hp_def()], 1.0, 1.0, &ctx(90.0), &mut tables);

        registry.update_conditional_modifier_mult(key(), 1.0, 2.0, &mut tables).unwrap();
        assert!(tables.player.get(ModifierId::DamageDealtPercent).abs() < f64::EPSILON);

        registry.on_predicate_changed(key(), true, &mut tables).unwrap();
        assert!((tables.player.get(ModifierId::DamageDealtPercent) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_key_is_contract_violation() {
        let (mut player, mut enemy) = (ModifierTable::new(), ModifierTable::new());
        let mut tables = CombatantTables { player: &mut player, enemy: &mut enemy };
        let mut registry = ConditionalModifierRegistry::new();

        assert_eq!(
            registry.on_predicate_changed(key(), true, &mut tables),
            Err(CombatError::ConditionalNotActive(key()))
        );
        assert!(registry.update_conditional_modifier_mult(key(), 1.0, 1.0, &mut tables).is_err());
        assert!(registry.remove_active_conditional(key(), &mut tables).is_err());
    }

    #[test]
    fn test_unregister_all_releases_every_subscription() {
        let (mut player, mut enemy) = (ModifierTable::new(), ModifierTable::new());
        let mut tables = CombatantTables { player: &mut player, enemy: &mut enemy };
        let mut registry = ConditionalModifierRegistry::new();
        let defs = [low_hp_def(), low_hp_def()];
        registry.add_active_conditional_modifiers(SourceId::Gamemode, &defs, 1.0, 1.0, &ctx(10.0), &mut tables);
        assert_eq!(registry.subscription_count(), 2);

        assert_eq!(registry.unregister_all(&mut tables), 2);
        assert_eq!(registry.subscription_count(), 0);
        assert!(tables.player.is_empty());
        assert!(tables.enemy.is_empty());
    }

    #[test]
    fn test_full_rebuild_is_equivalent() {
        let (mut player, mut enemy) = (ModifierTable::new(), ModifierTable::new());
        let mut tables = CombatantTables { player: &mut player, enemy: &mut enemy };
        let mut registry = ConditionalModifierRegistry::new();
        let defs = [low_hp_def()];
        let candidates = [ConditionalCandidate {
            origin: SourceId::Gamemode,
            conditionals: &defs,
            negative_multiplier: 1.5,
            positive_multiplier: 1.0,
        }];

        registry.compute_active_conditional_modifiers(&candidates, &ctx(10.0), &mut tables);
        let first = (tables.player.snapshot(), tables.enemy.snapshot());
        registry.compute_active_conditional_modifiers(&candidates, &ctx(10.0), &mut tables);
        let second = (tables.player.snapshot(), tables.enemy.snapshot());

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.subscription_count(), 1);
    }
}
