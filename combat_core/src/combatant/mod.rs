//! Combatant - one side of a fight and its stat pipeline
//!
//! Player and enemy share one struct; role specific data lives in [`Role`].
//! Stats are computed in passes driven by the fight manager:
//! 1. pre-conditional: levels, equipment totals, attack/damage type
//! 2. conditional: handled by the conditional registry
//! 3. merge: every live source folded into the modifier table
//! 4. post-modifier: derived stats read purely from the table

mod enemy;
mod player;
mod stats;

pub use enemy::EnemyData;
pub use player::PlayerData;
pub use stats::{BaseStats, CombatStats, StatValue};

use crate::condition::CombatantView;
use crate::config::{CombatConstants, GameData};
use crate::effect::{has_effect_kind, ActiveEffect, EffectApplicator, EffectKind};
use crate::modifier::{ModifierId, ModifierScope, ModifierTable, ModifierValue, SourceId};
use crate::timer::{Timer, TimerKind};
use crate::types::{AttackType, ByAttackType, CombatantRole, DamageType};
use rand::Rng;
use std::collections::BTreeSet;

/// Role specific state
#[derive(Debug, Clone)]
pub enum Role {
    Player(PlayerData),
    Enemy(EnemyData),
}

/// Modifiers one source contributes to one combatant during the merge pass
#[derive(Debug, Clone, Copy)]
pub struct Contribution<'a> {
    pub source: SourceId,
    pub values: &'a [ModifierValue],
    pub negative_multiplier: f64,
    pub positive_multiplier: f64,
}

impl<'a> Contribution<'a> {
    pub fn new(source: SourceId, values: &'a [ModifierValue]) -> Self {
        Contribution {
            source,
            values,
            negative_multiplier: 1.0,
            positive_multiplier: 1.0,
        }
    }
}

/// Damage taken split between barrier and hitpoints
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageApplied {
    pub barrier_absorbed: f64,
    pub hitpoints_lost: f64,
}

#[derive(Debug, Clone)]
pub struct Combatant {
    pub(crate) modifiers: ModifierTable,
    /// Direct sources folded in by the last merge pass
    merged_sources: BTreeSet<SourceId>,
    pub(crate) base: BaseStats,
    pub(crate) stats: CombatStats,
    pub(crate) hitpoints: f64,
    pub(crate) barrier: f64,
    /// Opponent for the duration of one fight
    pub(crate) target: Option<CombatantRole>,
    pub(crate) action_timer: Timer,
    pub(crate) turns_taken: u32,
    pub(crate) effects: Vec<ActiveEffect>,
    pub(crate) applicators: Vec<EffectApplicator>,
    pub(crate) role: Role,
}

impl Combatant {
    fn with_role(role: Role) -> Self {
        Combatant {
            modifiers: ModifierTable::new(),
            merged_sources: BTreeSet::new(),
            base: BaseStats::default(),
            stats: CombatStats::default(),
            hitpoints: 0.0,
            barrier: 0.0,
            target: None,
            action_timer: Timer::new(TimerKind::Action),
            turns_taken: 0,
            effects: Vec::new(),
            applicators: Vec::new(),
            role,
        }
    }

    pub fn role(&self) -> CombatantRole {
        match self.role {
            Role::Player(_) => CombatantRole::Player,
            Role::Enemy(_) => CombatantRole::Enemy,
        }
    }

    pub fn modifiers(&self) -> &ModifierTable {
        &self.modifiers
    }

    pub fn stats(&self) -> &CombatStats {
        &self.stats
    }

    pub fn base_stats(&self) -> &BaseStats {
        &self.base
    }

    pub fn hitpoints(&self) -> f64 {
        self.hitpoints
    }

    pub fn barrier(&self) -> f64 {
        self.barrier
    }

    pub fn target(&self) -> Option<CombatantRole> {
        self.target
    }

    pub fn attack_type(&self) -> AttackType {
        self.base.attack_type
    }

    pub fn damage_type(&self) -> DamageType {
        self.base.damage_type
    }

    pub fn action_timer(&self) -> &Timer {
        &self.action_timer
    }

    pub fn turns_taken(&self) -> u32 {
        self.turns_taken
    }

    pub fn effects(&self) -> &[ActiveEffect] {
        &self.effects
    }

    pub fn applicators(&self) -> &[EffectApplicator] {
        &self.applicators
    }

    pub fn is_dead(&self) -> bool {
        self.hitpoints <= 0.0
    }

    /// Pass 1: base stats from levels, equipment or monster definition
    pub(crate) fn compute_pre_conditional(&mut self, data: &GameData, rng: &mut impl Rng) {
        let attack_type = self.compute_attack_type(data, rng);
        match &mut self.role {
            Role::Player(player) => self.base = player.compute_base_stats(data),
            Role::Enemy(enemy) => self.base = enemy.compute_base_stats(data, attack_type),
        }
    }

    /// Pass 3: fold every direct source into the table, removing sources that vanished
    pub(crate) fn reconcile_sources(&mut self, contributions: &[Contribution<'_>]) {
        let current: BTreeSet<SourceId> = contributions
            .iter()
            .filter(|c| !c.values.is_empty())
            .map(|c| c.source)
            .collect();

        for stale in self.merged_sources.difference(&current) {
            self.modifiers.remove_modifiers(*stale);
        }
        for contribution in contributions {
            self.modifiers.add_modifiers(
                contribution.source,
                contribution.values,
                contribution.negative_multiplier,
                contribution.positive_multiplier,
            );
        }
        self.merged_sources = current;
    }

    /// Pass 4: derive every stat from base stats and the modifier table.
    ///
    /// Idempotent. The only side effect is clamping current hitpoints and
    /// barrier to the new maxima.
    pub fn compute_post_modifier_stats(&mut self, constants: &CombatConstants) {
        let base = &self.base;
        let table = &self.modifiers;
        let attack_type = base.attack_type;
        let scope = ModifierScope::exact(base.damage_type, attack_type);
        let value = |id: ModifierId| table.get_value(id, scope);

        let max_hitpoints = StatValue::with_base(base.levels.hitpoints as f64 * constants.hitpoints_per_level)
            .add_flat(value(ModifierId::FlatMaxHitpoints))
            .add_increased_percent(value(ModifierId::MaxHitpointsPercent))
            .compute()
            .floor()
            .max(1.0);

        let max_barrier = StatValue::with_base(max_hitpoints * base.barrier_percent / 100.0)
            .add_flat(value(ModifierId::FlatMaxBarrier))
            .add_increased_percent(value(ModifierId::MaxBarrierPercent))
            .compute()
            .floor()
            .max(0.0);

        let effective_accuracy = base.levels.accuracy_level(attack_type) as f64 + 9.0;
        let accuracy = StatValue::with_base(effective_accuracy * (base.equipment.accuracy(attack_type) + 64.0))
            .add_increased_percent(value(ModifierId::accuracy(attack_type)))
            .compute()
            .max(0.0);

        let evasion = ByAttackType::from_fn(|defending| {
            let effective_defence = base.levels.evasion_level(defending) + 9.0;
            StatValue::with_base(effective_defence * (base.equipment.defence(defending) + 64.0))
                .add_increased_percent(
                    table.get_value(ModifierId::evasion(defending), ModifierScope::category(defending)),
                )
                .compute()
                .max(0.0)
        });

        let effective_strength = base.levels.damage_level(attack_type) as f64 + 9.0;
        let strength_bonus = base.equipment.strength(attack_type) + value(ModifierId::strength(attack_type));
        let max_hit_base = (1.3
            + effective_strength / 10.0
            + strength_bonus / 80.0
            + effective_strength * strength_bonus / 640.0)
            * constants.damage_scale;
        let max_hit = StatValue::with_base(max_hit_base)
            .add_flat(value(ModifierId::FlatMaxHit))
            .add_increased_percent(value(ModifierId::MaxHitPercent))
            .compute()
            .floor()
            .max(1.0);

        let attack_interval_ms = StatValue::with_base(base.attack_interval_ms)
            .add_flat(value(ModifierId::FlatAttackInterval))
            .add_increased_percent(value(ModifierId::AttackIntervalPercent))
            .compute()
            .max(constants.min_attack_interval_ms);

        let damage_reduction = (base.equipment.damage_reduction + value(ModifierId::FlatDamageReduction))
            .clamp(0.0, constants.max_damage_reduction);

        self.stats = CombatStats {
            max_hitpoints,
            max_barrier,
            accuracy,
            evasion,
            max_hit,
            attack_interval_ms,
            damage_reduction,
            lifesteal: value(ModifierId::LifestealPercent).max(0.0),
            damage_dealt_multiplier: (1.0 + value(ModifierId::DamageDealtPercent) / 100.0).max(0.0),
            damage_taken_multiplier: (1.0 + value(ModifierId::DamageTakenPercent) / 100.0).max(0.0),
        };

        self.hitpoints = self.hitpoints.min(max_hitpoints);
        self.barrier = self.barrier.min(max_barrier);
        self.modifiers.clear_dirty();
    }

    /// Restore hitpoints and barrier to their maxima
    pub(crate) fn fill(&mut self) {
        self.hitpoints = self.stats.max_hitpoints;
        self.barrier = self.stats.max_barrier;
    }

    /// Barrier absorbs damage before hitpoints
    pub(crate) fn apply_damage(&mut self, amount: f64) -> DamageApplied {
        let mut remaining = amount.max(0.0);
        let barrier_absorbed = remaining.min(self.barrier);
        self.barrier -= barrier_absorbed;
        remaining -= barrier_absorbed;

        let hitpoints_lost = remaining.min(self.hitpoints.max(0.0));
        self.hitpoints = (self.hitpoints - remaining).max(0.0);
        DamageApplied {
            barrier_absorbed,
            hitpoints_lost,
        }
    }

    /// Heal up to max hitpoints, returning the amount healed. The dead stay dead.
    pub(crate) fn heal(&mut self, amount: f64) -> f64 {
        if self.is_dead() {
            return 0.0;
        }
        let before = self.hitpoints;
        self.hitpoints = (self.hitpoints + amount.max(0.0)).min(self.stats.max_hitpoints);
        self.hitpoints - before
    }

    /// Read-only view for predicate evaluation
    pub fn view(&self) -> CombatantView {
        CombatantView {
            hitpoints: self.hitpoints,
            max_hitpoints: self.stats.max_hitpoints,
            barrier: self.barrier,
            attack_type: self.base.attack_type,
            damage_type: self.base.damage_type,
            damage_effect_active: has_effect_kind(&self.effects, EffectKind::Damage),
            heal_effect_active: has_effect_kind(&self.effects, EffectKind::Heal),
        }
    }

    /// Stop acting: clear target, timers and effects
    pub(crate) fn end_fight(&mut self) {
        self.target = None;
        self.action_timer.stop();
        self.effects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Loadout;
    use crate::types::Levels;

    fn player() -> Combatant {
        let mut player = Combatant::new_player(Loadout {
            levels: Levels::uniform(10),
            ..Loadout::default()
        });
        let data = GameData::default();
        let mut rng = rand::thread_rng();
        player.compute_pre_conditional(&data, &mut rng);
        player
    }

    #[test]
    fn test_post_modifier_pass_is_idempotent() {
        let constants = CombatConstants::default();
        let mut player = player();
        player.modifiers.add_modifiers(
            SourceId::Gamemode,
            &[ModifierValue::new(ModifierId::MaxHitpointsPercent, 10.0)],
            1.0,
            1.0,
        );

        player.compute_post_modifier_stats(&constants);
        let first = *player.stats();
        player.compute_post_modifier_stats(&constants);

        assert_eq!(first, *player.stats());
        assert!((first.max_hitpoints - 110.0).abs() < f64::EPSILON);
        assert!(!player.modifiers().is_dirty());
    }

    #[test]
    fn test_hitpoints_clamped_to_new_max() {
        let constants = CombatConstants::default();
        let mut player = player();
        player.compute_post_modifier_stats(&constants);
        player.fill();
        assert!((player.hitpoints() - 100.0).abs() < f64::EPSILON);

        player.modifiers.add_modifiers(
            SourceId::Gamemode,
            &[ModifierValue::new(ModifierId::FlatMaxHitpoints, -30.0)],
            1.0,
            1.0,
        );
        player.compute_post_modifier_stats(&constants);
        assert!((player.hitpoints() - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reconcile_removes_vanished_sources() {
        let mut player = player();
        let values = [ModifierValue::new(ModifierId::FlatMaxHit, 3.0)];
        player.reconcile_sources(&[
            Contribution::new(SourceId::Gamemode, &values),
            Contribution::new(SourceId::Equipment(crate::types::EquipmentSlot::Ring), &values),
        ]);
        assert!((player.modifiers().get(ModifierId::FlatMaxHit) - 6.0).abs() < f64::EPSILON);

        player.reconcile_sources(&[Contribution::new(SourceId::Gamemode, &values)]);
        assert!((player.modifiers().get(ModifierId::FlatMaxHit) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_barrier_absorbs_before_hitpoints() {
        let mut player = player();
        player.hitpoints = 50.0;
        player.barrier = 10.0;

        let applied = player.apply_damage(25.0);
        assert!((applied.barrier_absorbed - 10.0).abs() < f64::EPSILON);
        assert!((applied.hitpoints_lost - 15.0).abs() < f64::EPSILON);
        assert!((player.hitpoints() - 35.0).abs() < f64::EPSILON);

        player.apply_damage(100.0);
        assert!(player.is_dead());
        assert!(player.hitpoints().abs() < f64::EPSILON);
    }

    #[test]
    fn test_heal_does_not_revive() {
        let mut player = player();
        player.hitpoints = 0.0;
        assert!(player.heal(50.0).abs() < f64::EPSILON);
        assert!(player.is_dead());
    }

    #[test]
    fn test_attack_interval_floor() {
        let constants = CombatConstants::default();
        let mut player = player();
        player.modifiers.add_modifiers(
            SourceId::Gamemode,
            &[ModifierValue::new(ModifierId::FlatAttackInterval, -10_000.0)],
            1.0,
            1.0,
        );
        player.compute_post_modifier_stats(&constants);
        assert!((player.stats().attack_interval_ms - constants.min_attack_interval_ms).abs() < f64::EPSILON);
    }
}
