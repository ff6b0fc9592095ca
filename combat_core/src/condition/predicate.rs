//! Predicates - subscribable boolean conditions over fight state

use crate::effect::EffectKind;
use crate::modifier::ConditionalKey;
use crate::types::{AttackType, CombatantRole, DamageType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Condition that decides whether a conditional modifier is live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Hitpoints strictly below `percent` of max hitpoints
    HitpointsBelow { target: CombatantRole, percent: f64 },
    /// Hitpoints at or above `percent` of max hitpoints
    HitpointsAbove { target: CombatantRole, percent: f64 },
    BarrierActive { target: CombatantRole },
    EffectActive { target: CombatantRole, kind: EffectKind },
    AttackTypeIs { target: CombatantRole, attack_type: AttackType },
    DamageTypeIs { target: CombatantRole, damage_type: DamageType },
    Not { condition: Box<Predicate> },
    All { conditions: Vec<Predicate> },
    Any { conditions: Vec<Predicate> },
}

/// Kind of state change a predicate listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PredicateTrigger {
    Hitpoints(CombatantRole),
    Barrier(CombatantRole),
    Effects(CombatantRole),
    /// Enemy spawned or attack/damage type was recomputed
    Spawn,
}

/// The fields of one combatant that predicates can read
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CombatantView {
    pub hitpoints: f64,
    pub max_hitpoints: f64,
    pub barrier: f64,
    pub attack_type: AttackType,
    pub damage_type: DamageType,
    pub damage_effect_active: bool,
    pub heal_effect_active: bool,
}

/// Snapshot of both combatants taken before predicates are evaluated
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PredicateContext {
    pub player: CombatantView,
    pub enemy: CombatantView,
}

impl PredicateContext {
    pub fn view(&self, role: CombatantRole) -> &CombatantView {
        match role {
            CombatantRole::Player => &self.player,
            CombatantRole::Enemy => &self.enemy,
        }
    }
}

impl Predicate {
    pub fn evaluate(&self, ctx: &PredicateContext) -> bool {
        match self {
            Predicate::HitpointsBelow { target, percent } => {
                let view = ctx.view(*target);
                view.max_hitpoints > 0.0 && view.hitpoints / view.max_hitpoints * 100.0 < *percent
            }
            Predicate::HitpointsAbove { target, percent } => {
                let view = ctx.view(*target);
                view.max_hitpoints > 0.0 && view.hitpoints / view.max_hitpoints * 100.0 >= *percent
            }
            Predicate::BarrierActive { target } => ctx.view(*target).barrier > 0.0,
            Predicate::EffectActive { target, kind } => {
                let view = ctx.view(*target);
                match kind {
                    EffectKind::Damage => view.damage_effect_active,
                    EffectKind::Heal => view.heal_effect_active,
                }
            }
            Predicate::AttackTypeIs { target, attack_type } => {
                ctx.view(*target).attack_type == *attack_type
            }
            Predicate::DamageTypeIs { target, damage_type } => {
                ctx.view(*target).damage_type == *damage_type
            }
            Predicate::Not { condition } => !condition.evaluate(ctx),
            Predicate::All { conditions } => conditions.iter().all(|c| c.evaluate(ctx)),
            Predicate::Any { conditions } => conditions.iter().any(|c| c.evaluate(ctx)),
        }
    }

    /// Every trigger that can change the outcome of `evaluate`
    pub fn triggers(&self) -> BTreeSet<PredicateTrigger> {
        let mut triggers = BTreeSet::new();
        self.collect_triggers(&mut triggers);
        triggers
    }

    fn collect_triggers(&self, out: &mut BTreeSet<PredicateTrigger>) {
        match self {
            Predicate::HitpointsBelow { target, .. } | Predicate::HitpointsAbove { target, .. } => {
                out.insert(PredicateTrigger::Hitpoints(*target));
            }
            Predicate::BarrierActive { target } => {
                out.insert(PredicateTrigger::Barrier(*target));
            }
            Predicate::EffectActive { target, .. } => {
                out.insert(PredicateTrigger::Effects(*target));
            }
            Predicate::AttackTypeIs { .. } | Predicate::DamageTypeIs { .. } => {
                out.insert(PredicateTrigger::Spawn);
            }
            Predicate::Not { condition } => condition.collect_triggers(out),
            Predicate::All { conditions } | Predicate::Any { conditions } => {
                for condition in conditions {
                    condition.collect_triggers(out);
                }
            }
        }
    }

    /// Register `listener` to be told when this predicate may have changed
    pub fn subscribe(&self, watchers: &mut PredicateWatchers, listener: ConditionalKey) -> Subscription {
        watchers.subscribe(listener, self.triggers())
    }
}

/// Handle returned by `subscribe`; pass it back to `unsubscribe`.
#[must_use = "dropping a subscription without unsubscribing leaks the listener"]
#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
}

#[derive(Debug, Clone)]
struct Watch {
    listener: ConditionalKey,
    triggers: BTreeSet<PredicateTrigger>,
}

/// Listener table for predicate triggers
#[derive(Debug, Default)]
pub struct PredicateWatchers {
    next_id: u64,
    watches: BTreeMap<u64, Watch>,
}

impl PredicateWatchers {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribe(&mut self, listener: ConditionalKey, triggers: BTreeSet<PredicateTrigger>) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.watches.insert(id, Watch { listener, triggers });
        Subscription { id }
    }

    /// Drop a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.watches.remove(&subscription.id).is_some()
    }

    /// Listeners interested in any of `fired`, ordered and without duplicates
    pub fn listeners_for(&self, fired: &[PredicateTrigger]) -> Vec<ConditionalKey> {
        let listeners: BTreeSet<ConditionalKey> = self
            .watches
            .values()
            .filter(|watch| fired.iter().any(|t| watch.triggers.contains(t)))
            .map(|watch| watch.listener)
            .collect();
        listeners.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::SourceId;

    fn ctx_with_player_hp(hitpoints: f64, max: f64) -> PredicateContext {
        PredicateContext {
            player: CombatantView {
                hitpoints,
                max_hitpoints: max,
                ..CombatantView::default()
            },
            enemy: CombatantView::default(),
        }
    }

    #[test]
    fn test_hitpoints_below() {
        let predicate = Predicate::HitpointsBelow {
            target: CombatantRole::Player,
            percent: 50.0,
        };
        assert!(predicate.evaluate(&ctx_with_player_hp(40.0, 100.0)));
        assert!(!predicate.evaluate(&ctx_with_player_hp(50.0, 100.0)));
        // No max hitpoints means the combatant is not in play
        assert!(!predicate.evaluate(&ctx_with_player_hp(0.0, 0.0)));
    }

    #[test]
    fn test_composite_triggers_are_unioned() {
        let predicate = Predicate::All {
            conditions: vec![
                Predicate::BarrierActive { target: CombatantRole::Enemy },
                Predicate::Not {
                    condition: Box::new(Predicate::HitpointsAbove {
                        target: CombatantRole::Player,
                        percent: 90.0,
                    }),
                },
            ],
        };
        let triggers = predicate.triggers();
        assert!(triggers.contains(&PredicateTrigger::Barrier(CombatantRole::Enemy)));
        assert!(triggers.contains(&PredicateTrigger::Hitpoints(CombatantRole::Player)));
        assert_eq!(triggers.len(), 2);
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let mut watchers = PredicateWatchers::new();
        let key = ConditionalKey {
            origin: SourceId::Gamemode,
            index: 0,
        };
        let predicate = Predicate::BarrierActive { target: CombatantRole::Player };
        let subscription = predicate.subscribe(&mut watchers, key);

        assert_eq!(watchers.listeners_for(&[PredicateTrigger::Barrier(CombatantRole::Player)]), vec![key]);
        assert!(watchers.listeners_for(&[PredicateTrigger::Spawn]).is_empty());

        assert!(watchers.unsubscribe(subscription));
        assert!(watchers.is_empty());
    }

    #[test]
    fn test_predicate_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            condition: Predicate,
        }
        let parsed: Wrapper = toml::from_str(
            "condition = { type = \"hitpoints_below\", target = \"enemy\", percent = 25.0 }",
        )
        .unwrap();
        assert_eq!(
            parsed.condition,
            Predicate::HitpointsBelow {
                target: CombatantRole::Enemy,
                percent: 25.0
            }
        );
    }
}
