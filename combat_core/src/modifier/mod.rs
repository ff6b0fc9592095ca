//! Modifiers - named stat deltas keyed by source identity

mod table;

pub use table::{ModifierEntry, ModifierTable};

use crate::source::{
    AttackStyleId, AuroraId, FoodId, MonsterId, PassiveId, PotionId, PrayerId, ProviderHandle,
    SynergyId,
};
use crate::types::{AttackType, DamageType, EquipmentSlot};
use serde::{Deserialize, Serialize};

/// Every modifier the combat core understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierId {
    MeleeAccuracy,
    RangedAccuracy,
    MagicAccuracy,
    MeleeEvasion,
    RangedEvasion,
    MagicEvasion,
    MeleeStrengthBonus,
    RangedStrengthBonus,
    MagicDamageBonus,
    FlatMaxHitpoints,
    MaxHitpointsPercent,
    FlatMaxBarrier,
    MaxBarrierPercent,
    FlatMaxHit,
    MaxHitPercent,
    DamageDealtPercent,
    DamageTakenPercent,
    FlatDamageReduction,
    FlatAttackInterval,
    AttackIntervalPercent,
    LifestealPercent,
    SpawnTimerMs,
    UnholyPrayerMultiplier,
    CombatXpPercent,
    GpFromMonstersPercent,
}

impl ModifierId {
    pub fn accuracy(attack_type: AttackType) -> ModifierId {
        match attack_type {
            AttackType::Melee => ModifierId::MeleeAccuracy,
            AttackType::Ranged => ModifierId::RangedAccuracy,
            AttackType::Magic => ModifierId::MagicAccuracy,
        }
    }

    pub fn evasion(attack_type: AttackType) -> ModifierId {
        match attack_type {
            AttackType::Melee => ModifierId::MeleeEvasion,
            AttackType::Ranged => ModifierId::RangedEvasion,
            AttackType::Magic => ModifierId::MagicEvasion,
        }
    }

    pub fn strength(attack_type: AttackType) -> ModifierId {
        match attack_type {
            AttackType::Melee => ModifierId::MeleeStrengthBonus,
            AttackType::Ranged => ModifierId::RangedStrengthBonus,
            AttackType::Magic => ModifierId::MagicDamageBonus,
        }
    }
}

/// Structured scope of a modifier entry.
///
/// A `None` field is a wildcard. An entry applies to a query when every field
/// the entry pins equals the query's value for that field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierScope {
    pub damage_type: Option<DamageType>,
    pub category: Option<AttackType>,
}

impl ModifierScope {
    /// Scope that applies everywhere
    pub const ANY: ModifierScope = ModifierScope {
        damage_type: None,
        category: None,
    };

    pub fn category(attack_type: AttackType) -> Self {
        ModifierScope {
            damage_type: None,
            category: Some(attack_type),
        }
    }

    pub fn exact(damage_type: DamageType, attack_type: AttackType) -> Self {
        ModifierScope {
            damage_type: Some(damage_type),
            category: Some(attack_type),
        }
    }

    /// Whether an entry with this scope contributes to `query`
    pub fn matches(&self, query: &ModifierScope) -> bool {
        let damage_ok = self.damage_type.map_or(true, |d| query.damage_type == Some(d));
        let category_ok = self.category.map_or(true, |c| query.category == Some(c));
        damage_ok && category_ok
    }
}

/// A raw modifier as written in content
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModifierValue {
    pub id: ModifierId,
    #[serde(default)]
    pub scope: ModifierScope,
    pub value: f64,
}

impl ModifierValue {
    pub fn new(id: ModifierId, value: f64) -> Self {
        ModifierValue {
            id,
            scope: ModifierScope::ANY,
            value,
        }
    }

    pub fn scoped(id: ModifierId, scope: ModifierScope, value: f64) -> Self {
        ModifierValue { id, scope, value }
    }
}

/// Identity of a non-conditional modifier source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceId {
    Gamemode,
    Provider(ProviderHandle),
    AttackStyle(AttackStyleId),
    Equipment(EquipmentSlot),
    Synergy(SynergyId),
    Prayer(PrayerId),
    Potion(PotionId),
    Food(FoodId),
    Aurora(AuroraId),
    Passive(PassiveId),
    Monster(MonsterId),
}

/// One conditional definition instantiated from one source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConditionalKey {
    pub origin: SourceId,
    pub index: u32,
}

/// Identity under which entries are stored in a `ModifierTable`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModifierSource {
    Direct(SourceId),
    Conditional(ConditionalKey),
}

impl From<SourceId> for ModifierSource {
    fn from(source: SourceId) -> Self {
        ModifierSource::Direct(source)
    }
}

impl From<ConditionalKey> for ModifierSource {
    fn from(key: ConditionalKey) -> Self {
        ModifierSource::Conditional(key)
    }
}
