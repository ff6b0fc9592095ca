//! Gear - Items, the equipment they sit in, and item synergies

use crate::condition::ConditionalModifierDef;
use crate::effect::{EffectApplicator, EffectApplicatorDef};
use crate::modifier::ModifierValue;
use crate::registry::{Id, Registry};
use crate::types::{AttackType, DamageType, EquipmentSlot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type ItemId = Id<ItemDef>;
pub type SynergyId = Id<SynergyDef>;

/// Flat equipment bonuses, summed across every equipped item
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentStats {
    pub melee_accuracy: f64,
    pub ranged_accuracy: f64,
    pub magic_accuracy: f64,
    pub melee_strength: f64,
    pub ranged_strength: f64,
    pub magic_strength: f64,
    pub melee_defence: f64,
    pub ranged_defence: f64,
    pub magic_defence: f64,
    /// Damage reduction percent
    pub damage_reduction: f64,
}

impl EquipmentStats {
    pub fn accuracy(&self, attack_type: AttackType) -> f64 {
        match attack_type {
            AttackType::Melee => self.melee_accuracy,
            AttackType::Ranged => self.ranged_accuracy,
            AttackType::Magic => self.magic_accuracy,
        }
    }

    pub fn strength(&self, attack_type: AttackType) -> f64 {
        match attack_type {
            AttackType::Melee => self.melee_strength,
            AttackType::Ranged => self.ranged_strength,
            AttackType::Magic => self.magic_strength,
        }
    }

    pub fn defence(&self, attack_type: AttackType) -> f64 {
        match attack_type {
            AttackType::Melee => self.melee_defence,
            AttackType::Ranged => self.ranged_defence,
            AttackType::Magic => self.magic_defence,
        }
    }

    pub fn add(&mut self, other: &EquipmentStats) {
        self.melee_accuracy += other.melee_accuracy;
        self.ranged_accuracy += other.ranged_accuracy;
        self.magic_accuracy += other.magic_accuracy;
        self.melee_strength += other.melee_strength;
        self.ranged_strength += other.ranged_strength;
        self.magic_strength += other.magic_strength;
        self.melee_defence += other.melee_defence;
        self.ranged_defence += other.ranged_defence;
        self.magic_defence += other.magic_defence;
        self.damage_reduction += other.damage_reduction;
    }
}

/// An equippable item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    pub slot: EquipmentSlot,
    #[serde(default)]
    pub stats: EquipmentStats,
    /// Weapons decide the wielder's attack type
    #[serde(default)]
    pub attack_type: Option<AttackType>,
    #[serde(default)]
    pub damage_type: Option<DamageType>,
    #[serde(default)]
    pub attack_interval_ms: Option<u32>,
    #[serde(default)]
    pub modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub enemy_modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub conditional_modifiers: Vec<ConditionalModifierDef>,
    #[serde(default)]
    pub effect_applicators: Vec<EffectApplicatorDef>,
    /// Resolved from `effect_applicators` at load time
    #[serde(skip)]
    pub applicators: Vec<EffectApplicator>,
}

content_provider!(ItemDef, "item");

/// An item sitting in an equipment slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquippedItem {
    pub item: ItemId,
    pub quantity: u32,
}

/// Slot → item mapping supplied by the equipment subsystem
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Equipment {
    slots: BTreeMap<EquipmentSlot, EquippedItem>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equip `item` into the slot its definition names, replacing what was there
    pub fn equip(&mut self, items: &Registry<ItemDef>, item: ItemId, quantity: u32) -> Option<EquippedItem> {
        let slot = items.get(item).slot;
        self.slots.insert(slot, EquippedItem { item, quantity })
    }

    pub fn unequip(&mut self, slot: EquipmentSlot) -> Option<EquippedItem> {
        self.slots.remove(&slot)
    }

    pub fn get(&self, slot: EquipmentSlot) -> Option<&EquippedItem> {
        self.slots.get(&slot)
    }

    /// Occupied slots with a non-zero quantity, in slot order
    pub fn equipped(&self) -> impl Iterator<Item = (EquipmentSlot, &EquippedItem)> {
        self.slots
            .iter()
            .filter(|(_, equipped)| equipped.quantity > 0)
            .map(|(slot, equipped)| (*slot, equipped))
    }

    pub fn is_equipped(&self, item: ItemId) -> bool {
        self.equipped().any(|(_, equipped)| equipped.item == item)
    }

    /// Sum of the flat stats of every equipped item
    pub fn total_stats(&self, items: &Registry<ItemDef>) -> EquipmentStats {
        let mut total = EquipmentStats::default();
        for (_, equipped) in self.equipped() {
            total.add(&items.get(equipped.item).stats);
        }
        total
    }

    /// The weapon slot's item, if any
    pub fn weapon<'a>(&self, items: &'a Registry<ItemDef>) -> Option<&'a ItemDef> {
        self.get(EquipmentSlot::Weapon)
            .filter(|equipped| equipped.quantity > 0)
            .map(|equipped| items.get(equipped.item))
    }
}

/// Bonus granted while every listed item is equipped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynergyDef {
    pub id: String,
    pub items: Vec<String>,
    #[serde(skip)]
    pub item_ids: Vec<ItemId>,
    #[serde(default)]
    pub modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub enemy_modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub conditional_modifiers: Vec<ConditionalModifierDef>,
}

content_provider!(SynergyDef, "synergy");

impl SynergyDef {
    pub fn is_active(&self, equipment: &Equipment) -> bool {
        !self.item_ids.is_empty() && self.item_ids.iter().all(|item| equipment.is_equipped(*item))
    }
}
