//! Monsters and the combat areas they live in

use super::gear::{EquipmentStats, ItemId};
use super::passive::PassiveId;
use crate::effect::{EffectApplicator, EffectApplicatorDef};
use crate::modifier::ModifierValue;
use crate::registry::{ContentDef, Id};
use crate::types::{DamageType, Levels, MonsterAttackType};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub type MonsterId = Id<MonsterDef>;
pub type AreaId = Id<AreaDef>;

/// Inclusive GP drop range
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GpRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootEntry {
    pub item: String,
    #[serde(skip)]
    pub item_id: Option<ItemId>,
    pub weight: u32,
    #[serde(default = "default_quantity")]
    pub min_quantity: u32,
    #[serde(default = "default_quantity")]
    pub max_quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetDef {
    pub name: String,
    /// Percent chance per kill
    pub chance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub levels: Levels,
    #[serde(default)]
    pub attack_type: MonsterAttackType,
    #[serde(default)]
    pub damage_type: DamageType,
    #[serde(default = "default_attack_interval")]
    pub attack_interval_ms: u32,
    #[serde(default)]
    pub stats: EquipmentStats,
    /// Max barrier as a percent of max hitpoints
    #[serde(default)]
    pub barrier_percent: f64,
    /// Modifiers applied to the monster itself
    #[serde(default)]
    pub modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub passives: Vec<String>,
    #[serde(skip)]
    pub passive_ids: Vec<PassiveId>,
    #[serde(default)]
    pub effect_applicators: Vec<EffectApplicatorDef>,
    #[serde(skip)]
    pub applicators: Vec<EffectApplicator>,
    #[serde(default)]
    pub xp: f64,
    #[serde(default)]
    pub gp: GpRange,
    /// Percent chance to roll the loot table on a kill
    #[serde(default)]
    pub loot_chance: f64,
    #[serde(default)]
    pub loot: Vec<LootEntry>,
    #[serde(default)]
    pub pet: Option<PetDef>,
}

fn default_attack_interval() -> u32 {
    2400
}

impl ContentDef for MonsterDef {
    const KIND: &'static str = "monster";

    fn key(&self) -> &str {
        &self.id
    }
}

impl MonsterDef {
    pub fn roll_gp(&self, rng: &mut impl Rng) -> u32 {
        if self.gp.max <= self.gp.min {
            return self.gp.min;
        }
        rng.gen_range(self.gp.min..=self.gp.max)
    }

    /// Roll the loot table once, weighted by entry
    pub fn roll_loot(&self, rng: &mut impl Rng) -> Option<(ItemId, u32)> {
        if self.loot.is_empty() || rng.gen::<f64>() * 100.0 >= self.loot_chance {
            return None;
        }
        let total_weight: u32 = self.loot.iter().map(|entry| entry.weight).sum();
        if total_weight == 0 {
            return None;
        }

        let mut roll = rng.gen_range(0..total_weight);
        for entry in &self.loot {
            if roll < entry.weight {
                let item = entry.item_id?;
                let quantity = if entry.max_quantity > entry.min_quantity {
                    rng.gen_range(entry.min_quantity..=entry.max_quantity)
                } else {
                    entry.min_quantity
                };
                return Some((item, quantity));
            }
            roll -= entry.weight;
        }
        None
    }

    pub fn roll_pet(&self, rng: &mut impl Rng) -> Option<&str> {
        let pet = self.pet.as_ref()?;
        (rng.gen::<f64>() * 100.0 < pet.chance).then_some(pet.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaDef {
    pub id: String,
    pub name: String,
    pub monsters: Vec<String>,
    #[serde(skip)]
    pub monster_ids: Vec<MonsterId>,
    /// Passives applied to every fight in the area
    #[serde(default)]
    pub passives: Vec<String>,
    #[serde(skip)]
    pub passive_ids: Vec<PassiveId>,
}

impl ContentDef for AreaDef {
    const KIND: &'static str = "area";

    fn key(&self) -> &str {
        &self.id
    }
}

impl AreaDef {
    pub fn contains(&self, monster: MonsterId) -> bool {
        self.monster_ids.contains(&monster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn monster() -> MonsterDef {
        toml::from_str(
            r#"
            id = "chicken"
            name = "Chicken"
            xp = 12.0
            gp = { min = 1, max = 5 }
            loot_chance = 100.0
            loot = [{ item = "feather", weight = 1, min_quantity = 2, max_quantity = 4 }]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_monster_defaults() {
        let monster = monster();
        assert_eq!(monster.attack_interval_ms, 2400);
        assert_eq!(monster.attack_type, MonsterAttackType::Melee);
        assert_eq!(monster.levels.hitpoints, 10);
    }

    #[test]
    fn test_roll_gp_within_range() {
        let monster = monster();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let gp = monster.roll_gp(&mut rng);
            assert!((1..=5).contains(&gp));
        }
    }

    #[test]
    fn test_unresolved_loot_never_drops() {
        let monster = monster();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(monster.roll_loot(&mut rng), None);
    }

    #[test]
    fn test_no_pet_configured() {
        let monster = monster();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(monster.roll_pet(&mut rng), None);
    }
}
