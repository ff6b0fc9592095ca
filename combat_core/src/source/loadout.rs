//! Loadout - the player-side inputs the fight manager reads every recompute

use super::buff::{AuroraId, FoodId, PotionId, PrayerId};
use super::gear::Equipment;
use super::style::AttackStyleId;
use crate::config::{ConfigError, GameData};
use crate::modifier::ModifierValue;
use crate::types::Levels;
use serde::{Deserialize, Serialize};

/// Levels, equipment and active buffs of the player
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Loadout {
    pub levels: Levels,
    pub equipment: Equipment,
    pub attack_style: Option<AttackStyleId>,
    pub prayers: Vec<PrayerId>,
    pub food: Option<FoodId>,
    pub potion: Option<PotionId>,
    pub aurora: Option<AuroraId>,
    /// Modifiers of the current game mode
    pub gamemode: Vec<ModifierValue>,
}

/// A loadout written with content keys, as found in content files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadoutDef {
    pub levels: Levels,
    pub equipment: Vec<String>,
    pub attack_style: Option<String>,
    pub prayers: Vec<String>,
    pub food: Option<String>,
    pub potion: Option<String>,
    pub aurora: Option<String>,
    pub gamemode: Vec<ModifierValue>,
}

impl LoadoutDef {
    /// Resolve every key against loaded content
    pub fn resolve(&self, data: &GameData) -> Result<Loadout, ConfigError> {
        let mut equipment = Equipment::new();
        for key in &self.equipment {
            let item = data.items.resolve(key)?;
            equipment.equip(&data.items, item, 1);
        }

        Ok(Loadout {
            levels: self.levels,
            equipment,
            attack_style: self
                .attack_style
                .as_deref()
                .map(|key| data.attack_styles.resolve(key))
                .transpose()?,
            prayers: self
                .prayers
                .iter()
                .map(|key| data.prayers.resolve(key))
                .collect::<Result<_, _>>()?,
            food: self.food.as_deref().map(|key| data.foods.resolve(key)).transpose()?,
            potion: self.potion.as_deref().map(|key| data.potions.resolve(key)).transpose()?,
            aurora: self.aurora.as_deref().map(|key| data.auroras.resolve(key)).transpose()?,
            gamemode: self.gamemode.clone(),
        })
    }
}
