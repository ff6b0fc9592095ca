//! Buffs - Prayers, potions, food and auroras

use crate::condition::ConditionalModifierDef;
use crate::modifier::ModifierValue;
use crate::registry::Id;
use serde::{Deserialize, Serialize};

pub type PrayerId = Id<PrayerDef>;
pub type PotionId = Id<PotionDef>;
pub type FoodId = Id<FoodDef>;
pub type AuroraId = Id<AuroraDef>;

/// An active prayer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrayerDef {
    pub id: String,
    pub name: String,
    /// Unholy prayers have their negative conditional values scaled by the
    /// wearer's unholy prayer multiplier
    #[serde(default)]
    pub unholy: bool,
    #[serde(default)]
    pub modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub enemy_modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub conditional_modifiers: Vec<ConditionalModifierDef>,
}

content_provider!(PrayerDef, "prayer");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotionDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub enemy_modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub conditional_modifiers: Vec<ConditionalModifierDef>,
}

content_provider!(PotionDef, "potion");

/// Selected food
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub enemy_modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub conditional_modifiers: Vec<ConditionalModifierDef>,
}

content_provider!(FoodDef, "food");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuroraDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub enemy_modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub conditional_modifiers: Vec<ConditionalModifierDef>,
}

content_provider!(AuroraDef, "aurora");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::ModifierId;
    use crate::source::StatProvider;

    #[test]
    fn test_prayer_from_toml() {
        let prayer: PrayerDef = toml::from_str(
            r#"
            id = "clarity"
            name = "Clarity of Thought"
            modifiers = [{ id = "melee_accuracy", value = 10.0 }]
            "#,
        )
        .unwrap();

        assert!(!prayer.unholy);
        assert_eq!(prayer.modifiers()[0].id, ModifierId::MeleeAccuracy);
        assert!(prayer.conditional_modifiers().is_empty());
    }
}
