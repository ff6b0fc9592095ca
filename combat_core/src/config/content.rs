//! Content files and the linked registries built from them

use super::{load_toml, parse_toml, CombatConstants, ConfigError};
use crate::effect::{CombatEffectDef, EffectApplicator, EffectApplicatorDef};
use crate::registry::Registry;
use crate::source::{
    AreaDef, AttackStyleDef, AuroraDef, FoodDef, ItemDef, LoadoutDef, MonsterDef, PassiveDef,
    PotionDef, PrayerDef, SynergyDef,
};
use std::path::Path;
use tracing::debug;

const BUILTIN_CONTENT: &str = include_str!("../../content/base.toml");

/// Raw content as written in a TOML file
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct ContentFile {
    pub constants: CombatConstants,
    pub items: Vec<ItemDef>,
    pub synergies: Vec<SynergyDef>,
    pub passives: Vec<PassiveDef>,
    pub prayers: Vec<PrayerDef>,
    pub potions: Vec<PotionDef>,
    pub foods: Vec<FoodDef>,
    pub auroras: Vec<AuroraDef>,
    pub attack_styles: Vec<AttackStyleDef>,
    pub effects: Vec<CombatEffectDef>,
    pub monsters: Vec<MonsterDef>,
    pub areas: Vec<AreaDef>,
    /// Starting loadout for headless simulations
    pub loadout: Option<LoadoutDef>,
}

/// Every content registry, with all cross references resolved
#[derive(Debug, Clone, Default)]
pub struct GameData {
    pub constants: CombatConstants,
    pub items: Registry<ItemDef>,
    pub synergies: Registry<SynergyDef>,
    pub passives: Registry<PassiveDef>,
    pub prayers: Registry<PrayerDef>,
    pub potions: Registry<PotionDef>,
    pub foods: Registry<FoodDef>,
    pub auroras: Registry<AuroraDef>,
    pub attack_styles: Registry<AttackStyleDef>,
    pub effects: Registry<CombatEffectDef>,
    pub monsters: Registry<MonsterDef>,
    pub areas: Registry<AreaDef>,
    pub loadout: Option<LoadoutDef>,
}

impl GameData {
    /// Content shipped with the crate
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::parse(BUILTIN_CONTENT)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file: ContentFile = load_toml(path)?;
        Self::from_content(file)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: ContentFile = parse_toml(content)?;
        Self::from_content(file)
    }

    /// Register every definition, then resolve cross references
    pub fn from_content(file: ContentFile) -> Result<Self, ConfigError> {
        validate(&file)?;

        let mut data = GameData {
            constants: file.constants,
            loadout: file.loadout,
            ..GameData::default()
        };
        register_all(&mut data.items, file.items)?;
        register_all(&mut data.synergies, file.synergies)?;
        register_all(&mut data.passives, file.passives)?;
        register_all(&mut data.prayers, file.prayers)?;
        register_all(&mut data.potions, file.potions)?;
        register_all(&mut data.foods, file.foods)?;
        register_all(&mut data.auroras, file.auroras)?;
        register_all(&mut data.attack_styles, file.attack_styles)?;
        register_all(&mut data.effects, file.effects)?;
        register_all(&mut data.monsters, file.monsters)?;
        register_all(&mut data.areas, file.areas)?;

        data.link()?;
        debug!(
            items = data.items.len(),
            monsters = data.monsters.len(),
            areas = data.areas.len(),
            "loaded combat content"
        );
        Ok(data)
    }

    fn link(&mut self) -> Result<(), ConfigError> {
        for id in self.items.ids().collect::<Vec<_>>() {
            let applicators = resolve_applicators(&self.effects, &self.items.get(id).effect_applicators)?;
            self.items.get_mut(id).applicators = applicators;
        }

        for id in self.synergies.ids().collect::<Vec<_>>() {
            let item_ids = self
                .synergies
                .get(id)
                .items
                .iter()
                .map(|key| self.items.resolve(key))
                .collect::<Result<_, _>>()?;
            self.synergies.get_mut(id).item_ids = item_ids;
        }

        for id in self.monsters.ids().collect::<Vec<_>>() {
            let monster = self.monsters.get(id);
            let passive_ids = monster
                .passives
                .iter()
                .map(|key| self.passives.resolve(key))
                .collect::<Result<_, _>>()?;
            let applicators = resolve_applicators(&self.effects, &monster.effect_applicators)?;
            let loot_ids = monster
                .loot
                .iter()
                .map(|entry| self.items.resolve(&entry.item))
                .collect::<Result<Vec<_>, _>>()?;

            let monster = self.monsters.get_mut(id);
            monster.passive_ids = passive_ids;
            monster.applicators = applicators;
            for (entry, item) in monster.loot.iter_mut().zip(loot_ids) {
                entry.item_id = Some(item);
            }
        }

        for id in self.areas.ids().collect::<Vec<_>>() {
            let area = self.areas.get(id);
            let monster_ids = area
                .monsters
                .iter()
                .map(|key| self.monsters.resolve(key))
                .collect::<Result<_, _>>()?;
            let passive_ids = area
                .passives
                .iter()
                .map(|key| self.passives.resolve(key))
                .collect::<Result<_, _>>()?;

            let area = self.areas.get_mut(id);
            area.monster_ids = monster_ids;
            area.passive_ids = passive_ids;
        }

        Ok(())
    }
}

fn register_all<T: crate::registry::ContentDef>(registry: &mut Registry<T>, defs: Vec<T>) -> Result<(), ConfigError> {
    for def in defs {
        registry.register(def)?;
    }
    Ok(())
}

fn resolve_applicators(
    effects: &Registry<CombatEffectDef>,
    defs: &[EffectApplicatorDef],
) -> Result<Vec<EffectApplicator>, ConfigError> {
    defs.iter()
        .map(|def| {
            Ok(EffectApplicator {
                effect: effects.resolve(&def.effect)?,
                chance: def.chance,
                trigger: def.trigger,
            })
        })
        .collect()
}

fn validate(file: &ContentFile) -> Result<(), ConfigError> {
    if file.constants.tick_ms == 0 {
        return Err(ConfigError::ValidationError("tick_ms must be positive".to_string()));
    }
    for effect in &file.effects {
        if effect.interval_ms == 0 || effect.procs == 0 {
            return Err(ConfigError::ValidationError(format!(
                "effect {} needs a positive interval and proc count",
                effect.id
            )));
        }
    }
    for monster in &file.monsters {
        if monster.gp.min > monster.gp.max {
            return Err(ConfigError::ValidationError(format!(
                "monster {} has gp min above max",
                monster.id
            )));
        }
        for entry in &monster.loot {
            if entry.min_quantity > entry.max_quantity {
                return Err(ConfigError::ValidationError(format!(
                    "monster {} loot {} has min quantity above max",
                    monster.id, entry.item
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_content_links() {
        let data = GameData::builtin().unwrap();
        assert!(!data.monsters.is_empty());
        assert!(!data.areas.is_empty());

        for (_, area) in data.areas.iter() {
            assert_eq!(area.monster_ids.len(), area.monsters.len());
        }
        for (_, monster) in data.monsters.iter() {
            assert!(monster.loot.iter().all(|entry| entry.item_id.is_some()));
        }
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let content = r#"
            [[passives]]
            id = "a"
            name = "A"

            [[passives]]
            id = "a"
            name = "A again"
        "#;
        let err = GameData::parse(content).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateId { kind: "passive", .. }));
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let content = r#"
            [[areas]]
            id = "farm"
            name = "Farm"
            monsters = ["cow"]
        "#;
        let err = GameData::parse(content).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownReference { kind: "monster", .. }));
    }

    #[test]
    fn test_invalid_gp_range_rejected() {
        let content = r#"
            [[monsters]]
            id = "cow"
            name = "Cow"
            gp = { min = 10, max = 1 }
        "#;
        assert!(matches!(
            GameData::parse(content),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_empty_content_uses_default_constants() {
        let data = GameData::parse("").unwrap();
        assert_eq!(data.constants.tick_ms, 50);
        assert!(data.items.is_empty());
    }
}
