//! Player role data

use super::{BaseStats, Combatant, Role};
use crate::config::GameData;
use crate::modifier::ModifierId;
use crate::source::{Loadout, StatProvider};
use crate::types::AttackType;

#[derive(Debug, Clone)]
pub struct PlayerData {
    pub(crate) loadout: Loadout,
    /// Scale applied to negative values of unholy prayers' conditionals
    pub(crate) unholy_multiplier: f64,
}

impl PlayerData {
    pub fn loadout(&self) -> &Loadout {
        &self.loadout
    }

    pub fn unholy_multiplier(&self) -> f64 {
        self.unholy_multiplier
    }

    /// Levels, equipment totals and weapon derived attack/damage type
    pub(crate) fn compute_base_stats(&mut self, data: &GameData) -> BaseStats {
        let equipment = &self.loadout.equipment;
        let weapon = equipment.weapon(&data.items);

        self.unholy_multiplier = 1.0
            + equipment
                .equipped()
                .flat_map(|(_, equipped)| data.items.get(equipped.item).modifiers())
                .filter(|value| value.id == ModifierId::UnholyPrayerMultiplier)
                .map(|value| value.value)
                .sum::<f64>()
                / 100.0;

        BaseStats {
            levels: self.loadout.levels,
            equipment: equipment.total_stats(&data.items),
            attack_interval_ms: weapon
                .and_then(|w| w.attack_interval_ms)
                .unwrap_or(data.constants.unarmed_attack_interval_ms) as f64,
            attack_type: weapon.and_then(|w| w.attack_type).unwrap_or(AttackType::Melee),
            damage_type: weapon.and_then(|w| w.damage_type).unwrap_or_default(),
            barrier_percent: 0.0,
        }
    }
}

impl Combatant {
    pub fn new_player(loadout: Loadout) -> Self {
        Combatant::with_role(Role::Player(PlayerData {
            loadout,
            unholy_multiplier: 1.0,
        }))
    }

    pub fn player_data(&self) -> Option<&PlayerData> {
        match &self.role {
            Role::Player(player) => Some(player),
            Role::Enemy(_) => None,
        }
    }

    pub(crate) fn player_data_mut(&mut self) -> Option<&mut PlayerData> {
        match &mut self.role {
            Role::Player(player) => Some(player),
            Role::Enemy(_) => None,
        }
    }

    pub fn loadout(&self) -> Option<&Loadout> {
        self.player_data().map(PlayerData::loadout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LoadoutDef;

    #[test]
    fn test_unholy_multiplier_from_equipment() {
        let data = GameData::builtin().unwrap();
        let loadout = LoadoutDef {
            equipment: vec!["amulet_of_torment".to_string()],
            ..LoadoutDef::default()
        }
        .resolve(&data)
        .unwrap();

        let mut player = PlayerData {
            loadout,
            unholy_multiplier: 1.0,
        };
        player.compute_base_stats(&data);
        assert!((player.unholy_multiplier() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weapon_sets_attack_type_and_interval() {
        let data = GameData::builtin().unwrap();
        let loadout = LoadoutDef {
            equipment: vec!["oak_shortbow".to_string()],
            ..LoadoutDef::default()
        }
        .resolve(&data)
        .unwrap();

        let mut player = PlayerData {
            loadout,
            unholy_multiplier: 1.0,
        };
        let base = player.compute_base_stats(&data);
        assert_eq!(base.attack_type, AttackType::Ranged);
        assert!((base.attack_interval_ms - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unarmed_defaults() {
        let data = GameData::default();
        let mut player = PlayerData {
            loadout: Loadout::default(),
            unholy_multiplier: 1.0,
        };
        let base = player.compute_base_stats(&data);
        assert_eq!(base.attack_type, AttackType::Melee);
        assert!((base.attack_interval_ms - 2400.0).abs() < f64::EPSILON);
    }
}
