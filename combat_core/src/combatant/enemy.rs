//! Enemy role data

use super::{BaseStats, Combatant, Role};
use crate::config::GameData;
use crate::source::MonsterId;
use crate::types::{AttackType, EnemyState};
use rand::Rng;

#[derive(Debug, Clone, Default)]
pub struct EnemyData {
    pub(crate) monster: Option<MonsterId>,
    pub(crate) state: EnemyState,
    /// Cached roll for monsters with a random attack type
    pub(crate) random_attack_type: Option<AttackType>,
}

impl EnemyData {
    pub fn monster(&self) -> Option<MonsterId> {
        self.monster
    }

    pub fn state(&self) -> EnemyState {
        self.state
    }

    pub fn random_attack_type(&self) -> Option<AttackType> {
        self.random_attack_type
    }

    pub(crate) fn compute_base_stats(&self, data: &GameData, attack_type: AttackType) -> BaseStats {
        let Some(monster) = self.monster.map(|id| data.monsters.get(id)) else {
            return BaseStats {
                attack_type,
                ..BaseStats::default()
            };
        };
        BaseStats {
            levels: monster.levels,
            equipment: monster.stats,
            attack_interval_ms: monster.attack_interval_ms as f64,
            attack_type,
            damage_type: monster.damage_type,
            barrier_percent: monster.barrier_percent,
        }
    }
}

impl Combatant {
    pub fn new_enemy() -> Self {
        Combatant::with_role(Role::Enemy(EnemyData::default()))
    }

    pub fn enemy_data(&self) -> Option<&EnemyData> {
        match &self.role {
            Role::Enemy(enemy) => Some(enemy),
            Role::Player(_) => None,
        }
    }

    pub(crate) fn enemy_data_mut(&mut self) -> Option<&mut EnemyData> {
        match &mut self.role {
            Role::Enemy(enemy) => Some(enemy),
            Role::Player(_) => None,
        }
    }

    pub fn monster(&self) -> Option<MonsterId> {
        self.enemy_data().and_then(EnemyData::monster)
    }

    /// Lifecycle state of the enemy slot. The player is always reported `Alive`.
    pub fn enemy_state(&self) -> EnemyState {
        self.enemy_data().map_or(EnemyState::Alive, EnemyData::state)
    }

    pub fn is_alive(&self) -> bool {
        self.enemy_state() == EnemyState::Alive
    }

    pub(crate) fn set_enemy_state(&mut self, state: EnemyState) {
        if let Some(enemy) = self.enemy_data_mut() {
            enemy.state = state;
        }
    }

    /// Replace the monster in the enemy slot and reset per-spawn state
    pub(crate) fn set_new_monster(&mut self, monster: MonsterId) {
        if let Some(enemy) = self.enemy_data_mut() {
            enemy.monster = Some(monster);
            enemy.random_attack_type = None;
        }
        self.hitpoints = 0.0;
        self.barrier = 0.0;
        self.turns_taken = 0;
        self.end_fight();
    }

    /// Attack type for this spawn.
    ///
    /// A monster with a random attack type rolls once and keeps the roll until
    /// the next `set_new_monster`.
    pub fn compute_attack_type(&mut self, data: &GameData, rng: &mut impl Rng) -> AttackType {
        let current = self.base.attack_type;
        let Some(enemy) = self.enemy_data_mut() else {
            return current;
        };
        let Some(monster) = enemy.monster else {
            return AttackType::Melee;
        };
        match data.monsters.get(monster).attack_type.fixed() {
            Some(attack_type) => attack_type,
            None => *enemy.random_attack_type.get_or_insert_with(|| {
                let all = AttackType::all();
                all[rng.gen_range(0..all.len())]
            }),
        }
    }
}
