//! AttackResult - Outcome of one attack

use crate::types::CombatantRole;
use serde::{Deserialize, Serialize};

/// Result of one attack of `attacker` against its opponent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackResult {
    pub attacker: CombatantRole,
    pub hit: bool,
    /// Damage after multipliers and damage reduction
    pub damage: f64,
    /// Portion of `damage` taken by the defender's barrier
    pub barrier_absorbed: f64,
    /// Hitpoints restored to the attacker
    pub lifesteal_healed: f64,
    pub killing_blow: bool,
}

impl AttackResult {
    pub fn miss(attacker: CombatantRole) -> Self {
        AttackResult {
            attacker,
            hit: false,
            damage: 0.0,
            barrier_absorbed: 0.0,
            lifesteal_healed: 0.0,
            killing_blow: false,
        }
    }

    pub fn defender(&self) -> CombatantRole {
        self.attacker.opponent()
    }

    /// Damage that reached hitpoints
    pub fn hitpoint_damage(&self) -> f64 {
        self.damage - self.barrier_absorbed
    }

    pub fn summary(&self) -> String {
        if !self.hit {
            return format!("{:?} missed", self.attacker);
        }

        let mut parts = vec![format!("{:?} hit for {:.0}", self.attacker, self.damage)];
        if self.barrier_absorbed > 0.0 {
            parts.push(format!("{:.0} absorbed by barrier", self.barrier_absorbed));
        }
        if self.lifesteal_healed > 0.0 {
            parts.push(format!("{:.0} healed", self.lifesteal_healed));
        }
        if self.killing_blow {
            parts.push("FATAL".to_string());
        }
        parts.join(", ")
    }
}
