//! Fight events, rewards and statistics reported to observers

use crate::combat::AttackResult;
use crate::types::{BattleState, CombatantRole, EquipmentSlot};
use serde::{Deserialize, Serialize};

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn warning(message: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Warning,
            message: message.into(),
        }
    }
}

/// What a kill is worth, for the external reward pipeline
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatRewards {
    pub xp: f64,
    pub gp: u32,
    /// Item key and quantity
    pub loot: Option<(String, u32)>,
    pub pet: Option<String>,
}

/// One thing that happened during a tick, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FightEvent {
    StateChanged {
        from: BattleState,
        to: BattleState,
    },
    EnemySpawned {
        monster: String,
    },
    Attack(AttackResult),
    EffectApplied {
        target: CombatantRole,
        effect: String,
    },
    EffectTick {
        target: CombatantRole,
        damage: f64,
        healing: f64,
    },
    /// Conditional modifiers flipped between live and dormant
    ConditionalsChanged {
        flipped: usize,
    },
    EnemyKilled {
        monster: String,
        rewards: CombatRewards,
    },
    /// `lost_slot` is the equipment slot the death penalty picked, if any
    PlayerDied {
        lost_slot: Option<EquipmentSlot>,
    },
    Fled,
    Notification(Notification),
}

/// Running totals across every fight of one manager
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatStatistics {
    pub kills: u32,
    pub deaths: u32,
    pub damage_dealt: f64,
    pub damage_taken: f64,
    pub hits: u32,
    pub misses: u32,
    pub fled: u32,
}

impl CombatStatistics {
    pub fn record_attack(&mut self, result: &AttackResult) {
        match result.attacker {
            CombatantRole::Player => {
                if result.hit {
                    self.hits += 1;
                } else {
                    self.misses += 1;
                }
                self.damage_dealt += result.damage;
            }
            CombatantRole::Enemy => self.damage_taken += result.damage,
        }
    }

    /// Share of player attacks that landed
    pub fn hit_rate(&self) -> f64 {
        let attacks = self.hits + self.misses;
        if attacks == 0 {
            return 0.0;
        }
        self.hits as f64 / attacks as f64
    }
}
