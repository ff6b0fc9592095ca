//! Combat tuning constants

use serde::{Deserialize, Serialize};

/// Tunable combat constants, read from the `[constants]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConstants {
    /// Length of one simulation tick
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u32,
    /// Delay between an enemy dying and the next one spawning
    #[serde(default = "default_spawn_time_ms")]
    pub spawn_time_ms: u32,
    #[serde(default = "default_min_attack_interval_ms")]
    pub min_attack_interval_ms: f64,
    /// Attack interval when no weapon is equipped
    #[serde(default = "default_unarmed_attack_interval_ms")]
    pub unarmed_attack_interval_ms: u32,
    #[serde(default = "default_hitpoints_per_level")]
    pub hitpoints_per_level: f64,
    /// Cap on damage reduction percent
    #[serde(default = "default_max_damage_reduction")]
    pub max_damage_reduction: f64,
    /// Multiplier turning the max hit formula into hitpoint units
    #[serde(default = "default_damage_scale")]
    pub damage_scale: f64,
    /// Percent chance to lose an equipped item on death
    #[serde(default = "default_death_penalty_chance")]
    pub death_penalty_chance: f64,
}

impl Default for CombatConstants {
    fn default() -> Self {
        CombatConstants {
            tick_ms: default_tick_ms(),
            spawn_time_ms: default_spawn_time_ms(),
            min_attack_interval_ms: default_min_attack_interval_ms(),
            unarmed_attack_interval_ms: default_unarmed_attack_interval_ms(),
            hitpoints_per_level: default_hitpoints_per_level(),
            max_damage_reduction: default_max_damage_reduction(),
            damage_scale: default_damage_scale(),
            death_penalty_chance: default_death_penalty_chance(),
        }
    }
}

fn default_tick_ms() -> u32 {
    50
}
fn default_spawn_time_ms() -> u32 {
    3000
}
fn default_min_attack_interval_ms() -> f64 {
    250.0
}
fn default_unarmed_attack_interval_ms() -> u32 {
    2400
}
fn default_hitpoints_per_level() -> f64 {
    10.0
}
fn default_max_damage_reduction() -> f64 {
    95.0
}
fn default_damage_scale() -> f64 {
    10.0
}
fn default_death_penalty_chance() -> f64 {
    0.0
}
