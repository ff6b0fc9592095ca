//! StatValue and the stat snapshots derived from it

use crate::source::EquipmentStats;
use crate::types::{AttackType, ByAttackType, DamageType, Levels};
use serde::{Deserialize, Serialize};

/// A stat built as `(base + flat) × (1 + increased)`
///
/// `increased` is the sum of every percent bonus, as a decimal (0.40 = 40%).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatValue {
    pub base: f64,
    pub flat: f64,
    pub increased: f64,
}

impl StatValue {
    /// Create a new StatValue with the given base
    pub fn with_base(base: f64) -> Self {
        StatValue {
            base,
            flat: 0.0,
            increased: 0.0,
        }
    }

    pub fn compute(&self) -> f64 {
        (self.base + self.flat) * (1.0 + self.increased)
    }

    pub fn add_flat(mut self, value: f64) -> Self {
        self.flat += value;
        self
    }

    /// Add an increased bonus given in percent
    pub fn add_increased_percent(mut self, percent: f64) -> Self {
        self.increased += percent / 100.0;
        self
    }
}

/// Inputs to the post-modifier pass, set by the pre-conditional pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseStats {
    pub levels: Levels,
    pub equipment: EquipmentStats,
    pub attack_interval_ms: f64,
    pub attack_type: AttackType,
    pub damage_type: DamageType,
    /// Max barrier as a percent of max hitpoints
    pub barrier_percent: f64,
}

/// Stats derived purely from base stats and the modifier table
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CombatStats {
    pub max_hitpoints: f64,
    pub max_barrier: f64,
    pub accuracy: f64,
    pub evasion: ByAttackType<f64>,
    pub max_hit: f64,
    pub attack_interval_ms: f64,
    /// Percent, clamped to the configured cap
    pub damage_reduction: f64,
    /// Percent of damage dealt returned as healing
    pub lifesteal: f64,
    pub damage_dealt_multiplier: f64,
    pub damage_taken_multiplier: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_basic() {
        let stat = StatValue::with_base(100.0);
        assert!((stat.compute() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compute_full_formula() {
        // (100 + 50) × (1 + 0.70)
        let stat = StatValue::with_base(100.0)
            .add_flat(50.0)
            .add_increased_percent(40.0)
            .add_increased_percent(30.0);
        assert!((stat.compute() - 255.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiple_increased_stack_additively() {
        let stat = StatValue::with_base(100.0)
            .add_increased_percent(20.0)
            .add_increased_percent(30.0);
        // Should be 100 * (1 + 0.50) = 150, not 100 * 1.2 * 1.3 = 156
        assert!((stat.compute() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_minus_hundred_percent_zeroes_stat() {
        let stat = StatValue::with_base(100.0).add_increased_percent(-100.0);
        assert!(stat.compute().abs() < 1e-9);
    }
}
