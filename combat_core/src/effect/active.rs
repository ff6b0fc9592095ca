//! ActiveEffect - Tracking active effect instances on a combatant

use super::types::{EffectId, EffectKind};
use crate::types::CombatantRole;

/// An active effect instance on a combatant
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEffect {
    pub effect: EffectId,
    pub kind: EffectKind,
    /// Who applied the effect
    pub source: CombatantRole,
    pub amount_per_proc: f64,
    pub interval_ticks: u32,
    pub ticks_until_proc: u32,
    pub procs_left: u32,
    pub total_procs: u32,
    /// Effectiveness multiplier (for stacking)
    pub effectiveness: f64,
    /// Whether this is the "strongest" instance for stacking purposes
    pub is_strongest: bool,
}

impl ActiveEffect {
    pub fn new(
        effect: EffectId,
        kind: EffectKind,
        source: CombatantRole,
        amount_per_proc: f64,
        interval_ticks: u32,
        procs: u32,
    ) -> Self {
        let interval_ticks = interval_ticks.max(1);
        ActiveEffect {
            effect,
            kind,
            source,
            amount_per_proc,
            interval_ticks,
            ticks_until_proc: interval_ticks,
            procs_left: procs,
            total_procs: procs,
            effectiveness: 1.0,
            is_strongest: true,
        }
    }

    /// Amount dealt or healed by the next proc
    pub fn proc_amount(&self) -> f64 {
        self.amount_per_proc * self.effectiveness
    }

    pub fn total_remaining(&self) -> f64 {
        self.procs_left as f64 * self.proc_amount()
    }

    pub fn is_active(&self) -> bool {
        self.procs_left > 0
    }

    /// Refresh the effect (for reapplication)
    pub fn refresh(&mut self, procs: u32, amount_per_proc: f64) {
        // For strongest-only stacking, take the higher amount
        if amount_per_proc > self.amount_per_proc {
            self.amount_per_proc = amount_per_proc;
        }
        self.procs_left = procs;
        self.total_procs = procs;
        self.ticks_until_proc = self.interval_ticks;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ContentDef, Registry};
    use crate::effect::{CombatEffectDef, EffectStacking, EffectTarget};

    fn poison_id() -> EffectId {
        let mut registry = Registry::new();
        let def = CombatEffectDef {
            id: "poison".to_string(),
            name: "Poison".to_string(),
            kind: EffectKind::Damage,
            stacking: EffectStacking::Unlimited,
            amount: 5.0,
            interval_ms: 1000,
            procs: 4,
            target: EffectTarget::Opponent,
        };
        assert_eq!(def.key(), "poison");
        registry.register(def).unwrap()
    }

    #[test]
    fn test_total_remaining() {
        let effect = ActiveEffect::new(poison_id(), EffectKind::Damage, CombatantRole::Player, 5.0, 20, 4);
        assert!((effect.total_remaining() - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_refresh_keeps_higher_amount() {
        let mut effect = ActiveEffect::new(poison_id(), EffectKind::Damage, CombatantRole::Player, 5.0, 20, 4);
        effect.procs_left = 1;

        effect.refresh(4, 3.0);
        assert!((effect.amount_per_proc - 5.0).abs() < 0.01);
        assert_eq!(effect.procs_left, 4);

        effect.refresh(4, 8.0);
        assert!((effect.amount_per_proc - 8.0).abs() < 0.01);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let effect = ActiveEffect::new(poison_id(), EffectKind::Heal, CombatantRole::Enemy, 1.0, 0, 1);
        assert_eq!(effect.interval_ticks, 1);
    }
}
