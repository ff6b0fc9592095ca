//! Effect tick processing

use super::{ActiveEffect, EffectId, EffectKind, EffectStacking};

/// Result of processing one tick of effects on a combatant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectTickResult {
    pub damage: f64,
    pub healing: f64,
    /// Effects that expired this tick
    pub expired: Vec<EffectId>,
    /// Whether any effect procced
    pub procced: bool,
}

/// Advance every active effect by one tick, removing expired ones
pub fn process_effect_tick(effects: &mut Vec<ActiveEffect>) -> EffectTickResult {
    let mut result = EffectTickResult::default();

    for effect in effects.iter_mut() {
        if !effect.is_active() {
            continue;
        }
        effect.ticks_until_proc = effect.ticks_until_proc.saturating_sub(1);
        if effect.ticks_until_proc > 0 {
            continue;
        }

        let amount = effect.proc_amount();
        match effect.kind {
            EffectKind::Damage => result.damage += amount,
            EffectKind::Heal => result.healing += amount,
        }
        result.procced = true;
        effect.procs_left -= 1;
        effect.ticks_until_proc = effect.interval_ticks;
    }

    result.expired = effects
        .iter()
        .filter(|e| !e.is_active())
        .map(|e| e.effect)
        .collect();
    effects.retain(ActiveEffect::is_active);

    result
}

/// Apply a new effect to a list of active effects, respecting stacking rules
pub fn apply_effect(effects: &mut Vec<ActiveEffect>, new_effect: ActiveEffect, stacking: &EffectStacking) {
    let effect = new_effect.effect;
    match stacking {
        EffectStacking::StrongestOnly => {
            if let Some(existing) = effects.iter_mut().find(|e| e.effect == effect) {
                if new_effect.amount_per_proc >= existing.amount_per_proc {
                    existing.refresh(new_effect.total_procs, new_effect.amount_per_proc);
                }
            } else {
                effects.push(new_effect);
            }
        }
        EffectStacking::Unlimited => effects.push(new_effect),
        EffectStacking::Limited {
            max_stacks,
            stack_effectiveness,
        } => {
            let existing_count = effects.iter().filter(|e| e.effect == effect).count();

            if existing_count < *max_stacks as usize {
                effects.push(new_effect);
            } else if let Some(oldest) = effects
                .iter_mut()
                .find(|e| e.effect == effect && !e.is_strongest)
            {
                // At max stacks: refresh the oldest secondary stack
                oldest.refresh(new_effect.total_procs, new_effect.amount_per_proc);
            }
            recalculate_strongest(effects, effect, *stack_effectiveness);
        }
    }
}

/// Mark the first strongest instance of `effect` at full effectiveness and
/// every other instance at `stack_effectiveness`
fn recalculate_strongest(effects: &mut [ActiveEffect], effect: EffectId, stack_effectiveness: f64) {
    let strongest = effects
        .iter()
        .enumerate()
        .filter(|(_, e)| e.effect == effect)
        .fold(None::<(usize, f64)>, |best, (i, e)| match best {
            Some((_, amount)) if amount >= e.amount_per_proc => best,
            _ => Some((i, e.amount_per_proc)),
        })
        .map(|(i, _)| i);

    for (i, e) in effects.iter_mut().enumerate() {
        if e.effect != effect {
            continue;
        }
        e.is_strongest = Some(i) == strongest;
        e.effectiveness = if e.is_strongest { 1.0 } else { stack_effectiveness };
    }
}

/// Whether any active effect of `kind` is present
pub fn has_effect_kind(effects: &[ActiveEffect], kind: EffectKind) -> bool {
    effects.iter().any(|e| e.kind == kind && e.is_active())
}
