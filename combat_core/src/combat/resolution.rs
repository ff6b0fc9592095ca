//! Attack resolution - Roll one attack between two combatants

use super::result::AttackResult;
use crate::combatant::Combatant;
use rand::Rng;

/// Chance to hit, in `[0, 1]`, for the given accuracy against evasion
pub fn hit_chance(accuracy: f64, evasion: f64) -> f64 {
    if accuracy <= 0.0 {
        return 0.0;
    }
    if evasion <= 0.0 {
        return 1.0;
    }
    if accuracy < evasion {
        0.5 * accuracy / evasion
    } else {
        1.0 - 0.5 * evasion / accuracy
    }
}

/// Resolve one attack of `attacker` against `defender`.
///
/// 1. Hit roll: attacker accuracy vs defender evasion for the attacker's type
/// 2. Damage roll: uniform in `1..=max_hit`, scaled by dealt/taken multipliers
///    and the defender's damage reduction
/// 3. Damage goes to barrier, then hitpoints
/// 4. Lifesteal heals the attacker by a share of the damage dealt
///
/// Effect applicators are rolled by the caller.
pub fn resolve_attack(attacker: &mut Combatant, defender: &mut Combatant, rng: &mut impl Rng) -> AttackResult {
    attacker.turns_taken += 1;

    let attack_type = attacker.attack_type();
    let chance = hit_chance(attacker.stats.accuracy, defender.stats.evasion.get(attack_type));
    if rng.gen::<f64>() >= chance {
        return AttackResult::miss(attacker.role());
    }

    let max_hit = attacker.stats.max_hit.max(1.0) as u32;
    let rolled = rng.gen_range(1..=max_hit) as f64;
    let damage = (rolled
        * attacker.stats.damage_dealt_multiplier
        * defender.stats.damage_taken_multiplier
        * (1.0 - defender.stats.damage_reduction / 100.0))
        .floor()
        .max(0.0);

    let applied = defender.apply_damage(damage);
    let lifesteal_healed = if attacker.stats.lifesteal > 0.0 {
        attacker.heal(damage * attacker.stats.lifesteal / 100.0)
    } else {
        0.0
    };

    AttackResult {
        attacker: attacker.role(),
        hit: true,
        damage,
        barrier_absorbed: applied.barrier_absorbed,
        lifesteal_healed,
        killing_blow: defender.is_dead(),
    }
}
