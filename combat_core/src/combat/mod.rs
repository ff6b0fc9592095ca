//! Attack resolution - one combatant hitting the other

mod resolution;
mod result;

pub use resolution::{hit_chance, resolve_attack};
pub use result::AttackResult;
