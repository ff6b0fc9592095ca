//! Combat effects - damage and healing over time

mod active;
pub mod tick;
mod types;

pub use active::ActiveEffect;
pub use tick::{apply_effect, has_effect_kind, process_effect_tick, EffectTickResult};
pub use types::{
    merge_applicators, CombatEffectDef, EffectApplicator, EffectApplicatorDef, EffectId,
    EffectKind, EffectStacking, EffectTarget, EffectTrigger,
};
