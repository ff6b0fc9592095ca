//! combat_core - Combat simulation core for an idle RPG
//!
//! This library provides:
//! - ModifierTable: per-combatant modifier aggregation keyed by source
//! - ConditionalModifierRegistry: modifiers that go live or dormant on predicates
//! - Combatant: player/enemy stat pipeline, hitpoints and barrier
//! - FightManager: spawn, fight, death and reward lifecycle, plus save/load
//! - Content registries loaded from TOML

pub mod combat;
pub mod combatant;
pub mod condition;
pub mod config;
pub mod effect;
pub mod error;
pub mod fight;
pub mod modifier;
pub mod prelude;
pub mod registry;
pub mod source;
pub mod timer;
pub mod types;

// Re-export core types for convenience
pub use combat::{hit_chance, resolve_attack, AttackResult};
pub use combatant::{BaseStats, CombatStats, Combatant, StatValue};
pub use condition::{
    ConditionalModifierDef, ConditionalModifierRegistry, ConditionalState, Predicate,
    PredicateContext,
};
pub use config::{CombatConstants, ConfigError, GameData};
pub use error::CombatError;
pub use fight::{
    CombatRewards, CombatStatistics, FightEvent, FightManager, Notification, SaveError,
    SAVE_VERSION,
};
pub use modifier::{ModifierId, ModifierScope, ModifierSource, ModifierTable, ModifierValue, SourceId};
pub use registry::{ContentDef, Id, Registry};
pub use source::{Loadout, LoadoutDef, ModifierBundle, StatProvider};
pub use types::{AttackType, BattleState, CombatantRole, DamageType, EnemyState, EquipmentSlot, Levels};
