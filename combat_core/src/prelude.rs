//! Prelude module for convenient imports
//!
//! ```rust
//! use combat_core::prelude::*;
//! ```

// Core types
pub use crate::types::{AttackType, BattleState, CombatantRole, DamageType, EquipmentSlot, Levels};

// Modifiers
pub use crate::modifier::{ModifierId, ModifierScope, ModifierTable, ModifierValue, SourceId};

// Conditionals
pub use crate::condition::{ConditionalModifierDef, Predicate};

// Fight
pub use crate::combatant::Combatant;
pub use crate::fight::{FightEvent, FightManager};

// Sources
pub use crate::source::{Loadout, LoadoutDef, ModifierBundle, StatProvider};

// Config
pub use crate::config::GameData;
