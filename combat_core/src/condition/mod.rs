//! Conditional modifiers - deltas that are live only while a predicate holds

mod predicate;
mod registry;

pub use predicate::{
    CombatantView, Predicate, PredicateContext, PredicateTrigger, PredicateWatchers, Subscription,
};
pub use registry::{
    CombatantTables, ConditionalCandidate, ConditionalModifierRegistry, ConditionalState,
};

use crate::modifier::ModifierValue;
use serde::{Deserialize, Serialize};

/// A conditional modifier as defined in content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalModifierDef {
    pub condition: Predicate,
    /// Deltas applied to the player while live
    #[serde(default)]
    pub modifiers: Vec<ModifierValue>,
    /// Deltas applied to the enemy while live
    #[serde(default)]
    pub enemy_modifiers: Vec<ModifierValue>,
}
