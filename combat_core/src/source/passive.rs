//! Combat passives - modifiers attached to monsters, areas or external systems

use crate::condition::ConditionalModifierDef;
use crate::modifier::ModifierValue;
use crate::registry::Id;
use serde::{Deserialize, Serialize};

pub type PassiveId = Id<PassiveDef>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassiveDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub enemy_modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub conditional_modifiers: Vec<ConditionalModifierDef>,
}

content_provider!(PassiveDef, "passive");
