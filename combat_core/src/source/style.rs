//! Attack styles - the player's chosen stance for an attack type

use crate::condition::ConditionalModifierDef;
use crate::modifier::ModifierValue;
use crate::registry::Id;
use crate::types::AttackType;
use serde::{Deserialize, Serialize};

pub type AttackStyleId = Id<AttackStyleDef>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackStyleDef {
    pub id: String,
    pub name: String,
    /// The style only applies while attacking with this type
    pub attack_type: AttackType,
    #[serde(default)]
    pub modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub enemy_modifiers: Vec<ModifierValue>,
    #[serde(default)]
    pub conditional_modifiers: Vec<ConditionalModifierDef>,
}

content_provider!(AttackStyleDef, "attack style");
