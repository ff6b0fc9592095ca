//! Contract violations raised by the combat core

use crate::modifier::ConditionalKey;
use thiserror::Error;

/// Misuse of the fight manager or the conditional registry.
///
/// These are returned to the caller immediately and never recovered inside
/// the core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CombatError {
    #[error("Stat Provider is already registered: {0}")]
    ProviderAlreadyRegistered(String),
    #[error("Conditional modifier is not active: {0:?}")]
    ConditionalNotActive(ConditionalKey),
    #[error("Monster {monster} is not part of area {area}")]
    MonsterNotInArea { area: String, monster: String },
}
