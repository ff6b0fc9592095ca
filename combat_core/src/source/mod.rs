//! StatProvider - Trait and content definitions that contribute modifiers

/// Implement `ContentDef` and `StatProvider` for a definition with the usual
/// `id`, `modifiers`, `enemy_modifiers` and `conditional_modifiers` fields.
macro_rules! content_provider {
    ($def:ty, $kind:literal) => {
        impl $crate::registry::ContentDef for $def {
            const KIND: &'static str = $kind;

            fn key(&self) -> &str {
                &self.id
            }
        }

        impl $crate::source::StatProvider for $def {
            fn id(&self) -> &str {
                &self.id
            }

            fn modifiers(&self) -> &[$crate::modifier::ModifierValue] {
                &self.modifiers
            }

            fn enemy_modifiers(&self) -> &[$crate::modifier::ModifierValue] {
                &self.enemy_modifiers
            }

            fn conditional_modifiers(&self) -> &[$crate::condition::ConditionalModifierDef] {
                &self.conditional_modifiers
            }
        }
    };
}

mod buff;
mod gear;
mod loadout;
mod monster;
mod passive;
mod style;

pub use buff::{AuroraDef, AuroraId, FoodDef, FoodId, PotionDef, PotionId, PrayerDef, PrayerId};
pub use gear::{
    Equipment, EquipmentStats, EquippedItem, ItemDef, ItemId, SynergyDef, SynergyId,
};
pub use loadout::{Loadout, LoadoutDef};
pub use monster::{AreaDef, AreaId, GpRange, LootEntry, MonsterDef, MonsterId, PetDef};
pub use passive::{PassiveDef, PassiveId};
pub use style::{AttackStyleDef, AttackStyleId};

use crate::condition::ConditionalModifierDef;
use crate::modifier::{ModifierId, ModifierValue};

/// Anything that contributes modifiers to the combatants.
///
/// `modifiers` land on the player, `enemy_modifiers` on the enemy. Conditional
/// modifiers are registered only while a fight is active.
pub trait StatProvider: Send + Sync {
    /// Unique identifier for this provider
    fn id(&self) -> &str;

    fn modifiers(&self) -> &[ModifierValue] {
        &[]
    }

    fn enemy_modifiers(&self) -> &[ModifierValue] {
        &[]
    }

    fn conditional_modifiers(&self) -> &[ConditionalModifierDef] {
        &[]
    }
}

/// Registration handle of an externally supplied stat provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProviderHandle(pub(crate) u32);

/// A free-standing provider, for external systems without their own content type
#[derive(Debug, Clone, Default)]
pub struct ModifierBundle {
    pub id: String,
    modifiers: Vec<ModifierValue>,
    enemy_modifiers: Vec<ModifierValue>,
    conditional_modifiers: Vec<ConditionalModifierDef>,
}

impl ModifierBundle {
    pub fn new(id: impl Into<String>) -> Self {
        ModifierBundle {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_modifier(mut self, id: ModifierId, value: f64) -> Self {
        self.modifiers.push(ModifierValue::new(id, value));
        self
    }

    pub fn with_enemy_modifier(mut self, id: ModifierId, value: f64) -> Self {
        self.enemy_modifiers.push(ModifierValue::new(id, value));
        self
    }

    pub fn with_conditional(mut self, conditional: ConditionalModifierDef) -> Self {
        self.conditional_modifiers.push(conditional);
        self
    }
}

impl StatProvider for ModifierBundle {
    fn id(&self) -> &str {
        &self.id
    }

    fn modifiers(&self) -> &[ModifierValue] {
        &self.modifiers
    }

    fn enemy_modifiers(&self) -> &[ModifierValue] {
        &self.enemy_modifiers
    }

    fn conditional_modifiers(&self) -> &[ConditionalModifierDef] {
        &self.conditional_modifiers
    }
}
