//! Core types shared by combatants, content and the fight manager

use serde::{Deserialize, Serialize};

/// Equipment slot for gear
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    Helmet,
    Platebody,
    Platelegs,
    Boots,
    Gloves,
    Cape,
    Amulet,
    Ring,
    Weapon,
    Shield,
    Quiver,
}

impl EquipmentSlot {
    /// Get all equipment slots
    pub fn all() -> &'static [EquipmentSlot] {
        &[
            EquipmentSlot::Helmet,
            EquipmentSlot::Platebody,
            EquipmentSlot::Platelegs,
            EquipmentSlot::Boots,
            EquipmentSlot::Gloves,
            EquipmentSlot::Cape,
            EquipmentSlot::Amulet,
            EquipmentSlot::Ring,
            EquipmentSlot::Weapon,
            EquipmentSlot::Shield,
            EquipmentSlot::Quiver,
        ]
    }
}

/// The combat triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    #[default]
    Melee,
    Ranged,
    Magic,
}

impl AttackType {
    pub fn all() -> &'static [AttackType] {
        &[AttackType::Melee, AttackType::Ranged, AttackType::Magic]
    }
}

/// Attack type as configured on a monster. `Random` is rolled once per spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterAttackType {
    #[default]
    Melee,
    Ranged,
    Magic,
    Random,
}

impl MonsterAttackType {
    /// The fixed attack type, or `None` for `Random`
    pub fn fixed(self) -> Option<AttackType> {
        match self {
            MonsterAttackType::Melee => Some(AttackType::Melee),
            MonsterAttackType::Ranged => Some(AttackType::Ranged),
            MonsterAttackType::Magic => Some(AttackType::Magic),
            MonsterAttackType::Random => None,
        }
    }
}

/// Damage type dealt by a combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    #[default]
    Normal,
    Abyssal,
}

/// Which side of a fight a combatant is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatantRole {
    Player,
    Enemy,
}

impl CombatantRole {
    pub fn opponent(self) -> CombatantRole {
        match self {
            CombatantRole::Player => CombatantRole::Enemy,
            CombatantRole::Enemy => CombatantRole::Player,
        }
    }
}

/// Lifecycle of the enemy slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyState {
    #[default]
    Dead,
    Spawning,
    Alive,
}

/// Fight lifecycle as observed from outside the fight manager.
///
/// `Victory` and `Defeat` are transient: the manager passes through them and
/// immediately continues to `Spawning` or `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleState {
    #[default]
    Idle,
    Spawning,
    Fighting,
    Victory,
    Defeat,
}

/// Combat skill levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Levels {
    pub hitpoints: u32,
    pub attack: u32,
    pub strength: u32,
    pub defence: u32,
    pub ranged: u32,
    pub magic: u32,
    pub prayer: u32,
}

impl Default for Levels {
    fn default() -> Self {
        Levels {
            hitpoints: 10,
            attack: 1,
            strength: 1,
            defence: 1,
            ranged: 1,
            magic: 1,
            prayer: 1,
        }
    }
}

impl Levels {
    /// Create levels with every skill at the same value
    pub fn uniform(level: u32) -> Self {
        Levels {
            hitpoints: level,
            attack: level,
            strength: level,
            defence: level,
            ranged: level,
            magic: level,
            prayer: level,
        }
    }

    /// Level that drives accuracy for an attack type
    pub fn accuracy_level(&self, attack_type: AttackType) -> u32 {
        match attack_type {
            AttackType::Melee => self.attack,
            AttackType::Ranged => self.ranged,
            AttackType::Magic => self.magic,
        }
    }

    /// Level that drives max hit for an attack type
    pub fn damage_level(&self, attack_type: AttackType) -> u32 {
        match attack_type {
            AttackType::Melee => self.strength,
            AttackType::Ranged => self.ranged,
            AttackType::Magic => self.magic,
        }
    }

    /// Level that drives evasion against an attack type
    pub fn evasion_level(&self, attack_type: AttackType) -> f64 {
        match attack_type {
            AttackType::Melee | AttackType::Ranged => self.defence as f64,
            AttackType::Magic => self.defence as f64 * 0.3 + self.magic as f64 * 0.7,
        }
    }
}

/// A value kept per attack type
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ByAttackType<T> {
    pub melee: T,
    pub ranged: T,
    pub magic: T,
}

impl<T: Copy> ByAttackType<T> {
    pub fn get(&self, attack_type: AttackType) -> T {
        match attack_type {
            AttackType::Melee => self.melee,
            AttackType::Ranged => self.ranged,
            AttackType::Magic => self.magic,
        }
    }

    pub fn from_fn(mut f: impl FnMut(AttackType) -> T) -> Self {
        ByAttackType {
            melee: f(AttackType::Melee),
            ranged: f(AttackType::Ranged),
            magic: f(AttackType::Magic),
        }
    }
}
