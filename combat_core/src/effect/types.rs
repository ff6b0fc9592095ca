//! Combat effect definitions

use crate::registry::{ContentDef, Id};
use serde::{Deserialize, Serialize};

pub type EffectId = Id<CombatEffectDef>;

/// What an effect does on each proc
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Damage over time
    Damage,
    /// Healing over time
    Heal,
}

/// Effect stacking behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectStacking {
    /// Only the strongest instance procs
    StrongestOnly,
    /// All instances stack and proc independently
    Unlimited,
    /// Strongest + up to N stacks at reduced effectiveness
    Limited {
        max_stacks: u32,
        /// Effectiveness of additional stacks (e.g., 0.5 = 50%)
        stack_effectiveness: f64,
    },
}

/// Who receives an effect when its applicator fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTarget {
    #[default]
    Opponent,
    Owner,
}

/// When an applicator rolls its chance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTrigger {
    #[default]
    OnHit,
    OnSpawn,
}

/// Configuration for a combat effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatEffectDef {
    /// Unique identifier (e.g., "poison", "regeneration")
    pub id: String,
    pub name: String,
    pub kind: EffectKind,
    pub stacking: EffectStacking,
    /// Damage or healing per proc
    pub amount: f64,
    /// Time between procs
    pub interval_ms: u32,
    /// Number of procs before the effect expires
    pub procs: u32,
    #[serde(default)]
    pub target: EffectTarget,
}

impl CombatEffectDef {
    /// Total damage or healing of one full application
    pub fn total_amount(&self) -> f64 {
        self.amount * self.procs as f64
    }

    /// Duration of one full application
    pub fn duration_ms(&self) -> u64 {
        self.interval_ms as u64 * self.procs as u64
    }
}

impl ContentDef for CombatEffectDef {
    const KIND: &'static str = "combat effect";

    fn key(&self) -> &str {
        &self.id
    }
}

/// An applicator as written in content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectApplicatorDef {
    pub effect: String,
    /// Percent chance to apply
    pub chance: f64,
    #[serde(default)]
    pub trigger: EffectTrigger,
}

/// An applicator resolved against the effect registry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectApplicator {
    pub effect: EffectId,
    pub chance: f64,
    pub trigger: EffectTrigger,
}

/// Merge applicators so each `(effect, trigger)` appears once with chances summed
pub fn merge_applicators<'a>(sources: impl IntoIterator<Item = &'a EffectApplicator>) -> Vec<EffectApplicator> {
    let mut merged: Vec<EffectApplicator> = Vec::new();
    for applicator in sources {
        if let Some(existing) = merged
            .iter_mut()
            .find(|a| a.effect == applicator.effect && a.trigger == applicator.trigger)
        {
            existing.chance += applicator.chance;
        } else {
            merged.push(*applicator);
        }
    }
    merged
}
