//! Save codec - fight state as an ordered bincode stream
//!
//! Stream layout, in order:
//! 1. player combatant
//! 2. enemy combatant, then enemy slot (monster key, state, random attack roll)
//! 3. `fight_in_progress`
//! 4. spawn timer
//! 5. `is_active`
//! 6. passive count, then `(passive key, display)` per persistent passive
//! 7. (version 2+) selection as `(area key, monster key)`
//!
//! Content is referenced by key, never by registry index. Keys that no longer
//! resolve are dropped and flag the manager for a reset in `post_load`.

use super::{FightManager, PassiveOrigin, Selection};
use crate::combatant::Combatant;
use crate::config::GameData;
use crate::effect::{ActiveEffect, EffectKind};
use crate::timer::Timer;
use crate::types::{AttackType, BattleState, CombatantRole, EnemyState};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Newest stream version `encode` writes
pub const SAVE_VERSION: u32 = 2;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Save codec error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("Unsupported save version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EffectSave {
    effect: String,
    kind: EffectKind,
    source: CombatantRole,
    amount_per_proc: f64,
    interval_ticks: u32,
    ticks_until_proc: u32,
    procs_left: u32,
    total_procs: u32,
    effectiveness: f64,
    is_strongest: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CombatantSave {
    hitpoints: f64,
    barrier: f64,
    action_timer: Timer,
    turns_taken: u32,
    effects: Vec<EffectSave>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EnemySave {
    monster: Option<String>,
    state: EnemyState,
    random_attack_type: Option<AttackType>,
}

impl CombatantSave {
    fn capture(combatant: &Combatant, data: &GameData) -> Self {
        CombatantSave {
            hitpoints: combatant.hitpoints,
            barrier: combatant.barrier,
            action_timer: combatant.action_timer,
            turns_taken: combatant.turns_taken,
            effects: combatant
                .effects
                .iter()
                .map(|effect| EffectSave {
                    effect: data.effects.key_of(effect.effect).to_string(),
                    kind: effect.kind,
                    source: effect.source,
                    amount_per_proc: effect.amount_per_proc,
                    interval_ticks: effect.interval_ticks,
                    ticks_until_proc: effect.ticks_until_proc,
                    procs_left: effect.procs_left,
                    total_procs: effect.total_procs,
                    effectiveness: effect.effectiveness,
                    is_strongest: effect.is_strongest,
                })
                .collect(),
        }
    }

    /// Write saved state back. Returns false if any effect key was unknown.
    fn restore(self, combatant: &mut Combatant, data: &GameData) -> bool {
        let mut complete = true;
        combatant.hitpoints = self.hitpoints;
        combatant.barrier = self.barrier;
        combatant.action_timer = self.action_timer;
        combatant.turns_taken = self.turns_taken;
        combatant.effects.clear();

        for saved in self.effects {
            let Some(effect) = data.effects.lookup(&saved.effect) else {
                warn!(effect = %saved.effect, "dropping unknown combat effect from save");
                complete = false;
                continue;
            };
            combatant.effects.push(ActiveEffect {
                effect,
                kind: saved.kind,
                source: saved.source,
                amount_per_proc: saved.amount_per_proc,
                interval_ticks: saved.interval_ticks.max(1),
                ticks_until_proc: saved.ticks_until_proc,
                procs_left: saved.procs_left,
                total_procs: saved.total_procs,
                effectiveness: saved.effectiveness,
                is_strongest: saved.is_strongest,
            });
        }
        complete
    }
}

impl FightManager {
    /// Write the fight state to `writer` at `SAVE_VERSION`
    pub fn encode<W: Write>(&self, mut writer: W) -> Result<(), SaveError> {
        let data = &*self.data;

        bincode::serialize_into(&mut writer, &CombatantSave::capture(&self.player, data))?;
        bincode::serialize_into(&mut writer, &CombatantSave::capture(&self.enemy, data))?;
        let enemy = self.enemy.enemy_data();
        let enemy_save = EnemySave {
            monster: self.enemy.monster().map(|id| data.monsters.key_of(id).to_string()),
            state: self.enemy.enemy_state(),
            random_attack_type: enemy.and_then(|e| e.random_attack_type()),
        };
        bincode::serialize_into(&mut writer, &enemy_save)?;
        bincode::serialize_into(&mut writer, &self.fight_in_progress)?;
        bincode::serialize_into(&mut writer, &self.spawn_timer)?;
        bincode::serialize_into(&mut writer, &self.is_active)?;

        let persistent: Vec<(String, bool)> = self
            .active_passives
            .values()
            .filter(|record| record.persist_to_save)
            .map(|record| (data.passives.key_of(record.passive).to_string(), record.display))
            .collect();
        bincode::serialize_into(&mut writer, &(persistent.len() as u32))?;
        for entry in &persistent {
            bincode::serialize_into(&mut writer, entry)?;
        }

        let selection = self.selection.map(|selection| {
            (
                data.areas.key_of(selection.area).to_string(),
                data.monsters.key_of(selection.monster).to_string(),
            )
        });
        bincode::serialize_into(&mut writer, &selection)?;

        debug!(passives = persistent.len(), "encoded fight state");
        Ok(())
    }

    /// Read fight state written at `version`.
    ///
    /// Unknown content keys are replaced by defaults and set
    /// `should_reset_action`. Call `post_load` afterwards.
    pub fn decode<R: Read>(&mut self, mut reader: R, version: u32) -> Result<(), SaveError> {
        if version > SAVE_VERSION {
            return Err(SaveError::UnsupportedVersion {
                found: version,
                supported: SAVE_VERSION,
            });
        }
        let data = Arc::clone(&self.data);

        let player: CombatantSave = bincode::deserialize_from(&mut reader)?;
        let enemy: CombatantSave = bincode::deserialize_from(&mut reader)?;
        let enemy_slot: EnemySave = bincode::deserialize_from(&mut reader)?;
        let fight_in_progress: bool = bincode::deserialize_from(&mut reader)?;
        let spawn_timer: Timer = bincode::deserialize_from(&mut reader)?;
        let is_active: bool = bincode::deserialize_from(&mut reader)?;
        let passive_count: u32 = bincode::deserialize_from(&mut reader)?;
        let mut passives = Vec::new();
        for _ in 0..passive_count {
            let entry: (String, bool) = bincode::deserialize_from(&mut reader)?;
            passives.push(entry);
        }
        let selection: Option<(String, String)> = if version >= 2 {
            bincode::deserialize_from(&mut reader)?
        } else {
            None
        };

        let mut complete = player.restore(&mut self.player, &data);
        complete &= enemy.restore(&mut self.enemy, &data);

        let monster = match enemy_slot.monster.as_deref() {
            Some(key) => {
                let monster = data.monsters.lookup(key);
                if monster.is_none() {
                    warn!(monster = key, "unknown monster in save");
                    complete = false;
                }
                monster
            }
            None => None,
        };
        if let Some(slot) = self.enemy.enemy_data_mut() {
            slot.monster = monster;
            slot.state = enemy_slot.state;
            slot.random_attack_type = enemy_slot.random_attack_type;
        }
        if fight_in_progress && monster.is_none() {
            complete = false;
        }

        self.fight_in_progress = fight_in_progress;
        self.spawn_timer = spawn_timer;
        self.is_active = is_active;

        self.active_passives.clear();
        for (key, display) in passives {
            match data.passives.lookup(&key) {
                Some(passive) => self.insert_passive(passive, PassiveOrigin::External, true, display),
                None => {
                    warn!(passive = %key, "unknown passive in save");
                    complete = false;
                }
            }
        }

        self.selection = None;
        if let Some((area_key, monster_key)) = selection {
            let area = data.areas.lookup(&area_key);
            let monster = data.monsters.lookup(&monster_key);
            match (area, monster) {
                (Some(area), Some(monster)) if data.areas.get(area).contains(monster) => {
                    self.selection = Some(Selection { area, monster });
                }
                _ => {
                    warn!(area = %area_key, monster = %monster_key, "unknown selection in save");
                    complete = false;
                }
            }
        }

        if !complete {
            self.should_reset_action = true;
        }
        debug!(version, complete, "decoded fight state");
        Ok(())
    }

    /// Rebuild derived state after `decode`.
    ///
    /// Non-persistent passives come back from the current area and monster.
    /// A save that referenced missing content leaves the fight idle.
    pub fn post_load(&mut self) {
        if self.should_reset_action {
            warn!("save referenced missing content, resetting fight");
            self.should_reset_action = false;
            self.stop(false);
            return;
        }

        let data = Arc::clone(&self.data);
        if self.is_active {
            if let Some(selection) = self.selection {
                for &passive in &data.areas.get(selection.area).passive_ids {
                    self.insert_passive(passive, PassiveOrigin::Area, false, true);
                }
            }
        }
        if self.fight_in_progress {
            if let Some(monster) = self.enemy.monster() {
                for &passive in &data.monsters.get(monster).passive_ids {
                    self.insert_passive(passive, PassiveOrigin::Monster, false, true);
                }
            }
            self.player.target = Some(CombatantRole::Enemy);
            self.enemy.target = Some(CombatantRole::Player);
        }

        self.compute_all_stats();

        let state = if self.fight_in_progress {
            BattleState::Fighting
        } else if self.is_active && self.spawn_timer.is_active() {
            BattleState::Spawning
        } else {
            BattleState::Idle
        };
        self.set_state(state);
    }
}
