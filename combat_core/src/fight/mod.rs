//! FightManager - owns both combatants and drives the fight lifecycle
//!
//! Lifecycle: `Idle → Spawning → Fighting → (Victory → Spawning | Defeat → Idle)`.
//! Everything happens inside [`FightManager::tick`]; observers read the queued
//! [`FightEvent`]s afterwards.

mod events;
mod pipeline;
mod save;

pub use events::{CombatRewards, CombatStatistics, FightEvent, Notification, NotificationKind};
pub use save::{SaveError, SAVE_VERSION};

use crate::combat::{resolve_attack, AttackResult};
use crate::combatant::Combatant;
use crate::condition::{CombatantTables, ConditionalModifierRegistry, PredicateContext, PredicateTrigger};
use crate::config::GameData;
use crate::effect::{apply_effect, tick::process_effect_tick, ActiveEffect, EffectTarget, EffectTrigger};
use crate::error::CombatError;
use crate::modifier::{ConditionalKey, ModifierId};
use crate::source::{AreaId, Loadout, MonsterId, PassiveId, ProviderHandle, StatProvider};
use crate::timer::{ms_to_ticks, Timer, TimerKind};
use crate::types::{BattleState, CombatantRole, EnemyState, EquipmentSlot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Why a passive is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassiveOrigin {
    /// Applied per spawn by the current monster
    Monster,
    /// Applied while the selected area is active
    Area,
    /// Added by an outside system
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePassiveRecord {
    pub passive: PassiveId,
    /// Only persistent records are written to saves
    pub persist_to_save: bool,
    pub display: bool,
    pub origin: PassiveOrigin,
}

/// The area and monster the player chose to fight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub area: AreaId,
    pub monster: MonsterId,
}

pub struct FightManager {
    data: Arc<GameData>,
    player: Combatant,
    enemy: Combatant,
    active_passives: BTreeMap<PassiveId, ActivePassiveRecord>,
    conditionals: ConditionalModifierRegistry,
    providers: Vec<Arc<dyn StatProvider>>,
    fight_in_progress: bool,
    is_active: bool,
    spawn_timer: Timer,
    selection: Option<Selection>,
    state: BattleState,
    /// Set by `decode` when the save referenced content that no longer exists
    should_reset_action: bool,
    statistics: CombatStatistics,
    events: Vec<FightEvent>,
    rng: StdRng,
}

impl FightManager {
    pub fn new(data: Arc<GameData>, loadout: Loadout) -> Self {
        Self::with_rng(data, loadout, StdRng::from_entropy())
    }

    /// Deterministic manager for tests and simulations
    pub fn with_seed(data: Arc<GameData>, loadout: Loadout, seed: u64) -> Self {
        Self::with_rng(data, loadout, StdRng::seed_from_u64(seed))
    }

    fn with_rng(data: Arc<GameData>, loadout: Loadout, rng: StdRng) -> Self {
        let mut manager = FightManager {
            data,
            player: Combatant::new_player(loadout),
            enemy: Combatant::new_enemy(),
            active_passives: BTreeMap::new(),
            conditionals: ConditionalModifierRegistry::new(),
            providers: Vec::new(),
            fight_in_progress: false,
            is_active: false,
            spawn_timer: Timer::new(TimerKind::Spawn),
            selection: None,
            state: BattleState::Idle,
            should_reset_action: false,
            statistics: CombatStatistics::default(),
            events: Vec::new(),
            rng,
        };
        manager.compute_all_stats();
        manager.player.fill();
        manager
    }

    // === Accessors ===

    pub fn data(&self) -> &GameData {
        &self.data
    }

    pub fn player(&self) -> &Combatant {
        &self.player
    }

    pub fn enemy(&self) -> &Combatant {
        &self.enemy
    }

    pub fn combatant(&self, role: CombatantRole) -> &Combatant {
        match role {
            CombatantRole::Player => &self.player,
            CombatantRole::Enemy => &self.enemy,
        }
    }

    fn combatant_mut(&mut self, role: CombatantRole) -> &mut Combatant {
        match role {
            CombatantRole::Player => &mut self.player,
            CombatantRole::Enemy => &mut self.enemy,
        }
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn fight_in_progress(&self) -> bool {
        self.fight_in_progress
    }

    pub fn spawn_timer(&self) -> &Timer {
        &self.spawn_timer
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn statistics(&self) -> &CombatStatistics {
        &self.statistics
    }

    pub fn conditionals(&self) -> &ConditionalModifierRegistry {
        &self.conditionals
    }

    pub fn active_passives(&self) -> impl Iterator<Item = &ActivePassiveRecord> {
        self.active_passives.values()
    }

    pub fn should_reset_action(&self) -> bool {
        self.should_reset_action
    }

    /// Take every event queued since the last call
    pub fn drain_events(&mut self) -> Vec<FightEvent> {
        std::mem::take(&mut self.events)
    }

    fn set_state(&mut self, to: BattleState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        debug!(?from, ?to, "battle state changed");
        self.events.push(FightEvent::StateChanged { from, to });
    }

    fn predicate_context(&self) -> PredicateContext {
        PredicateContext {
            player: self.player.view(),
            enemy: self.enemy.view(),
        }
    }

    // === External inputs ===

    /// Register an outside provider of modifiers. Each instance may be registered once.
    pub fn register_stat_provider(&mut self, provider: Arc<dyn StatProvider>) -> Result<ProviderHandle, CombatError> {
        if self.providers.iter().any(|p| Arc::ptr_eq(p, &provider)) {
            return Err(CombatError::ProviderAlreadyRegistered(provider.id().to_string()));
        }
        let handle = ProviderHandle(self.providers.len() as u32);
        debug!(provider = provider.id(), "registered stat provider");
        self.providers.push(provider);
        self.compute_all_stats();
        Ok(handle)
    }

    /// Replace the player's loadout and recompute
    pub fn set_loadout(&mut self, loadout: Loadout) {
        if let Some(player) = self.player.player_data_mut() {
            player.loadout = loadout;
        }
        self.compute_all_stats();
    }

    pub fn add_passive(&mut self, passive: PassiveId, persist_to_save: bool, display: bool) {
        self.insert_passive(passive, PassiveOrigin::External, persist_to_save, display);
        self.compute_all_stats();
    }

    fn insert_passive(&mut self, passive: PassiveId, origin: PassiveOrigin, persist_to_save: bool, display: bool) {
        self.active_passives.entry(passive).or_insert(ActivePassiveRecord {
            passive,
            persist_to_save,
            display,
            origin,
        });
    }

    pub fn remove_passive(&mut self, passive: PassiveId) -> bool {
        let removed = self.active_passives.remove(&passive).is_some();
        if removed {
            self.compute_all_stats();
        }
        removed
    }

    pub fn remove_all_passives(&mut self) {
        self.active_passives.clear();
        self.compute_all_stats();
    }

    fn remove_passives_from(&mut self, origins: &[PassiveOrigin]) {
        self.active_passives
            .retain(|_, record| !origins.contains(&record.origin));
    }

    // === Conditional pass-throughs ===

    /// Predicate-changed callback for one conditional
    pub fn on_predicate_changed(&mut self, key: ConditionalKey, met: bool) -> Result<bool, CombatError> {
        let mut tables = CombatantTables {
            player: &mut self.player.modifiers,
            enemy: &mut self.enemy.modifiers,
        };
        let flipped = self.conditionals.on_predicate_changed(key, met, &mut tables)?;
        self.recompute_if_dirty();
        Ok(flipped)
    }

    pub fn update_conditional_modifier_mult(
        &mut self,
        key: ConditionalKey,
        negative_multiplier: f64,
        positive_multiplier: f64,
    ) -> Result<(), CombatError> {
        let mut tables = CombatantTables {
            player: &mut self.player.modifiers,
            enemy: &mut self.enemy.modifiers,
        };
        self.conditionals
            .update_conditional_modifier_mult(key, negative_multiplier, positive_multiplier, &mut tables)?;
        self.recompute_if_dirty();
        Ok(())
    }

    pub fn remove_active_conditional(&mut self, key: ConditionalKey) -> Result<(), CombatError> {
        let mut tables = CombatantTables {
            player: &mut self.player.modifiers,
            enemy: &mut self.enemy.modifiers,
        };
        self.conditionals.remove_active_conditional(key, &mut tables)?;
        self.recompute_if_dirty();
        Ok(())
    }

    /// Re-evaluate conditionals listening to `fired`, then run the post pass if anything changed
    fn notify(&mut self, fired: &[PredicateTrigger]) {
        if fired.is_empty() {
            return;
        }
        let ctx = self.predicate_context();
        let mut tables = CombatantTables {
            player: &mut self.player.modifiers,
            enemy: &mut self.enemy.modifiers,
        };
        let flipped = self.conditionals.refresh(fired, &ctx, &mut tables);
        if !flipped.is_empty() {
            self.events.push(FightEvent::ConditionalsChanged {
                flipped: flipped.len(),
            });
        }
        self.recompute_if_dirty();
    }

    // === Selection ===

    /// Choose a monster in an area and start fighting it
    pub fn select_area(&mut self, area: AreaId, monster: MonsterId) -> Result<(), CombatError> {
        let area_def = self.data.areas.get(area);
        if !area_def.contains(monster) {
            return Err(CombatError::MonsterNotInArea {
                area: area_def.id.clone(),
                monster: self.data.monsters.key_of(monster).to_string(),
            });
        }
        if self.is_active {
            self.stop(false);
        }
        self.selection = Some(Selection { area, monster });
        self.on_selection();
        Ok(())
    }

    /// Resume fighting the last selection. Returns false when there is nothing to fight.
    pub fn engage(&mut self) -> bool {
        if self.selection.is_none() {
            self.events
                .push(FightEvent::Notification(Notification::warning("No monster selected")));
            return false;
        }
        if self.is_active {
            return true;
        }
        self.on_selection();
        true
    }

    fn on_selection(&mut self) {
        self.is_active = true;
        if let Some(selection) = self.selection {
            let data = Arc::clone(&self.data);
            for &passive in &data.areas.get(selection.area).passive_ids {
                self.insert_passive(passive, PassiveOrigin::Area, false, true);
            }
        }
        self.compute_all_stats();
        self.load_next_enemy();
    }

    // === Tick ===

    /// Advance the fight by one tick.
    ///
    /// A freshly spawned enemy and the player start their action timers on
    /// the spawn tick; the first countdown step happens on the next tick.
    pub fn tick(&mut self) {
        let spawned = self.spawn_timer.tick();
        if spawned {
            self.spawn_enemy();
        }

        if self.fight_in_progress && !spawned {
            if !self.player.is_dead() && !self.enemy.is_dead() && self.player.action_timer.tick() {
                self.attack(CombatantRole::Player);
            }
            if !self.player.is_dead() && !self.enemy.is_dead() && self.enemy.action_timer.tick() {
                self.attack(CombatantRole::Enemy);
            }
            self.tick_effects();
        }

        self.check_death();
    }

    fn attack(&mut self, attacker: CombatantRole) {
        let result = match attacker {
            CombatantRole::Player => resolve_attack(&mut self.player, &mut self.enemy, &mut self.rng),
            CombatantRole::Enemy => resolve_attack(&mut self.enemy, &mut self.player, &mut self.rng),
        };
        self.statistics.record_attack(&result);
        self.events.push(FightEvent::Attack(result));

        let mut fired = Vec::new();
        if result.hit {
            fired.extend(hit_triggers(&result));
            if !result.killing_blow {
                fired.extend(self.roll_applicators(attacker, EffectTrigger::OnHit));
            }
        }
        self.notify(&fired);

        let tick_ms = self.data.constants.tick_ms;
        let combatant = self.combatant_mut(attacker);
        let interval = combatant.stats.attack_interval_ms;
        combatant.action_timer.start(ms_to_ticks(interval, tick_ms));
    }

    /// Roll every applicator of `owner` with the given trigger
    fn roll_applicators(&mut self, owner: CombatantRole, trigger: EffectTrigger) -> Vec<PredicateTrigger> {
        let data = Arc::clone(&self.data);
        let applicators: Vec<_> = self
            .combatant(owner)
            .applicators
            .iter()
            .filter(|a| a.trigger == trigger)
            .copied()
            .collect();

        let mut fired = Vec::new();
        for applicator in applicators {
            if self.rng.gen::<f64>() * 100.0 >= applicator.chance {
                continue;
            }
            let def = data.effects.get(applicator.effect);
            let target = match def.target {
                EffectTarget::Opponent => owner.opponent(),
                EffectTarget::Owner => owner,
            };
            let effect = ActiveEffect::new(
                applicator.effect,
                def.kind,
                owner,
                def.amount,
                ms_to_ticks(def.interval_ms as f64, data.constants.tick_ms),
                def.procs,
            );
            apply_effect(&mut self.combatant_mut(target).effects, effect, &def.stacking);
            self.events.push(FightEvent::EffectApplied {
                target,
                effect: def.id.clone(),
            });
            fired.push(PredicateTrigger::Effects(target));
        }
        fired
    }

    fn tick_effects(&mut self) {
        let mut fired = Vec::new();
        for role in [CombatantRole::Player, CombatantRole::Enemy] {
            let combatant = self.combatant_mut(role);
            if combatant.effects.is_empty() || combatant.is_dead() {
                continue;
            }
            let result = process_effect_tick(&mut combatant.effects);
            if !result.procced {
                if !result.expired.is_empty() {
                    fired.push(PredicateTrigger::Effects(role));
                }
                continue;
            }

            let applied = combatant.apply_damage(result.damage);
            let healed = combatant.heal(result.healing);
            match role {
                CombatantRole::Player => self.statistics.damage_taken += result.damage,
                CombatantRole::Enemy => self.statistics.damage_dealt += result.damage,
            }
            self.events.push(FightEvent::EffectTick {
                target: role,
                damage: result.damage,
                healing: healed,
            });

            fired.push(PredicateTrigger::Hitpoints(role));
            if applied.barrier_absorbed > 0.0 {
                fired.push(PredicateTrigger::Barrier(role));
            }
            if !result.expired.is_empty() {
                fired.push(PredicateTrigger::Effects(role));
            }
        }
        self.notify(&fired);
    }

    // === Lifecycle ===

    fn spawn_enemy(&mut self) {
        let Some(selection) = self.selection else {
            self.stop(false);
            return;
        };
        let data = Arc::clone(&self.data);
        let monster = data.monsters.get(selection.monster);

        self.enemy.set_new_monster(selection.monster);
        for &passive in &monster.passive_ids {
            self.insert_passive(passive, PassiveOrigin::Monster, false, true);
        }
        self.enemy.set_enemy_state(EnemyState::Alive);
        self.fight_in_progress = true;
        self.compute_all_stats();
        self.enemy.fill();

        self.player.turns_taken = 0;
        self.player.target = Some(CombatantRole::Enemy);
        self.enemy.target = Some(CombatantRole::Player);
        let tick_ms = data.constants.tick_ms;
        for role in [CombatantRole::Player, CombatantRole::Enemy] {
            let combatant = self.combatant_mut(role);
            let interval = combatant.stats.attack_interval_ms;
            combatant.action_timer.start(ms_to_ticks(interval, tick_ms));
        }

        let mut fired = vec![
            PredicateTrigger::Spawn,
            PredicateTrigger::Hitpoints(CombatantRole::Player),
            PredicateTrigger::Hitpoints(CombatantRole::Enemy),
            PredicateTrigger::Barrier(CombatantRole::Player),
            PredicateTrigger::Barrier(CombatantRole::Enemy),
        ];
        fired.extend(self.roll_applicators(CombatantRole::Player, EffectTrigger::OnSpawn));
        fired.extend(self.roll_applicators(CombatantRole::Enemy, EffectTrigger::OnSpawn));
        self.notify(&fired);
        // Conditionals that went live on spawn may have raised the enemy's maxima
        self.enemy.fill();

        info!(monster = %monster.id, "enemy spawned");
        self.events.push(FightEvent::EnemySpawned {
            monster: monster.id.clone(),
        });
        self.set_state(BattleState::Fighting);
    }

    fn check_death(&mut self) {
        if !self.fight_in_progress {
            return;
        }
        if self.player.is_dead() {
            self.on_player_death();
            if self.is_active {
                self.stop(false);
            } else {
                self.end_fight();
                self.set_state(BattleState::Idle);
            }
        } else if self.enemy.is_alive() && self.enemy.is_dead() {
            self.on_enemy_death();
            self.end_fight();
            self.load_next_enemy();
        }
    }

    fn on_player_death(&mut self) {
        self.statistics.deaths += 1;

        let chance = self.data.constants.death_penalty_chance;
        let lost_slot = if chance > 0.0 && self.rng.gen::<f64>() * 100.0 < chance {
            let occupied: Vec<EquipmentSlot> = self
                .player
                .loadout()
                .map(|loadout| loadout.equipment.equipped().map(|(slot, _)| slot).collect())
                .unwrap_or_default();
            (!occupied.is_empty()).then(|| occupied[self.rng.gen_range(0..occupied.len())])
        } else {
            None
        };

        info!(?lost_slot, "player died");
        self.events.push(FightEvent::PlayerDied { lost_slot });
        self.set_state(BattleState::Defeat);
        self.player.hitpoints = self.player.stats.max_hitpoints;
        self.player.barrier = 0.0;
    }

    fn on_enemy_death(&mut self) {
        self.statistics.kills += 1;
        self.enemy.set_enemy_state(EnemyState::Dead);

        let Some(monster_id) = self.enemy.monster() else {
            self.set_state(BattleState::Victory);
            return;
        };
        let data = Arc::clone(&self.data);
        let monster = data.monsters.get(monster_id);
        let table = self.player.modifiers();
        let xp_bonus = 1.0 + table.get(ModifierId::CombatXpPercent) / 100.0;
        let gp_bonus = 1.0 + table.get(ModifierId::GpFromMonstersPercent) / 100.0;

        let gp = (monster.roll_gp(&mut self.rng) as f64 * gp_bonus).floor().max(0.0) as u32;
        let loot = monster
            .roll_loot(&mut self.rng)
            .map(|(item, quantity)| (data.items.key_of(item).to_string(), quantity));
        let pet = monster.roll_pet(&mut self.rng).map(str::to_string);
        let rewards = CombatRewards {
            xp: (monster.xp * xp_bonus).max(0.0),
            gp,
            loot,
            pet,
        };

        info!(monster = %monster.id, xp = rewards.xp, gp = rewards.gp, "enemy killed");
        self.events.push(FightEvent::EnemyKilled {
            monster: monster.id.clone(),
            rewards,
        });
        self.set_state(BattleState::Victory);
    }

    /// Both combatants stop acting; monster passives are dropped
    fn end_fight(&mut self) {
        self.fight_in_progress = false;
        self.player.end_fight();
        self.enemy.end_fight();
        self.remove_passives_from(&[PassiveOrigin::Monster]);
        self.compute_all_stats();
    }

    fn load_next_enemy(&mut self) {
        self.enemy.set_enemy_state(EnemyState::Spawning);
        let constants = &self.data.constants;
        let spawn_ms = constants.spawn_time_ms as f64 + self.player.modifiers().get(ModifierId::SpawnTimerMs);
        self.spawn_timer.start(ms_to_ticks(spawn_ms, constants.tick_ms));
        self.set_state(BattleState::Spawning);
    }

    /// Leave the current fight and area. Always returns true.
    pub fn stop(&mut self, fled: bool) -> bool {
        if fled {
            self.statistics.fled += 1;
            self.events.push(FightEvent::Fled);
        }
        self.active_passives.clear();
        self.is_active = false;
        self.spawn_timer.stop();
        self.enemy.set_enemy_state(EnemyState::Dead);
        self.end_fight();

        let mut tables = CombatantTables {
            player: &mut self.player.modifiers,
            enemy: &mut self.enemy.modifiers,
        };
        self.conditionals.unregister_all(&mut tables);
        self.recompute_if_dirty();

        debug!(fled, "fight stopped");
        self.set_state(BattleState::Idle);
        true
    }

    /// Player-initiated stop. Returns false when there was nothing to flee from.
    pub fn flee(&mut self) -> bool {
        if !self.is_active {
            return false;
        }
        self.stop(true)
    }
}

/// Triggers fired by a landed attack
fn hit_triggers(result: &AttackResult) -> Vec<PredicateTrigger> {
    let defender = result.defender();
    let mut fired = vec![PredicateTrigger::Hitpoints(defender)];
    if result.barrier_absorbed > 0.0 {
        fired.push(PredicateTrigger::Barrier(defender));
    }
    if result.lifesteal_healed > 0.0 {
        fired.push(PredicateTrigger::Hitpoints(result.attacker));
    }
    fired
}
