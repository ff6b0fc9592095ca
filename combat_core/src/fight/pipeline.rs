//! Stat pipeline - collects every live source and runs the combatant passes

use super::FightManager;
use crate::combatant::Contribution;
use crate::condition::{CombatantTables, ConditionalCandidate};
use crate::config::GameData;
use crate::effect::{merge_applicators, EffectApplicator};
use crate::modifier::SourceId;
use crate::source::{Loadout, MonsterId, PassiveId, ProviderHandle, StatProvider};
use crate::types::{AttackType, EnemyState};
use std::sync::Arc;
use tracing::trace;

/// One player-side source with its provider
struct SourceEntry<'a> {
    source: SourceId,
    provider: &'a dyn StatProvider,
    /// Scale for negative values of this source's conditionals
    conditional_negative_multiplier: f64,
}

impl<'a> SourceEntry<'a> {
    fn new(source: SourceId, provider: &'a dyn StatProvider) -> Self {
        SourceEntry {
            source,
            provider,
            conditional_negative_multiplier: 1.0,
        }
    }
}

/// Owned copy of everything the pipeline reads, so the combatants can be
/// mutated while sources are borrowed
struct SourceSnapshot {
    data: Arc<GameData>,
    loadout: Loadout,
    providers: Vec<Arc<dyn StatProvider>>,
    passives: Vec<PassiveId>,
    attack_type: AttackType,
    unholy_multiplier: f64,
    /// Monster currently in the enemy slot, if it is spawning or alive
    monster: Option<MonsterId>,
}

impl SourceSnapshot {
    /// Every source that contributes to the player side, in a fixed order
    fn entries(&self) -> Vec<SourceEntry<'_>> {
        let data = &*self.data;
        let loadout = &self.loadout;
        let mut entries = Vec::new();

        for (index, provider) in self.providers.iter().enumerate() {
            entries.push(SourceEntry::new(
                SourceId::Provider(ProviderHandle(index as u32)),
                &**provider,
            ));
        }

        if let Some(style_id) = loadout.attack_style {
            let style = data.attack_styles.get(style_id);
            if style.attack_type == self.attack_type {
                entries.push(SourceEntry::new(SourceId::AttackStyle(style_id), style));
            }
        }

        for (slot, equipped) in loadout.equipment.equipped() {
            entries.push(SourceEntry::new(SourceId::Equipment(slot), data.items.get(equipped.item)));
        }

        for (id, synergy) in data.synergies.iter() {
            if synergy.is_active(&loadout.equipment) {
                entries.push(SourceEntry::new(SourceId::Synergy(id), synergy));
            }
        }

        for &prayer_id in &loadout.prayers {
            let prayer = data.prayers.get(prayer_id);
            let mut entry = SourceEntry::new(SourceId::Prayer(prayer_id), prayer);
            if prayer.unholy {
                entry.conditional_negative_multiplier = self.unholy_multiplier;
            }
            entries.push(entry);
        }

        if let Some(food) = loadout.food {
            entries.push(SourceEntry::new(SourceId::Food(food), data.foods.get(food)));
        }
        if let Some(aurora) = loadout.aurora {
            entries.push(SourceEntry::new(SourceId::Aurora(aurora), data.auroras.get(aurora)));
        }
        if let Some(potion) = loadout.potion {
            entries.push(SourceEntry::new(SourceId::Potion(potion), data.potions.get(potion)));
        }

        for &passive in &self.passives {
            entries.push(SourceEntry::new(SourceId::Passive(passive), data.passives.get(passive)));
        }

        entries
    }

    fn player_applicators(&self) -> Vec<EffectApplicator> {
        merge_applicators(
            self.loadout
                .equipment
                .equipped()
                .flat_map(|(_, equipped)| self.data.items.get(equipped.item).applicators.iter()),
        )
    }

    fn enemy_applicators(&self) -> Vec<EffectApplicator> {
        match self.monster {
            Some(monster) => merge_applicators(&self.data.monsters.get(monster).applicators),
            None => Vec::new(),
        }
    }
}

impl FightManager {
    fn source_snapshot(&self) -> SourceSnapshot {
        let monster = self
            .enemy
            .monster()
            .filter(|_| self.enemy.enemy_state() != EnemyState::Dead);
        SourceSnapshot {
            data: Arc::clone(&self.data),
            loadout: self.player.loadout().cloned().unwrap_or_default(),
            providers: self.providers.clone(),
            passives: self.active_passives.keys().copied().collect(),
            attack_type: self.player.attack_type(),
            unholy_multiplier: self
                .player
                .player_data()
                .map_or(1.0, |player| player.unholy_multiplier()),
            monster,
        }
    }

    /// Run every pass of the stat pipeline for both combatants
    pub fn compute_all_stats(&mut self) {
        let data = Arc::clone(&self.data);
        self.player.compute_pre_conditional(&data, &mut self.rng);
        self.enemy.compute_pre_conditional(&data, &mut self.rng);

        let snapshot = self.source_snapshot();
        self.rebuild_conditionals(&snapshot);
        self.merge_sources(&snapshot);

        self.player.compute_post_modifier_stats(&data.constants);
        self.enemy.compute_post_modifier_stats(&data.constants);
        trace!(
            conditionals = self.conditionals.len(),
            live = self.conditionals.live_count(),
            "recomputed combat stats"
        );
    }

    /// Tear down and rebuild every conditional modifier, then run the post pass
    pub fn compute_active_conditional_modifiers(&mut self) {
        let snapshot = self.source_snapshot();
        self.rebuild_conditionals(&snapshot);
        self.recompute_if_dirty();
    }

    /// Conditionals exist only while the manager is active
    fn rebuild_conditionals(&mut self, snapshot: &SourceSnapshot) {
        let entries = snapshot.entries();
        let candidates: Vec<ConditionalCandidate<'_>> = entries
            .iter()
            .filter(|entry| !entry.provider.conditional_modifiers().is_empty())
            .map(|entry| ConditionalCandidate {
                origin: entry.source,
                conditionals: entry.provider.conditional_modifiers(),
                negative_multiplier: entry.conditional_negative_multiplier,
                positive_multiplier: 1.0,
            })
            .collect();

        let ctx = self.predicate_context();
        let mut tables = CombatantTables {
            player: &mut self.player.modifiers,
            enemy: &mut self.enemy.modifiers,
        };
        if self.is_active {
            self.conditionals
                .compute_active_conditional_modifiers(&candidates, &ctx, &mut tables);
        } else {
            self.conditionals.unregister_all(&mut tables);
        }
    }

    /// Fold every direct source into the tables and merge effect applicators
    fn merge_sources(&mut self, snapshot: &SourceSnapshot) {
        let entries = snapshot.entries();

        let mut player = vec![Contribution::new(SourceId::Gamemode, &snapshot.loadout.gamemode)];
        player.extend(
            entries
                .iter()
                .map(|entry| Contribution::new(entry.source, entry.provider.modifiers())),
        );

        let mut enemy = Vec::new();
        if let Some(monster) = snapshot.monster {
            enemy.push(Contribution::new(
                SourceId::Monster(monster),
                &snapshot.data.monsters.get(monster).modifiers,
            ));
        }
        enemy.extend(
            entries
                .iter()
                .map(|entry| Contribution::new(entry.source, entry.provider.enemy_modifiers())),
        );

        self.player.reconcile_sources(&player);
        self.enemy.reconcile_sources(&enemy);
        self.player.applicators = snapshot.player_applicators();
        self.enemy.applicators = snapshot.enemy_applicators();
    }

    /// Post-modifier pass for any combatant whose table changed
    pub(crate) fn recompute_if_dirty(&mut self) {
        let constants = &self.data.constants;
        if self.player.modifiers.is_dirty() {
            self.player.compute_post_modifier_stats(constants);
        }
        if self.enemy.modifiers.is_dirty() {
            self.enemy.compute_post_modifier_stats(constants);
        }
    }
}
