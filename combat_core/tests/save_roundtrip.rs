//! Save/load tests across two independent managers

use combat_core::fight::PassiveOrigin;
use combat_core::prelude::*;
use combat_core::{EnemyState, SaveError, SAVE_VERSION};
use std::sync::Arc;

fn manager(data: &Arc<GameData>, seed: u64) -> FightManager {
    let loadout = data.loadout.clone().unwrap_or_default().resolve(data).unwrap();
    FightManager::with_seed(Arc::clone(data), loadout, seed)
}

fn fight_goblin(manager: &mut FightManager, attacks: usize) {
    let area = manager.data().areas.lookup("goblin_village").unwrap();
    let goblin = manager.data().monsters.lookup("goblin").unwrap();
    manager.select_area(area, goblin).unwrap();

    let mut seen = 0;
    while seen < attacks {
        manager.tick();
        seen += manager
            .drain_events()
            .iter()
            .filter(|e| matches!(e, FightEvent::Attack(_)))
            .count();
        assert!(manager.statistics().kills == 0 && manager.statistics().deaths == 0);
    }
}

fn save(manager: &FightManager) -> Vec<u8> {
    let mut buf = Vec::new();
    manager.encode(&mut buf).unwrap();
    buf
}

#[test]
fn test_mid_fight_roundtrip() {
    let data = Arc::new(GameData::builtin().unwrap());
    let mut source = manager(&data, 21);
    let thick_hide = data.passives.lookup("thick_hide").unwrap();
    source.add_passive(thick_hide, true, false);
    fight_goblin(&mut source, 2);
    assert_eq!(source.state(), BattleState::Fighting);

    let bytes = save(&source);
    let mut restored = manager(&data, 0);
    restored.decode(bytes.as_slice(), SAVE_VERSION).unwrap();
    assert!(!restored.should_reset_action());
    restored.post_load();

    assert_eq!(restored.state(), BattleState::Fighting);
    assert!(restored.is_active());
    assert!(restored.fight_in_progress());
    assert_eq!(restored.selection(), source.selection());
    assert_eq!(restored.enemy().monster(), source.enemy().monster());
    assert_eq!(restored.enemy().enemy_state(), EnemyState::Alive);

    for role in [CombatantRole::Player, CombatantRole::Enemy] {
        let before = source.combatant(role);
        let after = restored.combatant(role);
        assert!((after.hitpoints() - before.hitpoints()).abs() < f64::EPSILON);
        assert!((after.barrier() - before.barrier()).abs() < f64::EPSILON);
        assert_eq!(after.turns_taken(), before.turns_taken());
        assert_eq!(after.action_timer(), before.action_timer());
        assert_eq!(after.effects().len(), before.effects().len());
        assert_eq!(after.modifiers().snapshot(), before.modifiers().snapshot());
        assert_eq!(after.stats(), before.stats());
    }

    let origins = |m: &FightManager| {
        let mut origins: Vec<_> = m.active_passives().map(|r| (r.passive, r.origin)).collect();
        origins.sort_by_key(|(passive, _)| *passive);
        origins
    };
    assert_eq!(origins(&restored), origins(&source));
    assert!(restored
        .active_passives()
        .any(|r| r.origin == PassiveOrigin::External && r.persist_to_save));
    assert_eq!(
        restored.conditionals().subscription_count(),
        source.conditionals().subscription_count()
    );
}

#[test]
fn test_spawning_roundtrip() {
    let data = Arc::new(GameData::builtin().unwrap());
    let mut source = manager(&data, 8);
    let area = data.areas.lookup("farmlands").unwrap();
    let cow = data.monsters.lookup("cow").unwrap();
    source.select_area(area, cow).unwrap();
    source.tick();
    assert_eq!(source.state(), BattleState::Spawning);

    let bytes = save(&source);
    let mut restored = manager(&data, 8);
    restored.decode(bytes.as_slice(), SAVE_VERSION).unwrap();
    restored.post_load();

    assert_eq!(restored.state(), BattleState::Spawning);
    assert_eq!(restored.spawn_timer(), source.spawn_timer());
    assert_eq!(restored.enemy().enemy_state(), EnemyState::Spawning);
}

#[test]
fn test_save_with_removed_content_resets() {
    let data = Arc::new(GameData::builtin().unwrap());
    let mut source = manager(&data, 21);
    fight_goblin(&mut source, 1);
    let bytes = save(&source);

    // Same content without goblins
    let mut file: combat_core::config::ContentFile =
        combat_core::config::parse_toml(include_str!("../content/base.toml")).unwrap();
    file.monsters.retain(|m| m.id != "goblin");
    for area in &mut file.areas {
        area.monsters.retain(|m| m != "goblin");
    }
    let trimmed = Arc::new(GameData::from_content(file).unwrap());

    let mut restored = manager(&trimmed, 21);
    restored.decode(bytes.as_slice(), SAVE_VERSION).unwrap();
    assert!(restored.should_reset_action());
    restored.post_load();

    assert!(!restored.should_reset_action());
    assert_eq!(restored.state(), BattleState::Idle);
    assert!(!restored.is_active());
    assert!(!restored.fight_in_progress());
    assert_eq!(restored.conditionals().subscription_count(), 0);
}

#[test]
fn test_future_version_rejected() {
    let data = Arc::new(GameData::builtin().unwrap());
    let source = manager(&data, 1);
    let bytes = save(&source);

    let mut restored = manager(&data, 1);
    let result = restored.decode(bytes.as_slice(), SAVE_VERSION + 1);
    assert!(matches!(
        result,
        Err(SaveError::UnsupportedVersion { found, supported }) if found == SAVE_VERSION + 1 && supported == SAVE_VERSION
    ));
}
