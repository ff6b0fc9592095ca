//! Fight lifecycle tests driven through the public FightManager API

use combat_core::fight::PassiveOrigin;
use combat_core::prelude::*;
use combat_core::{CombatError, CombatStatistics, EnemyState};
use std::sync::Arc;

const MAX_TICKS: u32 = 200_000;

fn separator(title: &str) {
    println!("\n=== {} ===", title);
}

fn print_statistics(stats: &CombatStatistics) {
    println!(
        "kills={} deaths={} fled={} hits={} misses={} dealt={:.0} taken={:.0}",
        stats.kills, stats.deaths, stats.fled, stats.hits, stats.misses, stats.damage_dealt, stats.damage_taken
    );
}

fn builtin() -> Arc<GameData> {
    Arc::new(GameData::builtin().unwrap())
}

fn manager_with(data: Arc<GameData>, def: &LoadoutDef, seed: u64) -> FightManager {
    let loadout = def.resolve(&data).unwrap();
    FightManager::with_seed(data, loadout, seed)
}

fn manager(seed: u64) -> FightManager {
    let data = builtin();
    let def = data.loadout.clone().unwrap_or_default();
    manager_with(data, &def, seed)
}

fn select(manager: &mut FightManager, area: &str, monster: &str) {
    let area = manager.data().areas.lookup(area).unwrap();
    let monster = manager.data().monsters.lookup(monster).unwrap();
    manager.select_area(area, monster).unwrap();
}

/// Tick until `done` holds, collecting every event along the way
fn run_until(manager: &mut FightManager, done: impl Fn(&FightManager) -> bool) -> Vec<FightEvent> {
    let mut events = Vec::new();
    for _ in 0..MAX_TICKS {
        manager.tick();
        events.extend(manager.drain_events());
        if done(manager) {
            return events;
        }
    }
    panic!("condition not reached within {} ticks", MAX_TICKS);
}

fn position(events: &[FightEvent], matches: impl Fn(&FightEvent) -> bool) -> usize {
    events.iter().position(matches).expect("event not emitted")
}

#[test]
fn test_chicken_fight_to_kill() {
    separator("Chicken Fight");
    let mut manager = manager(42);
    select(&mut manager, "farmlands", "chicken");
    assert_eq!(manager.state(), BattleState::Spawning);
    assert_eq!(manager.enemy().enemy_state(), EnemyState::Spawning);

    let mut events = manager.drain_events();
    events.extend(run_until(&mut manager, |m| m.statistics().kills > 0));
    print_statistics(manager.statistics());

    let spawning = position(&events, |e| {
        matches!(e, FightEvent::StateChanged { to: BattleState::Spawning, .. })
    });
    let spawned = position(&events, |e| matches!(e, FightEvent::EnemySpawned { .. }));
    let first_attack = position(&events, |e| matches!(e, FightEvent::Attack(_)));
    let killed = position(&events, |e| matches!(e, FightEvent::EnemyKilled { .. }));
    let victory = position(&events, |e| {
        matches!(e, FightEvent::StateChanged { to: BattleState::Victory, .. })
    });
    assert!(spawning < spawned);
    assert!(spawned < first_attack);
    assert!(first_attack < killed);
    assert!(killed < victory);

    match &events[killed] {
        FightEvent::EnemyKilled { monster, rewards } => {
            assert_eq!(monster, "chicken");
            assert!((rewards.xp - 8.0).abs() < f64::EPSILON);
            assert!(rewards.gp <= 3);
            assert!(rewards.pet.is_none());
        }
        other => panic!("unexpected event {:?}", other),
    }

    // The next enemy is already on its way
    assert_eq!(manager.state(), BattleState::Spawning);
    assert!(manager.is_active());
    assert!(!manager.fight_in_progress());
    assert!(manager.spawn_timer().is_active());
    assert_eq!(manager.statistics().deaths, 0);
}

#[test]
fn test_killing_blow_is_last_attack_of_fight() {
    let mut manager = manager(7);
    select(&mut manager, "farmlands", "chicken");
    let events = run_until(&mut manager, |m| m.statistics().kills > 0);

    let killed = position(&events, |e| matches!(e, FightEvent::EnemyKilled { .. }));
    let last_attack = events[..killed]
        .iter()
        .rev()
        .find_map(|e| match e {
            FightEvent::Attack(result) => Some(*result),
            _ => None,
        })
        .unwrap();
    assert!(last_attack.killing_blow);
    assert_eq!(last_attack.attacker, CombatantRole::Player);
}

#[test]
fn test_flee_returns_to_idle() {
    separator("Flee");
    let mut manager = manager(3);
    select(&mut manager, "goblin_village", "goblin");
    run_until(&mut manager, |m| m.state() == BattleState::Fighting);

    assert!(manager.conditionals().subscription_count() > 0);
    assert!(manager
        .active_passives()
        .any(|record| record.origin == PassiveOrigin::Monster));
    assert!(manager
        .active_passives()
        .any(|record| record.origin == PassiveOrigin::Area));

    assert!(manager.flee());
    let events = manager.drain_events();
    print_statistics(manager.statistics());

    assert!(events.contains(&FightEvent::Fled));
    assert_eq!(manager.state(), BattleState::Idle);
    assert!(!manager.is_active());
    assert!(!manager.fight_in_progress());
    assert!(!manager.spawn_timer().is_active());
    assert_eq!(manager.enemy().enemy_state(), EnemyState::Dead);
    assert_eq!(manager.statistics().fled, 1);
    assert_eq!(manager.conditionals().subscription_count(), 0);
    assert!(manager.conditionals().is_empty());
    assert_eq!(manager.active_passives().count(), 0);

    // Nothing left to flee from
    assert!(!manager.flee());
    assert_eq!(manager.statistics().fled, 1);
}

#[test]
fn test_stop_while_idle_is_harmless() {
    let mut manager = manager(1);
    assert!(manager.stop(false));
    assert_eq!(manager.state(), BattleState::Idle);
    assert_eq!(manager.conditionals().subscription_count(), 0);
    assert_eq!(manager.statistics().fled, 0);
}

#[test]
fn test_player_death_ends_fight() {
    separator("Player Death");
    let data = builtin();
    let def = LoadoutDef {
        levels: Levels::uniform(1),
        equipment: vec!["bronze_sword".to_string()],
        attack_style: Some("stab".to_string()),
        gamemode: vec![ModifierValue::new(ModifierId::DamageDealtPercent, -100.0)],
        ..LoadoutDef::default()
    };
    let mut manager = manager_with(data, &def, 11);
    select(&mut manager, "goblin_village", "golem");

    let events = run_until(&mut manager, |m| m.statistics().deaths > 0);
    print_statistics(manager.statistics());

    let died = position(&events, |e| matches!(e, FightEvent::PlayerDied { .. }));
    let defeat = position(&events, |e| {
        matches!(e, FightEvent::StateChanged { to: BattleState::Defeat, .. })
    });
    assert!(died < defeat);
    assert!(events.contains(&FightEvent::PlayerDied { lost_slot: None }));

    assert_eq!(manager.statistics().kills, 0);
    assert!((manager.statistics().damage_dealt).abs() < f64::EPSILON);
    assert_eq!(manager.state(), BattleState::Idle);
    assert!(!manager.is_active());
    assert_eq!(manager.conditionals().subscription_count(), 0);
    assert!((manager.player().hitpoints() - manager.player().stats().max_hitpoints).abs() < f64::EPSILON);
}

#[test]
fn test_engage_without_selection_warns() {
    let mut manager = manager(2);
    assert!(!manager.engage());
    let events = manager.drain_events();
    assert!(matches!(events.as_slice(), [FightEvent::Notification(_)]));
    assert_eq!(manager.state(), BattleState::Idle);
}

#[test]
fn test_engage_resumes_last_selection() {
    let mut manager = manager(2);
    select(&mut manager, "farmlands", "cow");
    manager.stop(false);
    assert_eq!(manager.state(), BattleState::Idle);

    assert!(manager.engage());
    assert_eq!(manager.state(), BattleState::Spawning);
    let cow = manager.data().monsters.lookup("cow").unwrap();
    assert_eq!(manager.selection().map(|s| s.monster), Some(cow));
}

#[test]
fn test_monster_must_belong_to_area() {
    let mut manager = manager(2);
    let area = manager.data().areas.lookup("farmlands").unwrap();
    let golem = manager.data().monsters.lookup("golem").unwrap();

    let result = manager.select_area(area, golem);
    assert!(matches!(result, Err(CombatError::MonsterNotInArea { .. })));
    assert!(!manager.is_active());
    assert!(manager.selection().is_none());
}

#[test]
fn test_stat_provider_registration() {
    let mut manager = manager(4);
    let before = manager.player().modifiers().get(ModifierId::CombatXpPercent);

    let bundle: Arc<dyn StatProvider> =
        Arc::new(ModifierBundle::new("skill_tree").with_modifier(ModifierId::CombatXpPercent, 25.0));
    manager.register_stat_provider(Arc::clone(&bundle)).unwrap();
    let after = manager.player().modifiers().get(ModifierId::CombatXpPercent);
    assert!((after - before - 25.0).abs() < f64::EPSILON);

    let duplicate = manager.register_stat_provider(bundle);
    assert!(matches!(duplicate, Err(CombatError::ProviderAlreadyRegistered(id)) if id == "skill_tree"));
}

#[test]
fn test_same_seed_same_fight() {
    let run = |seed| {
        let mut manager = manager(seed);
        select(&mut manager, "goblin_village", "goblin");
        let events = run_until(&mut manager, |m| m.statistics().kills + m.statistics().deaths > 0);
        (events, *manager.statistics())
    };

    let (events_a, stats_a) = run(99);
    let (events_b, stats_b) = run(99);
    assert_eq!(events_a, events_b);
    assert_eq!(stats_a, stats_b);
}
