//! combat_sim - Headless fight runner for combat_core content
//!
//! Loads content, selects an area and monster, runs the fight loop for a
//! number of ticks and reports what happened. Fight state can be written to
//! and resumed from a save file.

use anyhow::{bail, Context, Result};
use clap::Parser;
use combat_core::prelude::*;
use combat_core::{CombatStatistics, SAVE_VERSION};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "combat_sim", about = "Run idle combat fights without a front-end")]
struct Args {
    /// Content file to load instead of the built-in content
    #[arg(long)]
    content: Option<PathBuf>,

    /// Area to fight in
    #[arg(long, default_value = "farmlands")]
    area: String,

    /// Monster to fight
    #[arg(long, default_value = "chicken")]
    monster: String,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 20_000)]
    ticks: u32,

    /// RNG seed; a random one is picked when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Resume from a save file instead of starting a new fight
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write the fight state here when the run ends
    #[arg(long)]
    save: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "combat_sim=info,combat_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let data = match &args.content {
        Some(path) => GameData::load(path).with_context(|| format!("loading content from {}", path.display()))?,
        None => GameData::builtin().context("loading built-in content")?,
    };
    let data = Arc::new(data);

    let Some(loadout_def) = data.loadout.clone() else {
        bail!("content has no [loadout] table");
    };
    let loadout = loadout_def.resolve(&data).context("resolving starting loadout")?;

    let seed = args.seed.unwrap_or_else(|| ChaCha8Rng::from_entropy().gen());
    info!(seed, "starting simulation");
    let mut manager = FightManager::with_seed(Arc::clone(&data), loadout, seed);

    match &args.load {
        Some(path) => load_save(&mut manager, path)?,
        None => {
            let area = data.areas.resolve(&args.area)?;
            let monster = data.monsters.resolve(&args.monster)?;
            manager.select_area(area, monster)?;
        }
    }

    for _ in 0..args.ticks {
        manager.tick();
        for event in manager.drain_events() {
            log_event(&event);
        }
    }

    if let Some(path) = &args.save {
        write_save(&manager, path)?;
    }

    let stats = manager.statistics();
    if args.json {
        let report = serde_json::json!({
            "seed": seed,
            "ticks": args.ticks,
            "state": manager.state(),
            "statistics": stats,
            "hit_rate": stats.hit_rate(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(seed, args.ticks, manager.state(), stats);
    }
    Ok(())
}

fn log_event(event: &FightEvent) {
    match event {
        FightEvent::Attack(result) => debug!("{}", result.summary()),
        FightEvent::EnemySpawned { monster } => info!(%monster, "enemy spawned"),
        FightEvent::EnemyKilled { monster, rewards } => info!(
            %monster,
            xp = rewards.xp,
            gp = rewards.gp,
            loot = ?rewards.loot,
            pet = ?rewards.pet,
            "enemy killed"
        ),
        FightEvent::PlayerDied { lost_slot } => warn!(?lost_slot, "player died"),
        FightEvent::Notification(notification) => warn!("{}", notification.message),
        other => debug!(?other, "fight event"),
    }
}

fn print_report(seed: u64, ticks: u32, state: BattleState, stats: &CombatStatistics) {
    println!("=== Simulation Report ===");
    println!("Seed:         {}", seed);
    println!("Ticks:        {}", ticks);
    println!("Final state:  {:?}", state);
    println!("Kills:        {}", stats.kills);
    println!("Deaths:       {}", stats.deaths);
    println!("Fled:         {}", stats.fled);
    println!("Hit rate:     {:.1}%", stats.hit_rate() * 100.0);
    println!("Damage dealt: {:.0}", stats.damage_dealt);
    println!("Damage taken: {:.0}", stats.damage_taken);
}

/// Save files start with the stream version as a little-endian u32
fn write_save(manager: &FightManager, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&SAVE_VERSION.to_le_bytes())?;
    manager.encode(&mut writer)?;
    writer.flush()?;
    info!(path = %path.display(), "saved fight state");
    Ok(())
}

fn load_save(manager: &mut FightManager, path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut version = [0u8; 4];
    reader.read_exact(&mut version).context("reading save version")?;
    let version = u32::from_le_bytes(version);

    manager.decode(&mut reader, version)?;
    manager.post_load();
    info!(path = %path.display(), version, state = ?manager.state(), "loaded fight state");
    Ok(())
}
