#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless runner that loads an Outbreak level and steps it frame by frame.

mod level_file;
mod script;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use outbreak_core::{Event, Faction, Level, SimulationConfig};
use outbreak_world::{query, TickReport, World};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{level_file::LevelFile, script::InputSegment};

/// Command-line arguments of the headless runner.
#[derive(Debug, Parser)]
#[command(name = "outbreak", about = "Runs an Outbreak level without a window", version)]
struct Cli {
    /// Level description in TOML.
    level: PathBuf,

    /// Tuning file in TOML; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    /// Overrides the seed of the tuning file.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Scripted input segments such as `right+infect:30`, played in order.
    #[arg(short, long = "input", value_name = "KEYS:FRAMES")]
    inputs: Vec<InputSegment>,

    /// Keeps running after the boss is defeated or the player is lost.
    #[arg(long)]
    keep_going: bool,
}

/// Entry point for the Outbreak command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let level = load_level(&cli.level)?;
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let mut world = World::from_level(level, config)
        .with_context(|| format!("failed to start level {}", cli.level.display()))?;

    let mut summary = Summary::default();
    for input in script::frames(&cli.inputs).take(usize::try_from(cli.frames)?) {
        let report = world.step(&input);
        summary.record(&report);
        if !cli.keep_going && (report.boss_defeated || report.player_lost) {
            break;
        }
    }

    summary.print(&world);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_level(path: &Path) -> Result<Level> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read level {}", path.display()))?;
    let file: LevelFile = toml::from_str(&text)
        .with_context(|| format!("failed to parse level {}", path.display()))?;
    file.into_level()
        .with_context(|| format!("invalid level {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        info!("no tuning file given, using defaults");
        return Ok(SimulationConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read tuning {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse tuning {}", path.display()))
}

#[derive(Debug, Default)]
struct Summary {
    ticks: u64,
    spawned: usize,
    converted: usize,
    died: usize,
    items: usize,
    outcome: Option<&'static str>,
}

impl Summary {
    fn record(&mut self, report: &TickReport) {
        self.ticks = report.tick;
        for event in &report.events {
            match event {
                Event::UnitSpawned { .. } => self.spawned += 1,
                Event::UnitConverted {
                    faction: Faction::Ally,
                    ..
                } => self.converted += 1,
                Event::UnitDied { .. } => self.died += 1,
                Event::ItemDropped { .. } => self.items += 1,
                _ => {}
            }
        }
        if report.boss_defeated {
            self.outcome = Some("boss defeated");
        } else if report.player_lost {
            self.outcome = Some("player lost");
        }
    }

    fn print(&self, world: &World) {
        let allies = query::units(world)
            .iter()
            .filter(|unit| unit.faction == Faction::Ally && unit.exists())
            .count();
        let explored = query::explored(world)
            .map(|tiles| tiles.iter().filter(|seen| **seen).count())
            .unwrap_or(0);

        println!("level:      {}", query::level_name(world));
        println!("ticks:      {}", self.ticks);
        println!("outcome:    {}", self.outcome.unwrap_or("running"));
        println!("units:      {} ({allies} allied)", query::units(world).len());
        println!("spawned:    {}", self.spawned);
        println!("converted:  {}", self.converted);
        println!("died:       {}", self.died);
        println!("items:      {} dropped, {} on the floor", self.items, query::items(world).len());
        println!("explored:   {explored} tiles");
        if let Some(player) = query::player(world) {
            println!(
                "infection:  {:.1}/{:.1} points, {} allies",
                player.infection_points, player.max_infection_points, player.num_allies
            );
        }
    }
}
