#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Maze Survival stages headlessly.

mod config;
mod render;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use maze_survival_core::{ShapeTag, WELCOME_BANNER};
use maze_survival_system_stage::{Stage, StageConfig};

use crate::{
    config::SimulationFile,
    render::{agent_summary, render_ascii},
    session::{walk_to_exit, WalkPlan},
};

/// Command-line arguments accepted by the runner.
#[derive(Debug, Parser)]
#[command(name = "maze-survival", about = "Runs Maze Survival stages headlessly")]
struct Args {
    /// Level of the first stage.
    #[arg(long, default_value_t = 1)]
    level: u32,
    /// Number of consecutive stages to play.
    #[arg(long, default_value_t = 1)]
    stages: u32,
    /// Seed of the first stage.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
    /// Fixed maze outline; rotates through every shape by level when omitted.
    #[arg(long)]
    shape: Option<ShapeTag>,
    /// TOML file with stage, spawning and species tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seconds simulated per tick.
    #[arg(long, default_value_t = 0.05)]
    dt: f32,
    /// Ticks the scripted player spends on each tile.
    #[arg(long, default_value_t = 6)]
    ticks_per_tile: u32,
    /// Puzzle switches triggered at the start of each stage.
    #[arg(long, default_value_t = 0)]
    switches: usize,
    /// Shortest dead-end corridor that qualifies for a switch.
    #[arg(long, default_value_t = 5)]
    switch_segment: u32,
    /// Skip the map rendering.
    #[arg(long)]
    quiet: bool,
}

/// Entry point for the Maze Survival command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationFile::load(path)?.into_stage_config()?,
        None => StageConfig::default(),
    };
    if args.shape.is_some() {
        config.shape = args.shape;
    }

    println!("{WELCOME_BANNER}");

    let plan = WalkPlan {
        dt: args.dt,
        ticks_per_tile: args.ticks_per_tile,
        switches: args.switches,
        switch_segment: args.switch_segment,
    };
    let mut stage =
        Stage::new(config, args.level, args.seed).context("failed to build the first stage")?;

    for index in 0..args.stages.max(1) {
        if index > 0 {
            stage = stage
                .next_level()
                .context("failed to build the next stage")?;
        }

        let report = walk_to_exit(&mut stage, plan)?;
        let (columns, rows) = stage.space().dimensions();

        println!();
        println!("level {} ({columns}x{rows})", stage.level());
        if !args.quiet {
            println!("{}", render_ascii(&stage, report.final_cell));
        }
        println!(
            "walked {} tiles in {} ticks, reached exit: {}",
            report.tiles_walked, report.ticks, report.reached_exit
        );
        println!(
            "took {} hits for {} damage, {} chases started, {} walls removed",
            report.hits_taken, report.damage_taken, report.chases_started, report.walls_removed
        );
        for line in agent_summary(&stage) {
            println!("  {line}");
        }
    }

    Ok(())
}
