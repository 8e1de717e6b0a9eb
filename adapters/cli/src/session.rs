use anyhow::{Context, Result};
use log::{info, warn};
use maze_survival_core::{AgentState, CellCoord, Command, Event};
use maze_survival_system_agents::PlayerSnapshot;
use maze_survival_system_pathfinding::find_path;
use maze_survival_system_stage::Stage;
use maze_survival_world::query;

/// Pacing of the scripted player walk.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WalkPlan {
    /// Seconds simulated per tick.
    pub(crate) dt: f32,
    /// Ticks spent on each tile of the route.
    pub(crate) ticks_per_tile: u32,
    /// Puzzle switches triggered before the walk starts.
    pub(crate) switches: usize,
    /// Shortest dead-end corridor that qualifies for a switch.
    pub(crate) switch_segment: u32,
}

/// Outcome of one scripted stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct StageReport {
    pub(crate) ticks: u64,
    pub(crate) tiles_walked: usize,
    pub(crate) hits_taken: u32,
    pub(crate) damage_taken: u32,
    pub(crate) walls_removed: u32,
    pub(crate) chases_started: u32,
    pub(crate) reached_exit: bool,
    pub(crate) final_cell: Option<CellCoord>,
}

impl StageReport {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::PlayerStruck { damage, .. } => {
                    self.hits_taken += 1;
                    self.damage_taken = self.damage_taken.saturating_add(*damage);
                }
                Event::WallRemoved { .. } => self.walls_removed += 1,
                Event::AgentStateChanged {
                    to: AgentState::Chase,
                    from,
                    ..
                } if *from != AgentState::Attack => self.chases_started += 1,
                _ => {}
            }
        }
    }
}

/// Walks the player along the shortest route from the entrance to the exit.
pub(crate) fn walk_to_exit(stage: &mut Stage, plan: WalkPlan) -> Result<StageReport> {
    let maze = query::maze(stage.world());
    let entrance = maze.entrance().context("stage has no entrance")?;
    let exit = maze.exit().context("stage has no exit")?;
    let route = find_path(maze.view(), entrance, exit)
        .with_context(|| format!("no route from {entrance} to {exit}"))?;

    let switches = stage.switch_positions(plan.switch_segment);
    if switches.len() < plan.switches {
        warn!(
            "only {} of {} requested switches fit on level {}",
            switches.len(),
            plan.switches,
            stage.level()
        );
    }
    for switch in switches.iter().take(plan.switches) {
        stage.queue(Command::RemoveWall { cell: switch.cell });
    }

    let space = stage.space();
    let mut report = StageReport::default();
    let mut position = None;
    for cell in route.cells() {
        let player = PlayerSnapshot {
            position: space.grid_to_world(*cell),
            stealthed: false,
        };
        for _ in 0..plan.ticks_per_tile.max(1) {
            let events = stage.tick(plan.dt, player);
            report.record(&events);
            report.ticks += 1;
        }
        report.tiles_walked += 1;
        position = Some(player.position);
    }

    report.final_cell = position.and_then(|position| stage.player_cell(position));
    report.reached_exit = position.is_some_and(|position| stage.reached_exit(position));
    info!(
        "level {} finished after {} ticks: {} hits for {} damage",
        stage.level(),
        report.ticks,
        report.hits_taken,
        report.damage_taken
    );
    Ok(report)
}
