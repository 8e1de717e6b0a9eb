use maze_survival_core::{AgentState, Command, Event, ShapeTag, WorldPoint};
use maze_survival_system_agents::{AgentSnapshot, PlayerSnapshot};
use maze_survival_system_pathfinding::find_path;
use maze_survival_system_stage::{Stage, StageConfig, MAX_TICK};
use maze_survival_world::query;

fn still(position: WorldPoint) -> PlayerSnapshot {
    PlayerSnapshot {
        position,
        stealthed: false,
    }
}

/// Walks the player from the entrance to the exit one tile every five ticks
/// and records everything the stage reports.
fn scripted_run(seed: u64, level: u32) -> (Vec<Event>, Vec<AgentSnapshot>, bool) {
    let mut stage = Stage::new(StageConfig::default(), level, seed).expect("stage builds");
    let maze = query::maze(stage.world());
    let entrance = maze.entrance().expect("entrance placed");
    let exit = maze.exit().expect("exit placed");
    let route = find_path(maze.view(), entrance, exit).expect("exit reachable");
    let space = stage.space();

    let mut log = Vec::new();
    let mut position = space.grid_to_world(entrance);
    for cell in route.cells() {
        position = space.grid_to_world(*cell);
        for _ in 0..5 {
            log.extend(stage.tick(0.05, still(position)));
        }
    }

    let reached = stage.reached_exit(position);
    (log, stage.agents().snapshots(), reached)
}

#[test]
fn scripted_stage_replays_identically() {
    let (first_log, first_agents, first_reached) = scripted_run(0x5eed, 3);
    let (second_log, second_agents, second_reached) = scripted_run(0x5eed, 3);

    assert_eq!(first_log, second_log);
    assert_eq!(first_agents, second_agents);
    assert!(first_reached && second_reached);
    assert!(matches!(first_log.first(), Some(Event::StageGenerated { .. })));
}

#[test]
fn different_seeds_diverge() {
    let (first_log, _, _) = scripted_run(1, 2);
    let (second_log, _, _) = scripted_run(2, 2);
    assert_ne!(first_log, second_log);
}

#[test]
fn first_tick_reports_generation_and_spawns() {
    let mut stage = Stage::new(StageConfig::default(), 4, 9).expect("stage builds");
    let start = stage.player_start().expect("entrance placed");

    let events = stage.tick(0.016, still(start));

    let spawned = events
        .iter()
        .filter(|event| matches!(event, Event::AgentSpawned { .. }))
        .count();
    assert_eq!(spawned, stage.agents().len());
    assert!(spawned > 0);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::CellsRevealed { .. })));
    assert!(query::explored(stage.world()).iter().any(|seen| *seen));

    let later = stage.tick(0.016, still(start));
    assert!(!later
        .iter()
        .any(|event| matches!(event, Event::StageGenerated { .. } | Event::AgentSpawned { .. })));
}

#[test]
fn queued_wall_removal_lands_before_the_agent_pass() {
    let config = StageConfig {
        shape: Some(ShapeTag::Rectangle),
        ..StageConfig::default()
    };
    let mut stage = Stage::new(config, 5, 77).expect("stage builds");
    let start = stage.player_start().expect("entrance placed");
    let _ = stage.tick(MAX_TICK, still(start));

    let switch = stage
        .switch_positions(3)
        .into_iter()
        .next()
        .expect("a switch placement exists");
    stage.queue(Command::RemoveWall { cell: switch.cell });
    assert!(!query::grid_view(stage.world()).is_open(switch.cell));

    let events = stage.tick(MAX_TICK, still(start));

    assert!(query::grid_view(stage.world()).is_open(switch.cell));
    let removed_at = events
        .iter()
        .position(|event| *event == Event::WallRemoved { cell: switch.cell })
        .expect("wall removal reported");
    let first_agent_event = events.iter().position(|event| {
        matches!(
            event,
            Event::AgentStateChanged { .. } | Event::AgentTileCompleted { .. }
        )
    });
    if let Some(index) = first_agent_event {
        assert!(removed_at < index);
    }
}

#[test]
fn oversized_steps_are_clamped() {
    let mut stage = Stage::new(StageConfig::default(), 1, 12).expect("stage builds");
    let far_away = still(WorldPoint::new(1_000.0, 1_000.0));
    let _ = stage.tick(MAX_TICK, far_away);
    let agent = stage.agents().snapshots()[0].id;

    assert!(stage.freeze(agent, 0.35));
    for _ in 0..3 {
        let _ = stage.tick(10.0, far_away);
        assert!(stage.agents().get(agent).is_some_and(|agent| agent.is_frozen()));
    }

    let events = stage.tick(10.0, far_away);
    assert!(events.contains(&Event::AgentThawed { agent }));
}

#[test]
fn strikes_are_reported_on_the_next_tick() {
    let mut stage = Stage::new(StageConfig::default(), 2, 13).expect("stage builds");
    let far_away = still(WorldPoint::new(1_000.0, 1_000.0));
    let _ = stage.tick(MAX_TICK, far_away);
    let agent = stage.agents().snapshots()[0].id;

    assert!(stage.strike(agent, u32::MAX));
    let events = stage.tick(MAX_TICK, far_away);

    assert!(events.contains(&Event::AgentDied { agent }));
    assert_eq!(
        stage.agents().get(agent).map(|agent| agent.state()),
        Some(AgentState::Die)
    );
}

#[test]
fn later_levels_never_shrink() {
    let mut stage = Stage::new(StageConfig::default(), 1, 21).expect("stage builds");
    let mut previous = query::maze(stage.world()).dimensions();

    for expected_level in 2..=6 {
        stage = stage.next_level().expect("next stage builds");
        assert_eq!(stage.level(), expected_level);
        let dimensions = query::maze(stage.world()).dimensions();
        assert!(dimensions.0 >= previous.0 && dimensions.1 >= previous.1);
        previous = dimensions;
    }
}
