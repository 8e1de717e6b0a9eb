use maze_survival_core::{
    AgentState, Cell, CellCoord, Event, GridView, ShapeTag, SpeciesKind, TileSpace, WorldPoint,
};
use maze_survival_system_agents::{AgentSnapshot, Agents, PlayerSnapshot, SpeciesTable, TickContext};
use maze_survival_system_maze_generation::MazeGenerator;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const TILE: f32 = 1.5;

fn player_at(x: f32, z: f32) -> PlayerSnapshot {
    PlayerSnapshot {
        position: WorldPoint::new(x, z),
        stealthed: false,
    }
}

/// Single open cell at the centre of an 11x11 grid, which maps to the world
/// origin with 1.5 unit tiles.
fn pocket() -> Vec<Cell> {
    let mut cells = vec![Cell::Wall; 121];
    cells[5 * 11 + 5] = Cell::Path;
    cells
}

fn tick(
    agents: &mut Agents,
    cells: &[Cell],
    columns: u32,
    rows: u32,
    player: PlayerSnapshot,
    rng: &mut ChaCha8Rng,
) -> Vec<Event> {
    let ctx = TickContext {
        grid: GridView::new(cells, columns, rows),
        space: TileSpace::new(columns, rows, TILE),
        player,
    };
    let mut events = Vec::new();
    agents.update_all(0.1, &ctx, rng, &mut events);
    events
}

#[test]
fn detection_switches_at_four_and_a_half_units() {
    let cells = pocket();
    let mut table = SpeciesTable::default();
    table.get_mut(SpeciesKind::Crawler).detection_range_tiles = 3.0;
    let mut agents = Agents::new(table, 1, TileSpace::new(11, 11, TILE));
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut events = Vec::new();
    let id = agents.spawn(SpeciesKind::Crawler, CellCoord::new(5, 5), &mut events);
    let state = |agents: &Agents| agents.get(id).map(|agent| agent.state());

    let _ = tick(&mut agents, &cells, 11, 11, player_at(4.5, 0.0), &mut rng);
    assert_eq!(state(&agents), Some(AgentState::Idle));

    let events = tick(&mut agents, &cells, 11, 11, player_at(4.4, 0.0), &mut rng);
    assert_eq!(state(&agents), Some(AgentState::Chase));
    assert!(events.contains(&Event::AgentStateChanged {
        agent: id,
        from: AgentState::Idle,
        to: AgentState::Chase,
    }));

    let events = tick(&mut agents, &cells, 11, 11, player_at(4.6, 0.0), &mut rng);
    assert_eq!(state(&agents), Some(AgentState::Idle));
    assert!(events.contains(&Event::AgentStateChanged {
        agent: id,
        from: AgentState::Chase,
        to: AgentState::Idle,
    }));

    let _ = tick(&mut agents, &cells, 11, 11, player_at(0.0, -4.4), &mut rng);
    assert_eq!(state(&agents), Some(AgentState::Chase));
}

#[test]
fn patrolling_agent_drops_its_leg_to_chase() {
    let (columns, rows) = (11, 11);
    let cells = vec![Cell::Path; 121];
    let space = TileSpace::new(columns, rows, TILE);
    let mut table = SpeciesTable::default();
    let crawler = table.get_mut(SpeciesKind::Crawler);
    crawler.detection_range_tiles = 3.0;
    crawler.wait_min = 0.0;
    crawler.wait_max = 0.0;
    let mut agents = Agents::new(table, 1, space);
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let mut events = Vec::new();
    let id = agents.spawn(SpeciesKind::Crawler, CellCoord::new(5, 5), &mut events);
    let far = player_at(40.0, 40.0);
    let state = |agents: &Agents| agents.get(id).map(|agent| agent.state());
    // Player on the same row, offset towards the middle of the room.
    let beside = |agents: &Agents, distance: f32| {
        let position = agents.get(id).expect("agent exists").position();
        let dx = if position.x >= 0.0 { -distance } else { distance };
        player_at(position.x + dx, position.z)
    };

    let mut patrolling = false;
    for _ in 0..20 {
        let _ = tick(&mut agents, &cells, columns, rows, far, &mut rng);
        if state(&agents) == Some(AgentState::Patrol) {
            patrolling = true;
            break;
        }
    }
    assert!(patrolling, "agent never started a patrol leg");

    let outside = beside(&agents, 4.6);
    let _ = tick(&mut agents, &cells, columns, rows, outside, &mut rng);
    assert_eq!(state(&agents), Some(AgentState::Patrol));

    let inside = beside(&agents, 4.4);
    let events = tick(&mut agents, &cells, columns, rows, inside, &mut rng);
    assert_eq!(state(&agents), Some(AgentState::Chase));
    assert!(events.contains(&Event::AgentStateChanged {
        agent: id,
        from: AgentState::Patrol,
        to: AgentState::Chase,
    }));
    let target = space
        .world_to_grid(inside.position)
        .expect("player inside the grid");
    let agent = agents.get(id).expect("agent exists");
    assert_eq!(agent.remaining_path().last(), Some(target));

    let events = tick(&mut agents, &cells, columns, rows, far, &mut rng);
    assert_eq!(state(&agents), Some(AgentState::Idle));
    assert!(events.contains(&Event::AgentStateChanged {
        agent: id,
        from: AgentState::Chase,
        to: AgentState::Idle,
    }));
    let agent = agents.get(id).expect("agent exists");
    assert_eq!(agent.remaining_path().count(), 0);
}

#[test]
fn stealthed_player_is_ignored() {
    let cells = pocket();
    let mut agents = Agents::new(SpeciesTable::default(), 1, TileSpace::new(11, 11, TILE));
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let mut events = Vec::new();
    let id = agents.spawn(SpeciesKind::Crawler, CellCoord::new(5, 5), &mut events);
    let hidden = PlayerSnapshot {
        position: WorldPoint::new(1.0, 0.0),
        stealthed: true,
    };

    for _ in 0..5 {
        let _ = tick(&mut agents, &cells, 11, 11, hidden, &mut rng);
        assert_ne!(agents.get(id).map(|agent| agent.state()), Some(AgentState::Chase));
    }
}

#[test]
fn contact_attacks_respect_the_cooldown() {
    let cells = pocket();
    let mut agents = Agents::new(SpeciesTable::default(), 1, TileSpace::new(11, 11, TILE));
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut events = Vec::new();
    let id = agents.spawn(SpeciesKind::Crawler, CellCoord::new(5, 5), &mut events);

    let first = tick(&mut agents, &cells, 11, 11, player_at(0.0, 0.0), &mut rng);
    assert!(first.contains(&Event::PlayerStruck {
        agent: id,
        damage: 10
    }));
    assert_eq!(agents.get(id).map(|agent| agent.state()), Some(AgentState::Attack));

    let second = tick(&mut agents, &cells, 11, 11, player_at(0.0, 0.0), &mut rng);
    assert_eq!(agents.get(id).map(|agent| agent.state()), Some(AgentState::Chase));
    assert!(!second
        .iter()
        .any(|event| matches!(event, Event::PlayerStruck { .. })));

    let mut strikes = 1;
    for _ in 0..23 {
        let events = tick(&mut agents, &cells, 11, 11, player_at(0.0, 0.0), &mut rng);
        strikes += events
            .iter()
            .filter(|event| matches!(event, Event::PlayerStruck { .. }))
            .count();
    }
    assert_eq!(strikes, 3);
}

/// Ring corridor around a solid block: rows 1 and 3 plus columns 1 and 7.
fn ring() -> Vec<Cell> {
    let (columns, rows) = (9_u32, 5_u32);
    let mut cells = vec![Cell::Wall; (columns * rows) as usize];
    for row in 1..4 {
        for column in 1..8 {
            let on_ring = row != 2 || column == 1 || column == 7;
            if on_ring {
                cells[(row * columns + column) as usize] = Cell::Path;
            }
        }
    }
    cells
}

#[test]
fn chasing_agent_routes_around_a_new_wall() {
    let mut cells = ring();
    let mut table = SpeciesTable::default();
    table.get_mut(SpeciesKind::Crawler).detection_range_tiles = 20.0;
    let space = TileSpace::new(9, 5, TILE);
    let mut agents = Agents::new(table, 1, space);
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut events = Vec::new();
    let id = agents.spawn(SpeciesKind::Crawler, CellCoord::new(1, 1), &mut events);
    let target = CellCoord::new(5, 1);
    let player = PlayerSnapshot {
        position: space.grid_to_world(target),
        stealthed: false,
    };

    let _ = tick(&mut agents, &cells, 9, 5, player, &mut rng);
    assert_eq!(agents.get(id).map(|agent| agent.cell()), Some(CellCoord::new(2, 1)));

    let blocked = CellCoord::new(3, 1);
    cells[(blocked.row() * 9 + blocked.column()) as usize] = Cell::Wall;

    let mut reached = false;
    for _ in 0..200 {
        let _ = tick(&mut agents, &cells, 9, 5, player, &mut rng);
        let agent = agents.get(id).expect("agent exists");
        assert_ne!(agent.cell(), blocked, "agent walked into a wall");
        if agent.cell() == target && !agent.is_moving() {
            reached = true;
            break;
        }
    }
    assert!(reached, "agent never reached the player around the ring");
}

fn assert_on_tile_segment(snapshot: &AgentSnapshot, space: &TileSpace, moving: bool) {
    let centre = space.grid_to_world(snapshot.cell);
    let offset = snapshot.position.distance(centre);
    if moving {
        assert!(offset <= TILE + 1e-4, "agent strayed {offset} from its target");
        let aligned = (snapshot.position.x - centre.x).abs() < 1e-4
            || (snapshot.position.z - centre.z).abs() < 1e-4;
        assert!(aligned, "agent left the grid axis at {:?}", snapshot.position);
    } else {
        assert!(offset < 1e-4, "resting agent is {offset} away from its tile centre");
    }
}

#[test]
fn patrolling_agents_move_between_tile_centres() {
    let maze = MazeGenerator::new(ChaCha8Rng::seed_from_u64(21))
        .generate(21, 21, ShapeTag::Rectangle)
        .expect("valid dimensions");
    let (columns, rows) = maze.dimensions();
    let space = TileSpace::new(columns, rows, TILE);
    let mut agents = Agents::new(SpeciesTable::default(), 4, space);
    let mut rng = ChaCha8Rng::seed_from_u64(22);
    let mut events = Vec::new();
    for (species, cell) in SpeciesKind::ALL.into_iter().zip([(1, 1), (19, 1), (1, 19), (19, 19)]) {
        let _ = agents.spawn(species, CellCoord::new(cell.0, cell.1), &mut events);
    }
    let far_away = player_at(1_000.0, 1_000.0);

    let mut completed = 0;
    let mut saw_patrol = false;
    for _ in 0..400 {
        let events = tick(&mut agents, maze.cells(), columns, rows, far_away, &mut rng);
        completed += events
            .iter()
            .filter(|event| matches!(event, Event::AgentTileCompleted { .. }))
            .count();

        for agent in agents.iter() {
            let snapshot = agent.snapshot();
            assert!(maze.is_open(snapshot.cell), "agent stands in a wall at {}", snapshot.cell);
            assert_on_tile_segment(&snapshot, &space, agent.is_moving());
            if snapshot.tile_completed {
                assert!(!agent.is_moving());
            }
            saw_patrol |= snapshot.state == AgentState::Patrol;
        }
    }

    assert!(saw_patrol);
    assert!(completed > 20, "agents barely moved: {completed} tiles");
}

#[test]
fn seeded_rosters_replay_identically() {
    let maze = MazeGenerator::new(ChaCha8Rng::seed_from_u64(31))
        .generate(25, 19, ShapeTag::Circle)
        .expect("valid dimensions");
    let (columns, rows) = maze.dimensions();
    let entrance = maze.entrance().expect("entrance placed");

    let run = || {
        let space = TileSpace::new(columns, rows, TILE);
        let mut agents = Agents::new(SpeciesTable::default(), 3, space);
        let mut rng = ChaCha8Rng::seed_from_u64(32);
        let mut log = Vec::new();
        for cell in maze.view().open_cells().step_by(17).take(5) {
            let _ = agents.spawn(SpeciesKind::Brute, cell, &mut log);
        }
        let player = PlayerSnapshot {
            position: space.grid_to_world(entrance),
            stealthed: false,
        };
        for _ in 0..300 {
            log.extend(tick(&mut agents, maze.cells(), columns, rows, player, &mut rng));
        }
        (log, agents.snapshots())
    };

    let (first_log, first_snapshots) = run();
    let (second_log, second_snapshots) = run();
    assert_eq!(first_log, second_log);
    assert_eq!(first_snapshots, second_snapshots);
    assert_eq!(first_snapshots.len(), 5);
}

#[test]
fn roster_controls_target_single_agents() {
    let mut agents = Agents::new(SpeciesTable::default(), 1, TileSpace::new(11, 11, TILE));
    let mut events = Vec::new();
    let first = agents.spawn(SpeciesKind::Crawler, CellCoord::new(5, 5), &mut events);
    let second = agents.spawn(SpeciesKind::Wraith, CellCoord::new(3, 3), &mut events);

    assert_eq!(first.get() + 1, second.get());
    assert!(agents.freeze(second, 2.0, &mut events));
    assert!(agents.strike(first, 1_000, &mut events));
    assert!(!agents.strike(first, 1, &mut events));

    let snapshots = agents.snapshots();
    assert_eq!(snapshots[0].state, AgentState::Die);
    assert!(snapshots[1].frozen);
    assert!(events.contains(&Event::AgentDied { agent: first }));
}
