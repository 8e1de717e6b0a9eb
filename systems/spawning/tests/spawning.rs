use std::collections::HashSet;

use maze_survival_core::{Cell, CellCoord, GridView, ShapeTag, SpeciesKind};
use maze_survival_system_agents::SpeciesTable;
use maze_survival_system_maze_generation::MazeGenerator;
use maze_survival_system_spawning::{
    place_spawns, plan_spawns, safe_candidates, spawn_candidates, Config, SpawnRequest,
};
use maze_survival_world::Maze;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn generate(columns: u32, rows: u32, shape: ShapeTag, seed: u64) -> Maze {
    MazeGenerator::new(ChaCha8Rng::seed_from_u64(seed))
        .generate(columns, rows, shape)
        .expect("valid dimensions")
}

#[test]
fn placements_respect_the_safe_distance() {
    let config = Config::default();
    let table = SpeciesTable::default();

    for shape in [ShapeTag::Rectangle, ShapeTag::Diamond, ShapeTag::Heart] {
        let maze = generate(31, 31, shape, 40);
        let view = maze.view();
        let entrance = maze.entrance().expect("entrance placed");
        let exit = maze.exit().expect("exit placed");
        let requests = plan_spawns(5, &table, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(41);

        let placements = place_spawns(view, &requests, config.safe_distance, &mut rng);

        let wanted: u32 = requests.iter().map(|request| request.count).sum();
        assert_eq!(placements.len(), wanted as usize, "{shape}: missing spawns");
        let mut seen = HashSet::new();
        for placement in &placements {
            assert!(view.is_open(placement.cell));
            assert_ne!(placement.cell, entrance);
            assert_ne!(placement.cell, exit);
            assert!(placement.cell.manhattan_distance(entrance) > config.safe_distance);
            assert!(seen.insert(placement.cell), "{shape}: cell {} reused", placement.cell);
        }
    }
}

#[test]
fn placements_follow_request_order() {
    let maze = generate(25, 25, ShapeTag::Rectangle, 50);
    let requests = [
        SpawnRequest {
            species: SpeciesKind::Brute,
            count: 2,
        },
        SpawnRequest {
            species: SpeciesKind::Crawler,
            count: 3,
        },
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(51);

    let placements = place_spawns(maze.view(), &requests, 4, &mut rng);

    let species: Vec<SpeciesKind> = placements.iter().map(|placement| placement.species).collect();
    assert_eq!(
        species,
        vec![
            SpeciesKind::Brute,
            SpeciesKind::Brute,
            SpeciesKind::Crawler,
            SpeciesKind::Crawler,
            SpeciesKind::Crawler,
        ]
    );
}

#[test]
fn tiny_maze_falls_back_to_unfiltered_candidates() {
    let maze = generate(3, 3, ShapeTag::Rectangle, 60);
    let view = maze.view();

    assert_eq!(spawn_candidates(view), vec![CellCoord::new(1, 1)]);
    assert_eq!(safe_candidates(view, 6), vec![CellCoord::new(1, 1)]);

    let requests = [SpawnRequest {
        species: SpeciesKind::Crawler,
        count: 3,
    }];
    let mut rng = ChaCha8Rng::seed_from_u64(61);
    let placements = place_spawns(view, &requests, 6, &mut rng);
    assert_eq!(placements.len(), 1);
    assert_eq!(placements[0].cell, CellCoord::new(1, 1));
}

#[test]
fn species_without_cells_are_skipped() {
    let mut cells = vec![Cell::Wall; 9];
    cells[3] = Cell::Path;
    cells[5] = Cell::Path;
    let view = GridView::new(&cells, 3, 3)
        .with_endpoints(Some(CellCoord::new(0, 1)), Some(CellCoord::new(2, 1)));
    let requests = [
        SpawnRequest {
            species: SpeciesKind::Crawler,
            count: 1,
        },
        SpawnRequest {
            species: SpeciesKind::Wraith,
            count: 2,
        },
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(70);

    assert!(place_spawns(view, &requests, 2, &mut rng).is_empty());
}

#[test]
fn seeded_placement_replays_identically() {
    let maze = generate(41, 35, ShapeTag::Hexagon, 80);
    let requests = plan_spawns(4, &SpeciesTable::default(), &Config::default());

    let run = |seed: u64| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        place_spawns(maze.view(), &requests, 6, &mut rng)
    };

    assert_eq!(run(81), run(81));
    assert_ne!(run(81), run(82));
}
