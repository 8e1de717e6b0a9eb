#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural maze generation and puzzle-placement analysis.
//!
//! [`MazeGenerator`] masks the grid to a [`ShapeTag`], carves a perfect maze
//! with an iterative randomized depth-first search, and opens an entrance on
//! the left edge of the shape and an exit on the right edge. The random source
//! is injected so that a seeded generator always reproduces the same layout.
//!
//! [`valid_switch_positions`] inspects a finished maze for walls that a puzzle
//! switch may remove: one-wall-thick partitions next to dead ends that sit at
//! the end of a long unbranched corridor.

use std::collections::BTreeSet;

use log::{debug, warn};
use maze_survival_core::{Cell, CellCoord, Direction, GridView, ShapeTag, SwitchPlacement};
use maze_survival_world::{GridError, Maze};
use rand::{seq::SliceRandom, Rng};

const MASK_EPSILON: f32 = 1e-4;

/// Builds masked perfect mazes from an injected random source.
#[derive(Debug)]
pub struct MazeGenerator<R> {
    rng: R,
}

impl<R: Rng> MazeGenerator<R> {
    /// Creates a generator drawing from the provided random source.
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Consumes the generator, handing the random source back.
    #[must_use]
    pub fn into_rng(self) -> R {
        self.rng
    }

    /// Generates a complete maze: mask, carved corridors, entrance and exit.
    pub fn generate(&mut self, columns: u32, rows: u32, shape: ShapeTag) -> Result<Maze, GridError> {
        let mut maze = Maze::new(columns, rows)?;
        let (columns, rows) = maze.dimensions();
        maze.set_mask(shape_mask(columns, rows, shape))?;

        let seed = self.carve(&mut maze);
        let report = place_endpoints(&mut maze, seed);
        debug!(
            "generated {columns}x{rows} {shape} maze from seed {seed}: entrance {} (forced: {}), exit {} (forced: {})",
            report.entrance, report.entrance_fallback, report.exit, report.exit_fallback
        );
        Ok(maze)
    }

    /// Carves a perfect maze into the masked region and returns the seed cell.
    ///
    /// Every masked odd/odd cell reachable from the seed is opened exactly
    /// once, together with the wall cell that joins it to its parent. Both the
    /// wall and the node must belong to the mask.
    pub fn carve(&mut self, maze: &mut Maze) -> CellCoord {
        let (columns, rows) = maze.dimensions();
        let seed = match first_masked_node(maze) {
            Some(seed) => seed,
            None => {
                warn!("{columns}x{rows} mask excludes every maze node, forcing (1, 1) into the shape");
                let seed = CellCoord::new(1, 1);
                let _ = maze.include_in_mask(seed);
                seed
            }
        };

        let _ = maze.set_cell(seed, Cell::Path);
        let mut stack = vec![seed];
        let mut directions = Vec::with_capacity(Direction::ALL.len());

        while let Some(&current) = stack.last() {
            directions.clear();
            directions.extend(Direction::ALL.into_iter().filter(|direction| {
                current
                    .offset(*direction, 2, columns, rows)
                    .is_some_and(|target| maze.in_mask(target) && !maze.is_open(target))
                    && current
                        .offset(*direction, 1, columns, rows)
                        .is_some_and(|wall| maze.in_mask(wall))
            }));

            if directions.is_empty() {
                let _ = stack.pop();
                continue;
            }

            directions.shuffle(&mut self.rng);
            let direction = directions[0];
            let (Some(wall), Some(target)) = (
                current.offset(direction, 1, columns, rows),
                current.offset(direction, 2, columns, rows),
            ) else {
                let _ = stack.pop();
                continue;
            };

            let _ = maze.set_cell(wall, Cell::Path);
            let _ = maze.set_cell(target, Cell::Path);
            stack.push(target);
        }

        seed
    }
}

/// Outcome of [`place_endpoints`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndpointReport {
    /// Cell opened as the entrance.
    pub entrance: CellCoord,
    /// Cell opened as the exit.
    pub exit: CellCoord,
    /// Whether the entrance came from the forced fallback.
    pub entrance_fallback: bool,
    /// Whether the exit came from the forced fallback.
    pub exit_fallback: bool,
}

/// Opens the entrance on the left edge of the shape and the exit on the right.
///
/// Rows are scanned top-to-bottom for the entrance and bottom-to-top for the
/// exit. A boundary cell qualifies when its interior neighbour is open and
/// opening it would not join two separate corridors. When a scan finds
/// nothing, a cell next to a known-open node is forced open instead and added
/// to the mask if needed. Afterwards both endpoints are defined, distinct,
/// inside the mask and beside an open cell.
pub fn place_endpoints(maze: &mut Maze, seed: CellCoord) -> EndpointReport {
    let (entrance, entrance_fallback) = match scan_entrance(maze) {
        Some(cell) => (cell, false),
        None => {
            let cell = fallback_entrance(maze, seed);
            warn!("no entrance on the left edge of the shape, forcing an opening at {cell}");
            (cell, true)
        }
    };
    let _ = maze.set_cell(entrance, Cell::Path);
    maze.set_entrance(Some(entrance));

    let (exit, exit_fallback) = match scan_exit(maze, entrance) {
        Some(cell) => (cell, false),
        None => {
            let cell = fallback_exit(maze, entrance, seed);
            warn!("no exit on the right edge of the shape, forcing an opening at {cell}");
            (cell, true)
        }
    };
    let _ = maze.set_cell(exit, Cell::Path);
    maze.set_exit(Some(exit));

    EndpointReport {
        entrance,
        exit,
        entrance_fallback,
        exit_fallback,
    }
}

/// Builds the playable-shape mask for a grid.
///
/// Each cell is tested in normalised coordinates relative to the grid centre,
/// where the left and right edges sit at `x = ∓1` and the top and bottom rows
/// at `y = ∓1`.
#[must_use]
pub fn shape_mask(columns: u32, rows: u32, shape: ShapeTag) -> Vec<bool> {
    let mut mask = Vec::with_capacity(usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0));
    for row in 0..rows {
        for column in 0..columns {
            mask.push(in_shape(shape, CellCoord::new(column, row), columns, rows));
        }
    }
    mask
}

/// Closed-form inclusion test for a single cell.
#[must_use]
pub fn in_shape(shape: ShapeTag, cell: CellCoord, columns: u32, rows: u32) -> bool {
    let half_width = (columns.saturating_sub(1) as f32 / 2.0).max(1.0);
    let half_height = (rows.saturating_sub(1) as f32 / 2.0).max(1.0);
    let x = (cell.column() as f32 - half_width) / half_width;
    let y = (cell.row() as f32 - half_height) / half_height;

    match shape {
        ShapeTag::Rectangle => true,
        ShapeTag::Diamond => x.abs() + y.abs() <= 1.0 + MASK_EPSILON,
        ShapeTag::Circle => x * x + y * y <= 1.0 + MASK_EPSILON,
        ShapeTag::Triangle => {
            let depth = (y + 1.0) / 2.0;
            x.abs() <= depth + MASK_EPSILON
        }
        ShapeTag::Star => {
            let radius = (x * x + y * y).sqrt();
            let angle = y.atan2(x) + std::f32::consts::FRAC_PI_2;
            radius <= 0.55 + 0.45 * (5.0 * angle).cos() + MASK_EPSILON
        }
        ShapeTag::Hexagon => {
            let (ax, ay) = (x.abs(), y.abs());
            ay <= 1.0 + MASK_EPSILON && ax + ay * 0.5 <= 1.0 + MASK_EPSILON
        }
        ShapeTag::Heart => {
            let hx = x * 1.3;
            let hy = -y * 1.3 + 0.3;
            let lobe = hx * hx + hy * hy - 1.0;
            lobe * lobe * lobe - hx * hx * hy * hy * hy <= MASK_EPSILON
        }
    }
}

/// Open cells with exactly one open neighbour.
#[must_use]
pub fn dead_ends(view: GridView<'_>) -> Vec<CellCoord> {
    view.open_cells()
        .filter(|cell| view.open_neighbors(*cell).count() == 1)
        .collect()
}

/// Wall cells that a puzzle switch may remove.
///
/// A dead end qualifies when the corridor leading away from it stays
/// unbranched for at least `min_segment_length` cells (the dead end included).
/// Each wall beside a qualifying dead end whose far side is open is reported,
/// annotated with the axis it joins. The result is sorted and free of
/// duplicates. The maze is not modified.
#[must_use]
pub fn valid_switch_positions(maze: &Maze, min_segment_length: u32) -> Vec<SwitchPlacement> {
    let view = maze.view();
    let (columns, rows) = view.dimensions();
    let mut placements = BTreeSet::new();

    for dead_end in dead_ends(view) {
        if !corridor_reaches(view, dead_end, min_segment_length) {
            continue;
        }

        for direction in Direction::ALL {
            let (Some(wall), Some(beyond)) = (
                dead_end.offset(direction, 1, columns, rows),
                dead_end.offset(direction, 2, columns, rows),
            ) else {
                continue;
            };

            if view.is_open(wall) || !maze.in_mask(wall) || !view.is_open(beyond) {
                continue;
            }

            let _ = placements.insert(SwitchPlacement {
                cell: wall,
                orientation: direction.into(),
            });
        }
    }

    placements.into_iter().collect()
}

/// Walks the corridor leading away from `start` and reports whether it stays
/// unbranched for `min_length` cells.
#[must_use]
pub fn corridor_reaches(view: GridView<'_>, start: CellCoord, min_length: u32) -> bool {
    let mut previous: Option<CellCoord> = None;
    let mut current = start;
    let mut length = 1;

    while length < min_length {
        let mut next = None;
        let mut unvisited = 0;
        for neighbor in view.open_neighbors(current) {
            if Some(neighbor) == previous {
                continue;
            }
            unvisited += 1;
            next = Some(neighbor);
        }

        match (unvisited, next) {
            (1, Some(cell)) => {
                previous = Some(current);
                current = cell;
                length += 1;
            }
            _ => return false,
        }
    }

    true
}

fn first_masked_node(maze: &Maze) -> Option<CellCoord> {
    let (columns, rows) = maze.dimensions();
    (1..rows)
        .step_by(2)
        .flat_map(|row| (1..columns).step_by(2).map(move |column| CellCoord::new(column, row)))
        .find(|cell| maze.in_mask(*cell))
}

fn opens_cleanly(maze: &Maze, cell: CellCoord) -> bool {
    maze.is_open(cell) || maze.view().open_neighbors(cell).count() == 1
}

fn scan_entrance(maze: &Maze) -> Option<CellCoord> {
    let (columns, rows) = maze.dimensions();
    (0..rows).find_map(|row| {
        let column = (0..columns).find(|column| maze.in_mask(CellCoord::new(*column, row)))?;
        let cell = CellCoord::new(column, row);
        let interior = cell.offset(Direction::East, 1, columns, rows)?;
        (maze.is_open(interior) && opens_cleanly(maze, cell)).then_some(cell)
    })
}

fn scan_exit(maze: &Maze, entrance: CellCoord) -> Option<CellCoord> {
    let (columns, rows) = maze.dimensions();
    (0..rows).rev().find_map(|row| {
        let column = (0..columns)
            .rev()
            .find(|column| maze.in_mask(CellCoord::new(*column, row)))?;
        let cell = CellCoord::new(column, row);
        if cell == entrance {
            return None;
        }
        let interior = cell.offset(Direction::West, 1, columns, rows)?;
        (maze.is_open(interior) && opens_cleanly(maze, cell)).then_some(cell)
    })
}

fn fallback_entrance(maze: &mut Maze, seed: CellCoord) -> CellCoord {
    let cell = forced_opening(maze, seed).unwrap_or(seed);
    let _ = maze.include_in_mask(cell);
    cell
}

fn fallback_exit(maze: &Maze, entrance: CellCoord, seed: CellCoord) -> CellCoord {
    let (columns, rows) = maze.dimensions();
    let node = (0..rows)
        .rev()
        .flat_map(|row| (0..columns).rev().map(move |column| CellCoord::new(column, row)))
        .find(|cell| *cell != entrance && maze.is_open(*cell))
        .unwrap_or(seed);

    EXIT_FALLBACK_ORDER
        .into_iter()
        .filter_map(|direction| node.offset(direction, 1, columns, rows))
        .find(|cell| *cell != entrance && maze.in_mask(*cell) && opens_cleanly(maze, *cell))
        .unwrap_or(node)
}

const ENTRANCE_FALLBACK_ORDER: [Direction; 4] = [
    Direction::West,
    Direction::North,
    Direction::South,
    Direction::East,
];

const EXIT_FALLBACK_ORDER: [Direction; 4] = [
    Direction::East,
    Direction::South,
    Direction::North,
    Direction::West,
];

/// Picks a neighbour of the seed to force open as the entrance, preferring
/// cells that already belong to the mask, then any cell that keeps the maze
/// acyclic, then the first neighbour in order.
fn forced_opening(maze: &Maze, seed: CellCoord) -> Option<CellCoord> {
    let (columns, rows) = maze.dimensions();
    let neighbors: Vec<CellCoord> = ENTRANCE_FALLBACK_ORDER
        .into_iter()
        .filter_map(|direction| seed.offset(direction, 1, columns, rows))
        .collect();

    neighbors
        .iter()
        .copied()
        .find(|cell| maze.in_mask(*cell) && opens_cleanly(maze, *cell))
        .or_else(|| neighbors.iter().copied().find(|cell| opens_cleanly(maze, *cell)))
        .or_else(|| neighbors.first().copied())
}
