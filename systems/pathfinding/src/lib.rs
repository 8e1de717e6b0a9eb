#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stateless A* search over the maze grid.
//!
//! Every call works on the [`GridView`] captured for the current tick and
//! allocates its own scratch buffers, so results always reflect the grid as it
//! is now, including walls opened by switches or bombs since the last call.

use std::{cmp::Reverse, collections::BinaryHeap};

use maze_survival_core::{CellCoord, GridView};

/// Route between two cells, start and goal included.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Path {
    cells: Vec<CellCoord>,
}

impl Path {
    /// Wraps an ordered cell sequence.
    #[must_use]
    pub fn from_cells(cells: Vec<CellCoord>) -> Self {
        Self { cells }
    }

    /// Every cell of the route in walking order.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Number of single-tile moves along the route.
    #[must_use]
    pub fn hops(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    /// First cell of the route.
    #[must_use]
    pub fn start(&self) -> Option<CellCoord> {
        self.cells.first().copied()
    }

    /// Last cell of the route.
    #[must_use]
    pub fn goal(&self) -> Option<CellCoord> {
        self.cells.last().copied()
    }

    /// Waypoints still to walk once standing on the start cell.
    #[must_use]
    pub fn into_steps(self) -> Vec<CellCoord> {
        self.cells.into_iter().skip(1).collect()
    }
}

/// Finds a shortest 4-connected route from `start` to `goal`.
///
/// Uses A* with unit step costs and the Manhattan heuristic. Among nodes with
/// equal `f`, the one discovered first is expanded first. Returns `None` when
/// either endpoint lies outside the grid, the goal is a wall, or no route
/// exists.
#[must_use]
pub fn find_path(grid: GridView<'_>, start: CellCoord, goal: CellCoord) -> Option<Path> {
    let start_index = grid.index(start)?;
    let goal_index = grid.index(goal)?;
    if !grid.is_open(goal) {
        return None;
    }
    if start_index == goal_index {
        return Some(Path::from_cells(vec![start]));
    }

    let (columns, rows) = grid.dimensions();
    let node_count = usize::try_from(u64::from(columns) * u64::from(rows)).ok()?;
    let mut g_score = vec![u32::MAX; node_count];
    let mut parent: Vec<Option<CellCoord>> = vec![None; node_count];
    let mut closed = vec![false; node_count];
    let mut open = BinaryHeap::new();
    let mut discovered: u64 = 0;

    g_score[start_index] = 0;
    open.push(Reverse(OpenNode {
        f: start.manhattan_distance(goal),
        order: discovered,
        cell: start,
    }));

    while let Some(Reverse(node)) = open.pop() {
        let Some(current_index) = grid.index(node.cell) else {
            continue;
        };
        if closed[current_index] {
            continue;
        }
        if current_index == goal_index {
            return Some(reconstruct(&parent, grid, start, goal));
        }
        closed[current_index] = true;

        let tentative = g_score[current_index].saturating_add(1);
        for neighbor in grid.open_neighbors(node.cell) {
            let Some(neighbor_index) = grid.index(neighbor) else {
                continue;
            };
            if closed[neighbor_index] || tentative >= g_score[neighbor_index] {
                continue;
            }

            g_score[neighbor_index] = tentative;
            parent[neighbor_index] = Some(node.cell);
            discovered += 1;
            open.push(Reverse(OpenNode {
                f: tentative + neighbor.manhattan_distance(goal),
                order: discovered,
                cell: neighbor,
            }));
        }
    }

    None
}

/// Entry of the open set. Orders by `f`, then by discovery order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    order: u64,
    cell: CellCoord,
}

fn reconstruct(
    parent: &[Option<CellCoord>],
    grid: GridView<'_>,
    start: CellCoord,
    goal: CellCoord,
) -> Path {
    let mut cells = vec![goal];
    let mut current = goal;
    while current != start {
        let Some(previous) = grid.index(current).and_then(|index| parent[index]) else {
            break;
        };
        cells.push(previous);
        current = previous;
    }
    cells.reverse();
    Path::from_cells(cells)
}
