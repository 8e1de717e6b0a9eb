#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative stage grid for Maze Survival.
//!
//! The [`World`] owns the [`Maze`] for the lifetime of a stage. External
//! collaborators never edit the grid in place: they [`World::queue`] commands,
//! and the stage drains the queue with [`World::flush`] at a fixed point of the
//! tick so that every reader sees either the whole mutation or none of it.

mod maze;

use std::collections::VecDeque;

use log::debug;
use maze_survival_core::{Command, Event};

pub use maze::{
    coerce_dimension, region_bounds, square_around, GridError, Maze, MAX_DIMENSION, MIN_DIMENSION,
};

/// Represents the authoritative grid state of the active stage.
#[derive(Debug)]
pub struct World {
    maze: Maze,
    pending: VecDeque<Command>,
    tick_index: u64,
}

impl World {
    /// Wraps a freshly generated maze.
    #[must_use]
    pub fn new(maze: Maze) -> Self {
        Self {
            maze,
            pending: VecDeque::new(),
            tick_index: 0,
        }
    }

    /// Defers a grid mutation until the next [`World::flush`].
    pub fn queue(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    /// Number of mutations waiting for the next flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Applies every queued mutation in submission order and advances the
    /// tick counter.
    pub fn flush(&mut self, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        while let Some(command) = self.pending.pop_front() {
            apply(self, command, out_events);
        }
    }
}

/// Applies the provided command to the world immediately.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::RemoveWall { cell } => {
            if world.maze.open_wall(cell) {
                debug!("tick {}: removed wall at {cell}", world.tick_index);
                out_events.push(Event::WallRemoved { cell });
            }
        }
        Command::Detonate { center, radius } => {
            let (columns, rows) = world.maze.dimensions();
            let Some(blast) = square_around(center, radius, columns, rows) else {
                return;
            };
            let mut removed = 0_u32;
            for cell in blast.cells() {
                if world.maze.open_wall(cell) {
                    removed += 1;
                    out_events.push(Event::WallRemoved { cell });
                }
            }
            debug!(
                "tick {}: detonation at {center} opened {removed} walls",
                world.tick_index
            );
        }
        Command::RevealRegion {
            index,
            region_rows,
            region_columns,
        } => {
            let count = world.maze.reveal_region(index, region_rows, region_columns);
            if count > 0 {
                out_events.push(Event::CellsRevealed { count });
            }
        }
        Command::RevealAround { center, radius } => {
            let count = world.maze.mark_explored_around(center, radius);
            if count > 0 {
                out_events.push(Event::CellsRevealed { count });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use maze_survival_core::{CellCoord, GridView};

    use super::{Maze, World};

    /// Provides read-only access to the stage maze.
    #[must_use]
    pub fn maze(world: &World) -> &Maze {
        &world.maze
    }

    /// Captures the grid view consumed by pathfinding, spawning and agents.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        world.maze.view()
    }

    /// Entrance of the stage maze.
    #[must_use]
    pub fn entrance(world: &World) -> Option<CellCoord> {
        world.maze.entrance()
    }

    /// Exit of the stage maze.
    #[must_use]
    pub fn exit(world: &World) -> Option<CellCoord> {
        world.maze.exit()
    }

    /// Row-major fog-of-war flags for minimap rendering.
    #[must_use]
    pub fn explored(world: &World) -> &[bool] {
        world.maze.explored()
    }

    /// Number of flushes performed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}
