#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stage context tying the maze, its creatures and the tick loop together.
//!
//! A [`Stage`] owns the [`World`] and the [`Agents`] roster for one level and
//! is discarded wholesale when the player moves on. Each [`Stage::tick`]
//! applies queued grid mutations first, then updates every agent against one
//! grid snapshot.

use log::{debug, info};
use maze_survival_core::{
    AgentId, CellCoord, Command, Event, ShapeTag, SwitchPlacement, TileSpace, WorldPoint,
};
use maze_survival_system_agents::{Agents, PlayerSnapshot, SpeciesTable, TickContext};
use maze_survival_system_maze_generation::{valid_switch_positions, MazeGenerator};
use maze_survival_system_spawning::{place_spawns, plan_spawns};
use maze_survival_world::{self as world, coerce_dimension, query, GridError, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Longest simulated step accepted by [`Stage::tick`], in seconds.
pub const MAX_TICK: f32 = 0.1;

/// Reasons a stage could not be built.
#[derive(Debug, Error)]
pub enum StageError {
    /// Levels are numbered from 1.
    #[error("levels start at 1")]
    LevelZero,
    /// Tiles must have a positive world-space size.
    #[error("tile size {0} is not positive")]
    InvalidTileSize(f32),
    /// The maze grid rejected the requested dimensions.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Tuning for stage construction.
#[derive(Clone, Debug)]
pub struct StageConfig {
    /// Edge length of the first level's maze.
    pub base_size: u32,
    /// Edge length no level grows beyond.
    pub max_size: u32,
    /// World-space side length of one tile.
    pub tile_size: f32,
    /// Fixed maze outline, or `None` to rotate through every shape by level.
    pub shape: Option<ShapeTag>,
    /// Chebyshev radius of the minimap reveal around the player, in cells.
    pub reveal_radius: u32,
    /// Spawn planning and placement tuning.
    pub spawning: maze_survival_system_spawning::Config,
    /// Species tuning.
    pub species: SpeciesTable,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            base_size: 15,
            max_size: 51,
            tile_size: 1.5,
            shape: None,
            reveal_radius: 2,
            spawning: maze_survival_system_spawning::Config::default(),
            species: SpeciesTable::default(),
        }
    }
}

/// Maze edge lengths for a level: the base size plus two cells per level,
/// capped at the maximum and kept odd.
#[must_use]
pub fn stage_dimensions(config: &StageConfig, level: u32) -> (u32, u32) {
    let growth = level.saturating_sub(1).saturating_mul(2);
    let cap = coerce_dimension(config.max_size);
    let size = coerce_dimension(config.base_size.saturating_add(growth)).min(cap);
    (size, size)
}

/// Maze outline used on a level.
#[must_use]
pub fn stage_shape(config: &StageConfig, level: u32) -> ShapeTag {
    config.shape.unwrap_or_else(|| {
        let index = level.saturating_sub(1) as usize % ShapeTag::ALL.len();
        ShapeTag::ALL[index]
    })
}

/// One level of play: the maze, its creatures and the random stream.
#[derive(Debug)]
pub struct Stage {
    config: StageConfig,
    level: u32,
    space: TileSpace,
    world: World,
    agents: Agents,
    rng: ChaCha8Rng,
    events: Vec<Event>,
}

impl Stage {
    /// Generates the maze for `level` and spawns its creatures.
    ///
    /// Generation and spawn events are reported by the first [`Stage::tick`].
    pub fn new(config: StageConfig, level: u32, seed: u64) -> Result<Self, StageError> {
        if level == 0 {
            return Err(StageError::LevelZero);
        }
        if !(config.tile_size > 0.0) {
            return Err(StageError::InvalidTileSize(config.tile_size));
        }

        let (columns, rows) = stage_dimensions(&config, level);
        let shape = stage_shape(&config, level);
        let mut generator = MazeGenerator::new(ChaCha8Rng::seed_from_u64(seed));
        let maze = generator.generate(columns, rows, shape)?;
        let mut rng = generator.into_rng();

        let (columns, rows) = maze.dimensions();
        let space = TileSpace::new(columns, rows, config.tile_size);
        let world = World::new(maze);
        let mut events = vec![Event::StageGenerated { columns, rows }];

        let requests = plan_spawns(level, &config.species, &config.spawning);
        let placements = place_spawns(
            query::grid_view(&world),
            &requests,
            config.spawning.safe_distance,
            &mut rng,
        );
        let mut agents = Agents::new(config.species.clone(), level, space);
        for placement in placements {
            let _ = agents.spawn(placement.species, placement.cell, &mut events);
        }

        info!(
            "level {level}: {columns}x{rows} {shape} maze with {} agents",
            agents.len()
        );

        Ok(Self {
            config,
            level,
            space,
            world,
            agents,
            rng,
            events,
        })
    }

    /// Builds the stage that follows this one.
    pub fn next_level(mut self) -> Result<Self, StageError> {
        let seed = self.rng.gen();
        Self::new(self.config, self.level.saturating_add(1), seed)
    }

    /// Level of the stage.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Transform between cells and world space.
    #[must_use]
    pub const fn space(&self) -> TileSpace {
        self.space
    }

    /// Grid state of the stage.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Creatures of the stage.
    #[must_use]
    pub fn agents(&self) -> &Agents {
        &self.agents
    }

    /// World-space centre of the entrance, where the player starts.
    #[must_use]
    pub fn player_start(&self) -> Option<WorldPoint> {
        query::entrance(&self.world).map(|cell| self.space.grid_to_world(cell))
    }

    /// Reports whether the position lies on the exit tile.
    #[must_use]
    pub fn reached_exit(&self, position: WorldPoint) -> bool {
        let exit = query::exit(&self.world);
        exit.is_some() && self.space.world_to_grid(position) == exit
    }

    /// Walls that a puzzle switch may remove on this stage.
    #[must_use]
    pub fn switch_positions(&self, min_segment_length: u32) -> Vec<SwitchPlacement> {
        valid_switch_positions(query::maze(&self.world), min_segment_length)
    }

    /// Defers a grid mutation to the start of the next tick.
    pub fn queue(&mut self, command: Command) {
        self.world.queue(command);
    }

    /// Freezes an agent. The resulting event is reported by the next tick.
    pub fn freeze(&mut self, agent: AgentId, duration: f32) -> bool {
        self.agents.freeze(agent, duration, &mut self.events)
    }

    /// Damages an agent. The resulting events are reported by the next tick.
    pub fn strike(&mut self, agent: AgentId, amount: u32) -> bool {
        self.agents.strike(agent, amount, &mut self.events)
    }

    /// Advances the stage by `dt` seconds, clamped to [`MAX_TICK`].
    pub fn tick(&mut self, dt: f32, player: PlayerSnapshot) -> Vec<Event> {
        let dt = if dt > 0.0 { dt.min(MAX_TICK) } else { 0.0 };
        let mut events = std::mem::take(&mut self.events);

        self.world.flush(&mut events);

        if let Some(center) = self.space.world_to_grid(player.position) {
            world::apply(
                &mut self.world,
                Command::RevealAround {
                    center,
                    radius: self.config.reveal_radius,
                },
                &mut events,
            );
        }

        let ctx = TickContext {
            grid: query::grid_view(&self.world),
            space: self.space,
            player,
        };
        self.agents
            .update_all(dt, &ctx, &mut self.rng, &mut events);

        debug!(
            "tick {} produced {} events",
            query::tick_index(&self.world),
            events.len()
        );
        events
    }

    /// Cell the player occupies, when inside the grid.
    #[must_use]
    pub fn player_cell(&self, position: WorldPoint) -> Option<CellCoord> {
        self.space.world_to_grid(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_grow_by_two_and_cap() {
        let config = StageConfig::default();
        assert_eq!(stage_dimensions(&config, 1), (15, 15));
        assert_eq!(stage_dimensions(&config, 2), (17, 17));
        assert_eq!(stage_dimensions(&config, 19), (51, 51));
        assert_eq!(stage_dimensions(&config, 400), (51, 51));
    }

    #[test]
    fn dimensions_stay_odd_for_even_tuning() {
        let config = StageConfig {
            base_size: 10,
            max_size: 20,
            ..StageConfig::default()
        };
        assert_eq!(stage_dimensions(&config, 1), (11, 11));
        assert_eq!(stage_dimensions(&config, 30), (21, 21));
    }

    #[test]
    fn shapes_rotate_unless_fixed() {
        let mut config = StageConfig::default();
        assert_eq!(stage_shape(&config, 1), ShapeTag::Rectangle);
        assert_eq!(stage_shape(&config, 2), ShapeTag::Diamond);
        assert_eq!(stage_shape(&config, 8), ShapeTag::Rectangle);

        config.shape = Some(ShapeTag::Heart);
        assert_eq!(stage_shape(&config, 3), ShapeTag::Heart);
    }

    #[test]
    fn rejects_level_zero_and_bad_tiles() {
        assert!(matches!(
            Stage::new(StageConfig::default(), 0, 1),
            Err(StageError::LevelZero)
        ));
        let config = StageConfig {
            tile_size: 0.0,
            ..StageConfig::default()
        };
        assert!(matches!(
            Stage::new(config, 1, 1),
            Err(StageError::InvalidTileSize(_))
        ));
    }
}
