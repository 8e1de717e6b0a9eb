//! Behaviour state machine shared by every species.

use std::collections::VecDeque;

use glam::Vec2;
use log::debug;
use maze_survival_core::{
    AgentId, AgentState, CellCoord, Direction, Event, GridView, SpeciesKind, TileSpace,
    WorldPoint,
};
use maze_survival_system_pathfinding::find_path;
use rand::Rng;

use crate::species::{ModelState, SpeciesConfig, SpeciesHooks};

/// Random cells sampled before a patrol leg is abandoned for a wait.
pub const PATROL_ATTEMPTS: u32 = 8;

/// Seconds an agent spends recovering after a non-lethal hit.
pub const HURT_DURATION: f32 = 0.4;

/// Player state read by every agent during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// World-space position of the player.
    pub position: WorldPoint,
    /// Whether the player is currently hidden from detection.
    pub stealthed: bool,
}

/// Everything an agent may read during one tick.
#[derive(Clone, Copy, Debug)]
pub struct TickContext<'a> {
    /// Grid snapshot shared by the whole agent pass.
    pub grid: GridView<'a>,
    /// Transform between cells and world space.
    pub space: TileSpace,
    /// Player as seen at the start of the tick.
    pub player: PlayerSnapshot,
}

/// Read-only agent state handed to presentation collaborators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Identifier of the agent.
    pub id: AgentId,
    /// Species of the agent.
    pub species: SpeciesKind,
    /// Interpolated world position.
    pub position: WorldPoint,
    /// Facing angle in radians, measured from `+z` toward `+x`.
    pub yaw: f32,
    /// Behaviour state.
    pub state: AgentState,
    /// Logical cell of the agent.
    pub cell: CellCoord,
    /// Whether a tile step finished during the last update.
    pub tile_completed: bool,
    /// Whether a trap currently holds the agent.
    pub frozen: bool,
    /// Remaining hit points.
    pub health: u32,
    /// Normalised playback position of the current animation clip.
    pub animation_phase: f32,
}

#[derive(Clone, Copy, Debug)]
struct Step {
    from: Vec2,
    to: Vec2,
    progress: f32,
}

/// Autonomous creature driven by the shared behaviour state machine.
#[derive(Clone, Debug)]
pub struct Agent {
    id: AgentId,
    species: SpeciesKind,
    config: SpeciesConfig,
    hooks: SpeciesHooks,
    model: ModelState,
    position: Vec2,
    yaw: f32,
    cell: CellCoord,
    state: AgentState,
    path: VecDeque<CellCoord>,
    step: Option<Step>,
    patrol_goal: Option<CellCoord>,
    wait_timer: f32,
    repath_timer: f32,
    attack_timer: f32,
    freeze_timer: f32,
    hurt_timer: f32,
    health: u32,
    tile_completed: bool,
}

impl Agent {
    /// Creates an idle agent resting on the centre of `cell`.
    #[must_use]
    pub fn new(
        id: AgentId,
        species: SpeciesKind,
        config: SpeciesConfig,
        cell: CellCoord,
        space: &TileSpace,
    ) -> Self {
        let hooks = SpeciesHooks::for_species(species);
        let model = (hooks.init_model)(&config);
        let health = config.health;
        Self {
            id,
            species,
            config,
            hooks,
            model,
            position: to_vec(space.grid_to_world(cell)),
            yaw: 0.0,
            cell,
            state: AgentState::Idle,
            path: VecDeque::new(),
            step: None,
            patrol_goal: None,
            wait_timer: 0.0,
            repath_timer: 0.0,
            attack_timer: 0.0,
            freeze_timer: 0.0,
            hurt_timer: 0.0,
            health,
            tile_completed: false,
        }
    }

    /// Identifier of the agent.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Species of the agent.
    #[must_use]
    pub const fn species(&self) -> SpeciesKind {
        self.species
    }

    /// Behaviour state.
    #[must_use]
    pub const fn state(&self) -> AgentState {
        self.state
    }

    /// Resting cell, or the destination of the step in progress.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Interpolated world position.
    #[must_use]
    pub fn position(&self) -> WorldPoint {
        WorldPoint::new(self.position.x, self.position.y)
    }

    /// Facing angle in radians.
    #[must_use]
    pub const fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Whether a trap currently holds the agent.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.freeze_timer > 0.0
    }

    /// Whether the agent is between two tiles.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.step.is_some()
    }

    /// Waypoints still to walk, excluding the step in progress.
    pub fn remaining_path(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.path.iter().copied()
    }

    /// Captures the agent for presentation.
    #[must_use]
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            species: self.species,
            position: self.position(),
            yaw: self.yaw,
            state: self.state,
            cell: self.cell,
            tile_completed: self.tile_completed,
            frozen: self.is_frozen(),
            health: self.health,
            animation_phase: self.model.phase,
        }
    }

    /// Suspends every update for `duration` seconds.
    ///
    /// Returns `false` for dead agents. A longer freeze replaces a shorter one.
    pub fn freeze(&mut self, duration: f32, out_events: &mut Vec<Event>) -> bool {
        if self.state == AgentState::Die || !(duration > 0.0) {
            return false;
        }
        let was_frozen = self.is_frozen();
        self.freeze_timer = self.freeze_timer.max(duration);
        if !was_frozen {
            out_events.push(Event::AgentFrozen { agent: self.id });
        }
        true
    }

    /// Deals damage. Non-lethal hits stun the agent for [`HURT_DURATION`].
    ///
    /// Returns `false` when the agent was already dead.
    pub fn strike(&mut self, amount: u32, out_events: &mut Vec<Event>) -> bool {
        if self.state == AgentState::Die {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.path.clear();
            self.patrol_goal = None;
            self.transition(AgentState::Die, out_events);
            out_events.push(Event::AgentDied { agent: self.id });
        } else {
            self.hurt_timer = HURT_DURATION;
            self.transition(AgentState::Hurt, out_events);
        }
        true
    }

    /// Advances the agent by `dt` seconds.
    pub fn update<R>(
        &mut self,
        dt: f32,
        ctx: &TickContext<'_>,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) where
        R: Rng + ?Sized,
    {
        self.tile_completed = false;
        if self.state == AgentState::Die {
            return;
        }

        if self.freeze_timer > 0.0 {
            self.freeze_timer -= dt;
            if self.freeze_timer <= 0.0 {
                self.freeze_timer = 0.0;
                out_events.push(Event::AgentThawed { agent: self.id });
            }
            return;
        }

        if self.state == AgentState::Hurt {
            self.hurt_timer -= dt;
            if self.hurt_timer > 0.0 {
                self.animate(dt);
                return;
            }
            self.hurt_timer = 0.0;
        }

        self.attack_timer = (self.attack_timer - dt).max(0.0);

        let tile_size = ctx.space.tile_size();
        let player = to_vec(ctx.player.position);
        let distance = self.position.distance(player);
        let detection_range = self.config.detection_range_tiles * tile_size;

        if distance < detection_range && !ctx.player.stealthed {
            self.chase(dt, ctx, distance, out_events);
        } else {
            self.patrol(dt, ctx, rng, out_events);
        }

        self.advance(dt, ctx, out_events);
        self.animate(dt);
    }

    fn chase(
        &mut self,
        dt: f32,
        ctx: &TickContext<'_>,
        distance: f32,
        out_events: &mut Vec<Event>,
    ) {
        match self.state {
            AgentState::Chase => {}
            AgentState::Attack => self.transition(AgentState::Chase, out_events),
            _ => {
                self.path.clear();
                self.patrol_goal = None;
                self.wait_timer = 0.0;
                self.repath_timer = 0.0;
                self.transition(AgentState::Chase, out_events);
            }
        }

        self.repath_timer -= dt;
        if self.repath_timer <= 0.0 {
            self.repath_timer = self.config.path_recalc_interval;
            self.path.clear();
            if let Some(goal) = ctx.space.world_to_grid(ctx.player.position) {
                if let Some(path) = find_path(ctx.grid, self.cell, goal) {
                    self.path.extend(path.into_steps());
                }
            }
        }

        let attack_range = self.config.attack_range_tiles * ctx.space.tile_size();
        if distance <= attack_range && self.attack_timer <= 0.0 {
            self.attack_timer = self.config.attack_cooldown;
            out_events.push(Event::PlayerStruck {
                agent: self.id,
                damage: self.config.damage,
            });
            self.transition(AgentState::Attack, out_events);
        }
    }

    fn patrol<R>(
        &mut self,
        dt: f32,
        ctx: &TickContext<'_>,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) where
        R: Rng + ?Sized,
    {
        if matches!(
            self.state,
            AgentState::Chase | AgentState::Attack | AgentState::Hurt
        ) {
            self.path.clear();
            self.patrol_goal = None;
            self.begin_wait(rng, out_events);
            return;
        }

        if self.wait_timer > 0.0 {
            self.wait_timer -= dt;
            if self.wait_timer > 0.0 {
                return;
            }
            self.wait_timer = 0.0;
        }

        if !self.path.is_empty() || self.step.is_some() {
            return;
        }

        if let Some(goal) = self.patrol_goal.take() {
            if goal == self.cell {
                self.begin_wait(rng, out_events);
                return;
            }
            match find_path(ctx.grid, self.cell, goal) {
                Some(path) => {
                    self.path.extend(path.into_steps());
                    self.patrol_goal = Some(goal);
                    self.transition(AgentState::Patrol, out_events);
                }
                None => self.begin_wait(rng, out_events),
            }
            return;
        }

        match self.sample_patrol_target(ctx.grid, rng) {
            Some((goal, steps)) => {
                self.path.extend(steps);
                self.patrol_goal = Some(goal);
                self.transition(AgentState::Patrol, out_events);
            }
            None => self.begin_wait(rng, out_events),
        }
    }

    fn sample_patrol_target<R>(
        &self,
        grid: GridView<'_>,
        rng: &mut R,
    ) -> Option<(CellCoord, Vec<CellCoord>)>
    where
        R: Rng + ?Sized,
    {
        let radius = i64::from(self.config.patrol_radius_tiles);
        let (columns, rows) = grid.dimensions();

        for _ in 0..PATROL_ATTEMPTS {
            let column = i64::from(self.cell.column()) + rng.gen_range(-radius..=radius);
            let row = i64::from(self.cell.row()) + rng.gen_range(-radius..=radius);
            let (Ok(column), Ok(row)) = (u32::try_from(column), u32::try_from(row)) else {
                continue;
            };
            if column >= columns || row >= rows {
                continue;
            }
            let candidate = CellCoord::new(column, row);
            if candidate == self.cell || !grid.is_open(candidate) {
                continue;
            }
            let Some(path) = find_path(grid, self.cell, candidate) else {
                continue;
            };
            return Some((candidate, path.into_steps()));
        }

        None
    }

    fn begin_wait<R>(&mut self, rng: &mut R, out_events: &mut Vec<Event>)
    where
        R: Rng + ?Sized,
    {
        self.wait_timer = if self.config.wait_max > self.config.wait_min {
            rng.gen_range(self.config.wait_min..=self.config.wait_max)
        } else {
            self.config.wait_min
        };
        self.transition(AgentState::Idle, out_events);
    }

    fn advance(&mut self, dt: f32, ctx: &TickContext<'_>, out_events: &mut Vec<Event>) {
        if self.step.is_none() {
            let Some(&next) = self.path.front() else {
                return;
            };
            if !ctx.grid.is_open(next) || Direction::between(self.cell, next).is_none() {
                debug!(
                    "agent {} dropped its path at {next}, requesting a new route",
                    self.id.get()
                );
                self.path.clear();
                self.repath_timer = 0.0;
                return;
            }
            let _ = self.path.pop_front();

            let to = to_vec(ctx.space.grid_to_world(next));
            let delta = to - self.position;
            self.yaw = delta.x.atan2(delta.y);
            self.step = Some(Step {
                from: self.position,
                to,
                progress: 0.0,
            });
            self.cell = next;
        }

        let Some(step) = self.step.as_mut() else {
            return;
        };
        step.progress += dt / self.config.move_duration();
        if step.progress >= 1.0 {
            self.position = step.to;
            self.step = None;
            self.tile_completed = true;
            out_events.push(Event::AgentTileCompleted {
                agent: self.id,
                cell: self.cell,
            });
        } else {
            self.position = step.from.lerp(step.to, step.progress);
        }
    }

    fn animate(&mut self, dt: f32) {
        (self.hooks.update_animation)(&mut self.model, self.state, dt);
    }

    fn transition(&mut self, to: AgentState, out_events: &mut Vec<Event>) {
        if self.state == to {
            return;
        }
        debug!("agent {} {} -> {}", self.id.get(), self.state.tag(), to.tag());
        out_events.push(Event::AgentStateChanged {
            agent: self.id,
            from: self.state,
            to,
        });
        self.state = to;
    }
}

fn to_vec(point: WorldPoint) -> Vec2 {
    Vec2::new(point.x, point.z)
}
