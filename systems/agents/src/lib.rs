#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Autonomous maze creatures.
//!
//! Every species runs the same [`Agent`] state machine: idle and patrol
//! between self-chosen waypoints, chase the player once detected, and walk
//! tile to tile along paths recomputed against the live grid. Species differ
//! only in their [`SpeciesConfig`] and [`SpeciesHooks`].

mod agent;
mod species;

use log::debug;
use maze_survival_core::{AgentId, CellCoord, Event, SpeciesKind, TileSpace};
use rand::Rng;

pub use agent::{Agent, AgentSnapshot, PlayerSnapshot, TickContext, HURT_DURATION, PATROL_ATTEMPTS};
pub use species::{
    ConfigError, ModelState, SpeciesConfig, SpeciesHooks, SpeciesOverride, SpeciesTable,
    MAX_SPEED_MULTIPLIER, SPEED_GROWTH_PER_LEVEL,
};

/// Every agent of the active stage, in spawn order.
#[derive(Debug)]
pub struct Agents {
    table: SpeciesTable,
    level: u32,
    space: TileSpace,
    agents: Vec<Agent>,
    next_id: u32,
}

impl Agents {
    /// Creates an empty roster for a stage of the given level.
    #[must_use]
    pub fn new(table: SpeciesTable, level: u32, space: TileSpace) -> Self {
        Self {
            table,
            level,
            space,
            agents: Vec::new(),
            next_id: 0,
        }
    }

    /// Level the roster scales species tuning for.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Number of agents, dead ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Reports whether the roster holds no agent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Places a new agent of `species` on `cell`.
    pub fn spawn(
        &mut self,
        species: SpeciesKind,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> AgentId {
        let id = AgentId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let config = self.table.get(species).scaled_for_level(self.level);
        self.agents
            .push(Agent::new(id, species, config, cell, &self.space));
        debug!("spawned {species:?} agent {} at {cell}", id.get());
        out_events.push(Event::AgentSpawned {
            agent: id,
            species,
            cell,
        });
        id
    }

    /// Updates every agent in id order against one grid snapshot.
    pub fn update_all<R>(
        &mut self,
        dt: f32,
        ctx: &TickContext<'_>,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) where
        R: Rng + ?Sized,
    {
        for agent in &mut self.agents {
            agent.update(dt, ctx, rng, out_events);
        }
    }

    /// Freezes an agent for `duration` seconds. Returns `false` for unknown or
    /// dead agents.
    pub fn freeze(&mut self, id: AgentId, duration: f32, out_events: &mut Vec<Event>) -> bool {
        self.get_mut(id)
            .is_some_and(|agent| agent.freeze(duration, out_events))
    }

    /// Deals damage to an agent. Returns `false` for unknown or dead agents.
    pub fn strike(&mut self, id: AgentId, amount: u32, out_events: &mut Vec<Event>) -> bool {
        self.get_mut(id)
            .is_some_and(|agent| agent.strike(amount, out_events))
    }

    /// Looks up an agent by id.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id() == id)
    }

    fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|agent| agent.id() == id)
    }

    /// Iterates agents in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Captures every agent for presentation.
    #[must_use]
    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents.iter().map(Agent::snapshot).collect()
    }
}
