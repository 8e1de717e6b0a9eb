#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn placement for maze creatures.
//!
//! Candidate cells are every open cell except the entrance and exit. Cells
//! close to the entrance are filtered out so the player does not start next to
//! a creature, unless the filter would leave nothing to spawn on.

use log::warn;
use maze_survival_core::{CellCoord, GridView, SpeciesKind};
use maze_survival_system_agents::SpeciesTable;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

/// Tuning for spawn planning and placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Manhattan distance from the entrance that spawns must exceed.
    pub safe_distance: u32,
    /// Agents of a species on the level it unlocks.
    pub base_count: u32,
    /// Extra agents of a species per level after it unlocks.
    pub per_level: u32,
    /// Upper bound on agents of one species per stage.
    pub max_per_species: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            safe_distance: 6,
            base_count: 2,
            per_level: 1,
            max_per_species: 6,
        }
    }
}

/// Number of agents of one species to place on a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpawnRequest {
    /// Species to place.
    pub species: SpeciesKind,
    /// Number of agents of that species.
    pub count: u32,
}

/// Cell chosen for a single agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    /// Species to place.
    pub species: SpeciesKind,
    /// Cell the agent starts on.
    pub cell: CellCoord,
}

/// Every open cell except the entrance and the exit.
#[must_use]
pub fn spawn_candidates(grid: GridView<'_>) -> Vec<CellCoord> {
    let entrance = grid.entrance();
    let exit = grid.exit();
    grid.open_cells()
        .filter(|cell| Some(*cell) != entrance && Some(*cell) != exit)
        .collect()
}

/// Candidates farther than the safe distance from the entrance.
///
/// The distance is clamped to half the shorter grid edge. When the filter
/// rejects every candidate the unfiltered set is returned instead.
#[must_use]
pub fn safe_candidates(grid: GridView<'_>, safe_distance: u32) -> Vec<CellCoord> {
    let candidates = spawn_candidates(grid);
    let Some(entrance) = grid.entrance() else {
        return candidates;
    };

    let (columns, rows) = grid.dimensions();
    let threshold = safe_distance.min(columns.min(rows) / 2);
    let safe: Vec<CellCoord> = candidates
        .iter()
        .copied()
        .filter(|cell| cell.manhattan_distance(entrance) > threshold)
        .collect();

    if safe.is_empty() && !candidates.is_empty() {
        warn!(
            "no spawn cell lies more than {threshold} cells from the entrance, using all {} candidates",
            candidates.len()
        );
        return candidates;
    }
    safe
}

/// Picks up to `count` distinct cells uniformly at random.
#[must_use]
pub fn select_cells<R>(candidates: &[CellCoord], count: usize, rng: &mut R) -> Vec<CellCoord>
where
    R: Rng + ?Sized,
{
    candidates.choose_multiple(rng, count).copied().collect()
}

/// Species and counts to spawn on a level.
///
/// Every species whose unlock level has been reached spawns
/// [`Config::base_count`] agents, plus [`Config::per_level`] for each level
/// since it unlocked, up to [`Config::max_per_species`].
#[must_use]
pub fn plan_spawns(level: u32, table: &SpeciesTable, config: &Config) -> Vec<SpawnRequest> {
    let plan: Vec<SpawnRequest> = table
        .unlocked(level)
        .map(|species| {
            let seniority = level.saturating_sub(table.get(species).unlock_level);
            let count = config
                .base_count
                .saturating_add(config.per_level.saturating_mul(seniority))
                .min(config.max_per_species);
            SpawnRequest { species, count }
        })
        .filter(|request| request.count > 0)
        .collect();

    if plan.is_empty() {
        warn!("no species unlocked for level {level}, stage spawns no agents");
    }
    plan
}

/// Chooses a distinct cell for every requested agent.
///
/// Species are placed in request order and never share a cell. A species
/// that finds no free candidate is skipped; a species that finds fewer cells
/// than requested spawns as many as fit.
#[must_use]
pub fn place_spawns<R>(
    grid: GridView<'_>,
    requests: &[SpawnRequest],
    safe_distance: u32,
    rng: &mut R,
) -> Vec<Placement>
where
    R: Rng + ?Sized,
{
    let mut free = safe_candidates(grid, safe_distance);
    let mut placements = Vec::new();

    for request in requests {
        if free.is_empty() {
            warn!(
                "no free spawn cell for {:?}, skipping {} agents",
                request.species, request.count
            );
            continue;
        }

        let count = usize::try_from(request.count).unwrap_or(usize::MAX);
        let chosen = select_cells(&free, count, rng);
        if chosen.len() < count {
            warn!(
                "only {} of {} {:?} agents fit on the stage",
                chosen.len(),
                request.count,
                request.species
            );
        }
        free.retain(|cell| !chosen.contains(cell));
        placements.extend(chosen.into_iter().map(|cell| Placement {
            species: request.species,
            cell,
        }));
    }

    placements
}
