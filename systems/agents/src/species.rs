//! Per-species tuning and presentation hooks.

use std::collections::BTreeMap;

use maze_survival_core::{AgentState, SpeciesKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Speed bonus gained per level beyond the first, as a fraction of base speed.
pub const SPEED_GROWTH_PER_LEVEL: f32 = 0.05;

/// Upper bound on the level speed multiplier.
pub const MAX_SPEED_MULTIPLIER: f32 = 1.5;

/// Rejected species tuning.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// Movement speed must be strictly positive.
    #[error("{species:?} moves at {value} tiles per second, expected a positive speed")]
    NonPositiveSpeed {
        /// Species carrying the invalid value.
        species: SpeciesKind,
        /// Offending speed.
        value: f32,
    },
    /// Wait bounds must be non-negative and ordered.
    #[error("{species:?} wait bounds {min}..{max} are not an ordered non-negative range")]
    InvalidWaitRange {
        /// Species carrying the invalid range.
        species: SpeciesKind,
        /// Lower bound in seconds.
        min: f32,
        /// Upper bound in seconds.
        max: f32,
    },
    /// Re-path interval must be strictly positive.
    #[error("{species:?} re-paths every {value} seconds, expected a positive interval")]
    NonPositiveRepath {
        /// Species carrying the invalid value.
        species: SpeciesKind,
        /// Offending interval.
        value: f32,
    },
}

/// Tunable parameters shared by every agent of a species.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    /// Movement speed; one tile step lasts `1 / tiles_per_second` seconds.
    pub tiles_per_second: f32,
    /// Radius, in tiles, inside which the player is noticed.
    pub detection_range_tiles: f32,
    /// Largest offset, in tiles along each axis, of a sampled patrol target.
    pub patrol_radius_tiles: u32,
    /// Shortest randomized wait between patrol legs, in seconds.
    pub wait_min: f32,
    /// Longest randomized wait between patrol legs, in seconds.
    pub wait_max: f32,
    /// Seconds between path refreshes while chasing.
    pub path_recalc_interval: f32,
    /// Damage dealt by one contact attack.
    pub damage: u32,
    /// Radius, in tiles, inside which a contact attack lands.
    pub attack_range_tiles: f32,
    /// Seconds between two contact attacks.
    pub attack_cooldown: f32,
    /// Hit points at spawn.
    pub health: u32,
    /// First level on which the species may spawn.
    pub unlock_level: u32,
    /// Asset key handed to the presentation layer.
    pub model_key: String,
}

impl SpeciesConfig {
    /// Seconds needed to cross one tile.
    #[must_use]
    pub fn move_duration(&self) -> f32 {
        1.0 / self.tiles_per_second
    }

    /// Copy of the config with speed scaled for the given level.
    ///
    /// Levels start at 1. Each later level adds [`SPEED_GROWTH_PER_LEVEL`] of
    /// the base speed until [`MAX_SPEED_MULTIPLIER`] is reached.
    #[must_use]
    pub fn scaled_for_level(&self, level: u32) -> Self {
        let multiplier = (1.0 + SPEED_GROWTH_PER_LEVEL * level.saturating_sub(1) as f32)
            .min(MAX_SPEED_MULTIPLIER);
        Self {
            tiles_per_second: self.tiles_per_second * multiplier,
            ..self.clone()
        }
    }

    /// Checks the invariants the state machine relies on.
    pub fn validate(&self, species: SpeciesKind) -> Result<(), ConfigError> {
        if !(self.tiles_per_second > 0.0) {
            return Err(ConfigError::NonPositiveSpeed {
                species,
                value: self.tiles_per_second,
            });
        }
        if !(self.wait_min >= 0.0 && self.wait_min <= self.wait_max) {
            return Err(ConfigError::InvalidWaitRange {
                species,
                min: self.wait_min,
                max: self.wait_max,
            });
        }
        if !(self.path_recalc_interval > 0.0) {
            return Err(ConfigError::NonPositiveRepath {
                species,
                value: self.path_recalc_interval,
            });
        }
        Ok(())
    }

    fn apply(&mut self, overrides: &SpeciesOverride) {
        let SpeciesOverride {
            tiles_per_second,
            detection_range_tiles,
            patrol_radius_tiles,
            wait_min,
            wait_max,
            path_recalc_interval,
            damage,
            attack_range_tiles,
            attack_cooldown,
            health,
            unlock_level,
            model_key,
        } = overrides;

        if let Some(value) = tiles_per_second {
            self.tiles_per_second = *value;
        }
        if let Some(value) = detection_range_tiles {
            self.detection_range_tiles = *value;
        }
        if let Some(value) = patrol_radius_tiles {
            self.patrol_radius_tiles = *value;
        }
        if let Some(value) = wait_min {
            self.wait_min = *value;
        }
        if let Some(value) = wait_max {
            self.wait_max = *value;
        }
        if let Some(value) = path_recalc_interval {
            self.path_recalc_interval = *value;
        }
        if let Some(value) = damage {
            self.damage = *value;
        }
        if let Some(value) = attack_range_tiles {
            self.attack_range_tiles = *value;
        }
        if let Some(value) = attack_cooldown {
            self.attack_cooldown = *value;
        }
        if let Some(value) = health {
            self.health = *value;
        }
        if let Some(value) = unlock_level {
            self.unlock_level = *value;
        }
        if let Some(value) = model_key {
            self.model_key.clone_from(value);
        }
    }
}

/// Partial species tuning read from a configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpeciesOverride {
    /// Replacement for [`SpeciesConfig::tiles_per_second`].
    pub tiles_per_second: Option<f32>,
    /// Replacement for [`SpeciesConfig::detection_range_tiles`].
    pub detection_range_tiles: Option<f32>,
    /// Replacement for [`SpeciesConfig::patrol_radius_tiles`].
    pub patrol_radius_tiles: Option<u32>,
    /// Replacement for [`SpeciesConfig::wait_min`].
    pub wait_min: Option<f32>,
    /// Replacement for [`SpeciesConfig::wait_max`].
    pub wait_max: Option<f32>,
    /// Replacement for [`SpeciesConfig::path_recalc_interval`].
    pub path_recalc_interval: Option<f32>,
    /// Replacement for [`SpeciesConfig::damage`].
    pub damage: Option<u32>,
    /// Replacement for [`SpeciesConfig::attack_range_tiles`].
    pub attack_range_tiles: Option<f32>,
    /// Replacement for [`SpeciesConfig::attack_cooldown`].
    pub attack_cooldown: Option<f32>,
    /// Replacement for [`SpeciesConfig::health`].
    pub health: Option<u32>,
    /// Replacement for [`SpeciesConfig::unlock_level`].
    pub unlock_level: Option<u32>,
    /// Replacement for [`SpeciesConfig::model_key`].
    pub model_key: Option<String>,
}

/// Tuning for every species.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeciesTable {
    crawler: SpeciesConfig,
    stalker: SpeciesConfig,
    brute: SpeciesConfig,
    wraith: SpeciesConfig,
}

impl SpeciesTable {
    /// Tuning of a single species.
    #[must_use]
    pub fn get(&self, species: SpeciesKind) -> &SpeciesConfig {
        match species {
            SpeciesKind::Crawler => &self.crawler,
            SpeciesKind::Stalker => &self.stalker,
            SpeciesKind::Brute => &self.brute,
            SpeciesKind::Wraith => &self.wraith,
        }
    }

    /// Mutable tuning of a single species.
    pub fn get_mut(&mut self, species: SpeciesKind) -> &mut SpeciesConfig {
        match species {
            SpeciesKind::Crawler => &mut self.crawler,
            SpeciesKind::Stalker => &mut self.stalker,
            SpeciesKind::Brute => &mut self.brute,
            SpeciesKind::Wraith => &mut self.wraith,
        }
    }

    /// Species available on the given level, in unlock order.
    pub fn unlocked(&self, level: u32) -> impl Iterator<Item = SpeciesKind> + '_ {
        SpeciesKind::ALL
            .into_iter()
            .filter(move |species| self.get(*species).unlock_level <= level)
    }

    /// Applies file overrides on top of the current tuning.
    ///
    /// The table is left untouched when any resulting species fails
    /// validation.
    pub fn apply_overrides(
        &mut self,
        overrides: &BTreeMap<SpeciesKind, SpeciesOverride>,
    ) -> Result<(), ConfigError> {
        let mut updated = self.clone();
        for (species, fields) in overrides {
            updated.get_mut(*species).apply(fields);
        }
        for species in SpeciesKind::ALL {
            updated.get(species).validate(species)?;
        }
        *self = updated;
        Ok(())
    }
}

impl Default for SpeciesTable {
    fn default() -> Self {
        Self {
            crawler: SpeciesConfig {
                tiles_per_second: 1.5,
                detection_range_tiles: 3.0,
                patrol_radius_tiles: 4,
                wait_min: 0.5,
                wait_max: 2.0,
                path_recalc_interval: 0.5,
                damage: 10,
                attack_range_tiles: 0.6,
                attack_cooldown: 1.0,
                health: 30,
                unlock_level: 1,
                model_key: "crawler".to_owned(),
            },
            stalker: SpeciesConfig {
                tiles_per_second: 2.5,
                detection_range_tiles: 6.0,
                patrol_radius_tiles: 6,
                wait_min: 0.0,
                wait_max: 1.5,
                path_recalc_interval: 0.4,
                damage: 8,
                attack_range_tiles: 0.6,
                attack_cooldown: 0.8,
                health: 20,
                unlock_level: 2,
                model_key: "stalker".to_owned(),
            },
            brute: SpeciesConfig {
                tiles_per_second: 1.2,
                detection_range_tiles: 4.0,
                patrol_radius_tiles: 8,
                wait_min: 1.0,
                wait_max: 3.0,
                path_recalc_interval: 0.8,
                damage: 25,
                attack_range_tiles: 0.8,
                attack_cooldown: 1.5,
                health: 80,
                unlock_level: 3,
                model_key: "brute".to_owned(),
            },
            wraith: SpeciesConfig {
                tiles_per_second: 3.0,
                detection_range_tiles: 5.0,
                patrol_radius_tiles: 10,
                wait_min: 0.0,
                wait_max: 2.0,
                path_recalc_interval: 0.6,
                damage: 5,
                attack_range_tiles: 0.6,
                attack_cooldown: 0.6,
                health: 15,
                unlock_level: 4,
                model_key: "wraith".to_owned(),
            },
        }
    }
}

/// Presentation state owned by an agent and driven by its species hooks.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelState {
    /// Asset key the presentation layer loads.
    pub model_key: String,
    /// Clip currently playing, named after the behaviour state.
    pub clip: AgentState,
    /// Normalised playback position in `[0, 1)`.
    pub phase: f32,
    /// Vertical offset of the model above the floor.
    pub lift: f32,
}

/// Capability table selected by species tag.
#[derive(Clone, Copy, Debug)]
pub struct SpeciesHooks {
    /// Builds the initial presentation state of a freshly spawned agent.
    pub init_model: fn(&SpeciesConfig) -> ModelState,
    /// Advances the presentation state by `dt` seconds in the given state.
    pub update_animation: fn(&mut ModelState, AgentState, f32),
}

impl SpeciesHooks {
    /// Hooks used by the given species.
    #[must_use]
    pub fn for_species(species: SpeciesKind) -> Self {
        match species {
            SpeciesKind::Crawler => Self {
                init_model: grounded_model,
                update_animation: scuttle,
            },
            SpeciesKind::Stalker => Self {
                init_model: grounded_model,
                update_animation: prowl,
            },
            SpeciesKind::Brute => Self {
                init_model: grounded_model,
                update_animation: lumber,
            },
            SpeciesKind::Wraith => Self {
                init_model: hovering_model,
                update_animation: drift,
            },
        }
    }
}

fn grounded_model(config: &SpeciesConfig) -> ModelState {
    ModelState {
        model_key: config.model_key.clone(),
        clip: AgentState::Idle,
        phase: 0.0,
        lift: 0.0,
    }
}

fn hovering_model(config: &SpeciesConfig) -> ModelState {
    ModelState {
        lift: 0.4,
        ..grounded_model(config)
    }
}

fn play(model: &mut ModelState, state: AgentState, dt: f32, rate: f32) {
    if model.clip != state {
        model.clip = state;
        model.phase = 0.0;
    }
    model.phase = (model.phase + dt * rate).fract();
}

fn scuttle(model: &mut ModelState, state: AgentState, dt: f32) {
    let rate = match state {
        AgentState::Chase | AgentState::Attack => 3.0,
        AgentState::Patrol => 2.0,
        AgentState::Idle | AgentState::Hurt => 0.5,
        AgentState::Die => 0.0,
    };
    play(model, state, dt, rate);
}

fn prowl(model: &mut ModelState, state: AgentState, dt: f32) {
    let rate = match state {
        AgentState::Chase => 2.5,
        AgentState::Attack => 4.0,
        AgentState::Patrol => 1.2,
        AgentState::Idle | AgentState::Hurt => 0.4,
        AgentState::Die => 0.0,
    };
    play(model, state, dt, rate);
}

fn lumber(model: &mut ModelState, state: AgentState, dt: f32) {
    let rate = match state {
        AgentState::Chase | AgentState::Patrol => 0.8,
        AgentState::Attack => 1.5,
        AgentState::Idle | AgentState::Hurt => 0.3,
        AgentState::Die => 0.0,
    };
    play(model, state, dt, rate);
}

fn drift(model: &mut ModelState, state: AgentState, dt: f32) {
    play(model, state, dt, 0.5);
    let bob = (model.phase * std::f32::consts::TAU).sin() * 0.1;
    model.lift = if state == AgentState::Die { 0.0 } else { 0.4 + bob };
}
