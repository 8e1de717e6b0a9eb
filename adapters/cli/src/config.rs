use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use maze_survival_core::{ShapeTag, SpeciesKind};
use maze_survival_system_agents::SpeciesOverride;
use maze_survival_system_stage::StageConfig;
use serde::Deserialize;

/// Simulation tuning read from a TOML file. Every section is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimulationFile {
    /// Stage construction overrides.
    pub(crate) stage: StageSection,
    /// Spawn planning tuning.
    pub(crate) spawning: maze_survival_system_spawning::Config,
    /// Per-species tuning overrides keyed by species name.
    pub(crate) species: BTreeMap<SpeciesKind, SpeciesOverride>,
}

/// `[stage]` section of the simulation file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct StageSection {
    pub(crate) base_size: Option<u32>,
    pub(crate) max_size: Option<u32>,
    pub(crate) tile_size: Option<f32>,
    pub(crate) shape: Option<ShapeTag>,
    pub(crate) reveal_radius: Option<u32>,
}

impl SimulationFile {
    /// Reads and parses the file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read simulation config at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid simulation config at {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse simulation config toml contents")
    }

    /// Layers the file on top of the default stage tuning.
    pub(crate) fn into_stage_config(self) -> Result<StageConfig> {
        let mut config = StageConfig::default();
        let StageSection {
            base_size,
            max_size,
            tile_size,
            shape,
            reveal_radius,
        } = self.stage;

        if let Some(value) = base_size {
            config.base_size = value;
        }
        if let Some(value) = max_size {
            config.max_size = value;
        }
        if let Some(value) = tile_size {
            config.tile_size = value;
        }
        if shape.is_some() {
            config.shape = shape;
        }
        if let Some(value) = reveal_radius {
            config.reveal_radius = value;
        }

        config.spawning = self.spawning;
        config
            .species
            .apply_overrides(&self.species)
            .context("species overrides rejected")?;
        Ok(config)
    }
}
