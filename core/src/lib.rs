#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Survival simulation.
//!
//! This crate defines the vocabulary that connects the stage context, the
//! authoritative world, and the pure systems. Collaborators queue [`Command`]
//! values describing grid mutations, the world applies them at a fixed point
//! of the tick, and every system reports what happened through [`Event`]
//! values. Systems read the maze exclusively through a borrowed [`GridView`],
//! which cannot outlive the tick it was captured for.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Maze Survival.";

/// Contents of a single maze tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Traversable floor.
    Path,
    /// Blocking wall.
    Wall,
}

impl Cell {
    /// Reports whether the tile can be walked on.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Path)
    }
}

/// Cardinal directions on the maze grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All four directions in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Column and row delta of a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Returns the direction of a single cardinal step between two cells.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Self> {
        let column_diff = from.column().abs_diff(to.column());
        let row_diff = from.row().abs_diff(to.row());

        if column_diff + row_diff != 1 {
            return None;
        }

        if column_diff == 1 {
            if to.column() > from.column() {
                Some(Self::East)
            } else {
                Some(Self::West)
            }
        } else if to.row() > from.row() {
            Some(Self::South)
        } else {
            Some(Self::North)
        }
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Cell reached by moving `distance` cells in `direction`, if it stays
    /// inside a grid of the provided dimensions.
    #[must_use]
    pub fn offset(self, direction: Direction, distance: u32, columns: u32, rows: u32) -> Option<Self> {
        let (dx, dy) = direction.delta();
        let column = i64::from(self.column) + dx * i64::from(distance);
        let row = i64::from(self.row) + dy * i64::from(distance);
        if column < 0 || row < 0 || column >= i64::from(columns) || row >= i64::from(rows) {
            return None;
        }
        Some(Self::new(
            u32::try_from(column).ok()?,
            u32::try_from(row).ok()?,
        ))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Iterates every cell of the rectangle in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let origin = self.origin;
        let size = self.size;
        (0..size.height()).flat_map(move |dy| {
            (0..size.width())
                .map(move |dx| CellCoord::new(origin.column() + dx, origin.row() + dy))
        })
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Outline restricting which cells of the grid take part in the maze.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeTag {
    /// Every cell belongs to the maze.
    #[default]
    Rectangle,
    /// Cells within a Manhattan radius of the centre.
    Diamond,
    /// Cells within a Euclidean radius of the centre.
    Circle,
    /// Upward-pointing triangle with its apex on the top row.
    Triangle,
    /// Five-pointed star traced by a polar cosine curve.
    Star,
    /// Flat-sided hexagon bounded by two pairs of linear inequalities.
    Hexagon,
    /// Heart traced by the classic sextic curve.
    Heart,
}

impl ShapeTag {
    /// Every supported shape in declaration order.
    pub const ALL: [ShapeTag; 7] = [
        ShapeTag::Rectangle,
        ShapeTag::Diamond,
        ShapeTag::Circle,
        ShapeTag::Triangle,
        ShapeTag::Star,
        ShapeTag::Hexagon,
        ShapeTag::Heart,
    ];

    /// Lower-case name used by configuration files and the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Diamond => "diamond",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Star => "star",
            Self::Hexagon => "hexagon",
            Self::Heart => "heart",
        }
    }
}

impl fmt::Display for ShapeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a shape name does not match any [`ShapeTag`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown maze shape `{0}`")]
pub struct ParseShapeError(String);

impl FromStr for ShapeTag {
    type Err = ParseShapeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|shape| shape.name() == normalized)
            .ok_or(ParseShapeError(value.to_owned()))
    }
}

/// Axis along which a puzzle switch wall connects its two open neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orientation {
    /// The wall separates an east and a west neighbour.
    Horizontal,
    /// The wall separates a north and a south neighbour.
    Vertical,
}

impl From<Direction> for Orientation {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::East | Direction::West => Self::Horizontal,
            Direction::North | Direction::South => Self::Vertical,
        }
    }
}

/// Wall cell that may host a puzzle switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SwitchPlacement {
    /// Wall cell that the switch removes when triggered.
    pub cell: CellCoord,
    /// Axis joined by removing the wall.
    pub orientation: Orientation,
}

/// Point on the horizontal world plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// World-space coordinate along the column axis.
    pub x: f32,
    /// World-space coordinate along the row axis.
    pub z: f32,
}

impl WorldPoint {
    /// Creates a new world point.
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }
}

/// Pure transform between grid cells and world-space tile centres.
///
/// The grid is centred on the world origin: along each axis the offset is
/// `-(dimension * tile_size) / 2` and a cell maps to the centre of its tile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileSpace {
    columns: u32,
    rows: u32,
    tile_size: f32,
}

impl TileSpace {
    /// Creates a transform for a grid of the given dimensions.
    #[must_use]
    pub const fn new(columns: u32, rows: u32, tile_size: f32) -> Self {
        Self {
            columns,
            rows,
            tile_size,
        }
    }

    /// Side length of one tile in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Grid dimensions as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn offset_x(&self) -> f32 {
        -(self.columns as f32 * self.tile_size) / 2.0
    }

    fn offset_z(&self) -> f32 {
        -(self.rows as f32 * self.tile_size) / 2.0
    }

    /// Converts a cell into the world-space centre of its tile.
    #[must_use]
    pub fn grid_to_world(&self, cell: CellCoord) -> WorldPoint {
        let half = self.tile_size / 2.0;
        WorldPoint::new(
            self.offset_x() + cell.column() as f32 * self.tile_size + half,
            self.offset_z() + cell.row() as f32 * self.tile_size + half,
        )
    }

    /// Converts a world-space point into the cell whose tile contains it.
    ///
    /// Returns `None` for points outside the grid or when the tile size is not
    /// positive.
    #[must_use]
    pub fn world_to_grid(&self, point: WorldPoint) -> Option<CellCoord> {
        if self.tile_size <= 0.0 {
            return None;
        }

        let column = ((point.x - self.offset_x()) / self.tile_size).floor();
        let row = ((point.z - self.offset_z()) / self.tile_size).floor();
        if column < 0.0 || row < 0.0 {
            return None;
        }
        if column >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }

        Some(CellCoord::new(column as u32, row as u32))
    }
}

/// Read-only view of the maze grid captured for a single tick.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    cells: &'a [Cell],
    columns: u32,
    rows: u32,
    entrance: Option<CellCoord>,
    exit: Option<CellCoord>,
}

impl<'a> GridView<'a> {
    /// Captures a view over row-major cells.
    ///
    /// Cells beyond `columns * rows` are ignored; missing cells read as walls.
    #[must_use]
    pub fn new(cells: &'a [Cell], columns: u32, rows: u32) -> Self {
        Self {
            cells,
            columns,
            rows,
            entrance: None,
            exit: None,
        }
    }

    /// Attaches the maze entrance and exit to the view.
    #[must_use]
    pub fn with_endpoints(mut self, entrance: Option<CellCoord>, exit: Option<CellCoord>) -> Self {
        self.entrance = entrance;
        self.exit = exit;
        self
    }

    /// Grid dimensions as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Entrance cell, once generation has placed it.
    #[must_use]
    pub const fn entrance(&self) -> Option<CellCoord> {
        self.entrance
    }

    /// Exit cell, once generation has placed it.
    #[must_use]
    pub const fn exit(&self) -> Option<CellCoord> {
        self.exit
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Contents of the cell, or `None` when it lies outside the grid.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<Cell> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Reports whether the cell is inside the grid and walkable.
    #[must_use]
    pub fn is_open(&self, cell: CellCoord) -> bool {
        self.cell(cell).is_some_and(Cell::is_open)
    }

    /// Row-major index of the cell, when it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Cardinal neighbours of the cell that are walkable.
    pub fn open_neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + 'a {
        let view = *self;
        Direction::ALL.into_iter().filter_map(move |direction| {
            cell.offset(direction, 1, view.columns, view.rows)
                .filter(|neighbor| view.is_open(*neighbor))
        })
    }

    /// Iterates every walkable cell in row-major order.
    pub fn open_cells(&self) -> impl Iterator<Item = CellCoord> + 'a {
        let view = *self;
        (0..view.rows).flat_map(move |row| {
            (0..view.columns)
                .map(move |column| CellCoord::new(column, row))
                .filter(move |cell| view.is_open(*cell))
        })
    }
}

/// Unique identifier assigned to an autonomous agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Behaviour state of an autonomous agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// Standing still, usually waiting before the next patrol leg.
    Idle,
    /// Walking toward a self-chosen waypoint.
    Patrol,
    /// Walking toward the player.
    Chase,
    /// Landed a contact hit on the player this tick.
    Attack,
    /// Recovering from damage.
    Hurt,
    /// Dead; no longer updated.
    Die,
}

impl AgentState {
    /// Short lower-case tag consumed by presentation layers.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Patrol => "patrol",
            Self::Chase => "chase",
            Self::Attack => "attack",
            Self::Hurt => "hurt",
            Self::Die => "die",
        }
    }
}

/// Creature species roaming the maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeciesKind {
    /// Slow, short-sighted ground dweller available from the first stage.
    Crawler,
    /// Quick hunter with a long detection range.
    Stalker,
    /// Heavy hitter that moves slowly and patrols widely.
    Brute,
    /// Fast phantom that wanders far but hits lightly.
    Wraith,
}

impl SpeciesKind {
    /// Every species in unlock order.
    pub const ALL: [SpeciesKind; 4] = [
        SpeciesKind::Crawler,
        SpeciesKind::Stalker,
        SpeciesKind::Brute,
        SpeciesKind::Wraith,
    ];
}

/// Grid mutations queued by external collaborators.
///
/// Commands are applied at the start of a tick, before any agent reads the
/// grid, so a mutation is never visible to only part of the agent pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Opens a single wall, typically after a puzzle switch is triggered.
    RemoveWall {
        /// Wall cell to open.
        cell: CellCoord,
    },
    /// Opens every interior wall within a square blast radius.
    Detonate {
        /// Cell at the centre of the blast.
        center: CellCoord,
        /// Chebyshev radius of the blast in cells.
        radius: u32,
    },
    /// Marks one piece of a partitioned grid as explored.
    RevealRegion {
        /// Row-major index of the piece to reveal.
        index: u32,
        /// Number of piece rows the grid is split into.
        region_rows: u32,
        /// Number of piece columns the grid is split into.
        region_columns: u32,
    },
    /// Marks the square of cells around a point as explored.
    RevealAround {
        /// Cell at the centre of the revealed square.
        center: CellCoord,
        /// Chebyshev radius of the revealed square in cells.
        radius: u32,
    },
}

/// Events reported by the world and the systems.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// A fresh maze became the active stage grid.
    StageGenerated {
        /// Number of columns in the new grid.
        columns: u32,
        /// Number of rows in the new grid.
        rows: u32,
    },
    /// A wall cell was opened.
    WallRemoved {
        /// Cell that became walkable.
        cell: CellCoord,
    },
    /// Cells became explored on the minimap.
    CellsRevealed {
        /// Number of cells whose explored flag flipped.
        count: u32,
    },
    /// An agent entered the maze.
    AgentSpawned {
        /// Identifier allocated to the agent.
        agent: AgentId,
        /// Species of the agent.
        species: SpeciesKind,
        /// Cell the agent occupies.
        cell: CellCoord,
    },
    /// An agent switched behaviour state.
    AgentStateChanged {
        /// Agent that changed state.
        agent: AgentId,
        /// State before the transition.
        from: AgentState,
        /// State after the transition.
        to: AgentState,
    },
    /// An agent finished moving onto a tile.
    AgentTileCompleted {
        /// Agent that finished the step.
        agent: AgentId,
        /// Tile the agent now rests on.
        cell: CellCoord,
    },
    /// A trap froze an agent.
    AgentFrozen {
        /// Agent that stopped updating.
        agent: AgentId,
    },
    /// A frozen agent resumed updating.
    AgentThawed {
        /// Agent that resumed.
        agent: AgentId,
    },
    /// An agent landed a contact hit on the player.
    PlayerStruck {
        /// Agent that attacked.
        agent: AgentId,
        /// Damage dealt by the hit.
        damage: u32,
    },
    /// An agent's health reached zero.
    AgentDied {
        /// Agent that died.
        agent: AgentId,
    },
}
