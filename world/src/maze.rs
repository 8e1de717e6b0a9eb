//! Dense maze grid owned by the world for the lifetime of a stage.

use maze_survival_core::{Cell, CellCoord, CellRect, CellRectSize, GridView};
use thiserror::Error;

/// Smallest grid edge that can host a maze node surrounded by walls.
pub const MIN_DIMENSION: u32 = 3;

/// Largest grid edge accepted by [`Maze::new`].
pub const MAX_DIMENSION: u32 = 4095;

/// Reasons a maze grid could not be constructed or updated.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// At least one requested dimension was zero.
    #[error("maze dimensions must be positive, got {columns}x{rows}")]
    EmptyDimension {
        /// Requested number of columns.
        columns: u32,
        /// Requested number of rows.
        rows: u32,
    },
    /// At least one requested dimension exceeds [`MAX_DIMENSION`].
    #[error("maze dimensions {columns}x{rows} exceed the {MAX_DIMENSION} cell limit")]
    TooLarge {
        /// Requested number of columns.
        columns: u32,
        /// Requested number of rows.
        rows: u32,
    },
    /// A replacement mask did not cover the grid exactly.
    #[error("mask holds {actual} cells but the grid has {expected}")]
    MaskSizeMismatch {
        /// Number of cells in the grid.
        expected: usize,
        /// Number of entries supplied.
        actual: usize,
    },
}

/// Rounds a requested edge length up to the next odd value of at least
/// [`MIN_DIMENSION`].
#[must_use]
pub fn coerce_dimension(value: u32) -> u32 {
    let odd = if value % 2 == 0 {
        value.saturating_add(1)
    } else {
        value
    };
    odd.max(MIN_DIMENSION)
}

/// The maze grid: cells, playable-shape mask, explored flags and endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    columns: u32,
    rows: u32,
    cells: Vec<Cell>,
    mask: Vec<bool>,
    explored: Vec<bool>,
    entrance: Option<CellCoord>,
    exit: Option<CellCoord>,
}

impl Maze {
    /// Creates a grid filled with walls, fully masked in and unexplored.
    ///
    /// Both dimensions are rounded up to odd values so that odd/odd cells act
    /// as maze nodes and mixed-parity cells as the walls between them.
    pub fn new(columns: u32, rows: u32) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::EmptyDimension { columns, rows });
        }
        if columns > MAX_DIMENSION || rows > MAX_DIMENSION {
            return Err(GridError::TooLarge { columns, rows });
        }

        let columns = coerce_dimension(columns);
        let rows = coerce_dimension(rows);
        let count = cell_count(columns, rows);

        Ok(Self {
            columns,
            rows,
            cells: vec![Cell::Wall; count],
            mask: vec![true; count],
            explored: vec![false; count],
            entrance: None,
            exit: None,
        })
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Grid dimensions as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Row-major cell contents.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Row-major playable-shape mask.
    #[must_use]
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Row-major fog-of-war flags.
    #[must_use]
    pub fn explored(&self) -> &[bool] {
        &self.explored
    }

    /// Entrance cell, once placed.
    #[must_use]
    pub const fn entrance(&self) -> Option<CellCoord> {
        self.entrance
    }

    /// Exit cell, once placed.
    #[must_use]
    pub const fn exit(&self) -> Option<CellCoord> {
        self.exit
    }

    /// Read-only view handed to pathfinding, spawning and agents.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(&self.cells, self.columns, self.rows).with_endpoints(self.entrance, self.exit)
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Reports whether the cell lies on the outermost ring of the grid.
    #[must_use]
    pub const fn is_boundary(&self, cell: CellCoord) -> bool {
        cell.column() == 0
            || cell.row() == 0
            || cell.column() + 1 == self.columns
            || cell.row() + 1 == self.rows
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
        Some(row * width + column)
    }

    /// Contents of the cell, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<Cell> {
        self.index(cell).map(|index| self.cells[index])
    }

    /// Reports whether the cell is inside the grid and walkable.
    #[must_use]
    pub fn is_open(&self, cell: CellCoord) -> bool {
        self.cell(cell).is_some_and(Cell::is_open)
    }

    /// Reports whether the cell belongs to the playable shape.
    #[must_use]
    pub fn in_mask(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some_and(|index| self.mask[index])
    }

    /// Reports whether the cell has been revealed on the minimap.
    #[must_use]
    pub fn is_explored(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some_and(|index| self.explored[index])
    }

    /// Overwrites a cell. Returns `false` when the cell lies outside the grid.
    pub fn set_cell(&mut self, cell: CellCoord, value: Cell) -> bool {
        match self.index(cell) {
            Some(index) => {
                self.cells[index] = value;
                true
            }
            None => false,
        }
    }

    /// Replaces the playable-shape mask.
    pub fn set_mask(&mut self, mask: Vec<bool>) -> Result<(), GridError> {
        if mask.len() != self.cells.len() {
            return Err(GridError::MaskSizeMismatch {
                expected: self.cells.len(),
                actual: mask.len(),
            });
        }
        self.mask = mask;
        Ok(())
    }

    /// Adds a single cell to the playable shape. Returns `false` when the
    /// cell lies outside the grid.
    pub fn include_in_mask(&mut self, cell: CellCoord) -> bool {
        match self.index(cell) {
            Some(index) => {
                self.mask[index] = true;
                true
            }
            None => false,
        }
    }

    /// Records the entrance cell.
    pub fn set_entrance(&mut self, entrance: Option<CellCoord>) {
        self.entrance = entrance;
    }

    /// Records the exit cell.
    pub fn set_exit(&mut self, exit: Option<CellCoord>) {
        self.exit = exit;
    }

    /// Opens an interior wall that belongs to the playable shape.
    ///
    /// Boundary cells, masked-out cells and cells that are already open are
    /// left untouched. Returns `true` when the wall was removed.
    pub fn open_wall(&mut self, cell: CellCoord) -> bool {
        if !self.contains(cell) || self.is_boundary(cell) || !self.in_mask(cell) {
            return false;
        }
        if self.is_open(cell) {
            return false;
        }
        self.set_cell(cell, Cell::Path)
    }

    /// Marks every cell of the rectangle explored, returning how many flipped.
    pub fn mark_explored(&mut self, rect: CellRect) -> u32 {
        let mut revealed = 0;
        for cell in rect.cells() {
            let Some(index) = self.index(cell) else {
                continue;
            };
            if !self.explored[index] {
                self.explored[index] = true;
                revealed += 1;
            }
        }
        revealed
    }

    /// Marks the square of cells within `radius` of `center` explored.
    pub fn mark_explored_around(&mut self, center: CellCoord, radius: u32) -> u32 {
        match square_around(center, radius, self.columns, self.rows) {
            Some(rect) => self.mark_explored(rect),
            None => 0,
        }
    }

    /// Reveals one piece of the grid split into `region_rows × region_columns`
    /// pieces. Returns the number of newly explored cells.
    pub fn reveal_region(&mut self, index: u32, region_rows: u32, region_columns: u32) -> u32 {
        match region_bounds(self.columns, self.rows, index, region_rows, region_columns) {
            Some(rect) => self.mark_explored(rect),
            None => 0,
        }
    }
}

/// Bounds of piece `index` (row-major) when a `columns × rows` grid is split
/// into `region_rows × region_columns` pieces.
///
/// Pieces are `ceil(columns / region_columns)` cells wide and
/// `ceil(rows / region_rows)` cells tall; the last row and column of pieces are
/// clipped to the grid. Returns `None` for an out-of-range index, a zero split
/// or a piece that falls entirely outside the grid.
#[must_use]
pub fn region_bounds(
    columns: u32,
    rows: u32,
    index: u32,
    region_rows: u32,
    region_columns: u32,
) -> Option<CellRect> {
    if region_rows == 0 || region_columns == 0 {
        return None;
    }
    if index >= region_rows.checked_mul(region_columns)? {
        return None;
    }

    let piece_width = columns.div_ceil(region_columns);
    let piece_height = rows.div_ceil(region_rows);
    let left = (index % region_columns).checked_mul(piece_width)?;
    let top = (index / region_columns).checked_mul(piece_height)?;
    if left >= columns || top >= rows {
        return None;
    }

    let width = piece_width.min(columns - left);
    let height = piece_height.min(rows - top);
    Some(CellRect::from_origin_and_size(
        CellCoord::new(left, top),
        CellRectSize::new(width, height),
    ))
}

/// Square of cells within Chebyshev `radius` of `center`, clipped to the grid.
#[must_use]
pub fn square_around(center: CellCoord, radius: u32, columns: u32, rows: u32) -> Option<CellRect> {
    if center.column() >= columns || center.row() >= rows {
        return None;
    }
    let left = center.column().saturating_sub(radius);
    let top = center.row().saturating_sub(radius);
    let right = center.column().saturating_add(radius).min(columns - 1);
    let bottom = center.row().saturating_add(radius).min(rows - 1);
    Some(CellRect::from_origin_and_size(
        CellCoord::new(left, top),
        CellRectSize::new(right - left + 1, bottom - top + 1),
    ))
}

fn cell_count(columns: u32, rows: u32) -> usize {
    let count = u64::from(columns) * u64::from(rows);
    usize::try_from(count).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rounds_dimensions_up_to_odd() {
        let maze = Maze::new(14, 9).expect("valid dimensions");
        assert_eq!(maze.dimensions(), (15, 9));
        assert_eq!(maze.cells().len(), 135);
        assert!(maze.cells().iter().all(|cell| *cell == Cell::Wall));
        assert!(maze.mask().iter().all(|inside| *inside));
        assert!(maze.explored().iter().all(|seen| !*seen));
    }

    #[test]
    fn new_raises_tiny_dimensions_to_minimum() {
        let maze = Maze::new(1, 2).expect("valid dimensions");
        assert_eq!(maze.dimensions(), (3, 3));
    }

    #[test]
    fn new_rejects_zero_dimension() {
        assert_eq!(
            Maze::new(0, 7),
            Err(GridError::EmptyDimension {
                columns: 0,
                rows: 7
            })
        );
    }

    #[test]
    fn set_mask_rejects_wrong_length() {
        let mut maze = Maze::new(5, 5).expect("valid dimensions");
        assert_eq!(
            maze.set_mask(vec![true; 4]),
            Err(GridError::MaskSizeMismatch {
                expected: 25,
                actual: 4
            })
        );
    }

    #[test]
    fn include_in_mask_adds_one_cell() {
        let mut maze = Maze::new(5, 5).expect("valid dimensions");
        maze.set_mask(vec![false; 25]).expect("mask fits");

        assert!(maze.include_in_mask(CellCoord::new(2, 3)));
        assert!(!maze.include_in_mask(CellCoord::new(5, 0)));

        assert!(maze.in_mask(CellCoord::new(2, 3)));
        assert_eq!(maze.mask().iter().filter(|member| **member).count(), 1);
    }

    #[test]
    fn open_wall_refuses_boundary_and_masked_out_cells() {
        let mut maze = Maze::new(5, 5).expect("valid dimensions");
        let mut mask = vec![true; 25];
        mask[2 * 5 + 2] = false;
        maze.set_mask(mask).expect("mask fits");

        assert!(!maze.open_wall(CellCoord::new(0, 2)));
        assert!(!maze.open_wall(CellCoord::new(2, 2)));
        assert!(maze.open_wall(CellCoord::new(1, 2)));
        assert!(!maze.open_wall(CellCoord::new(1, 2)), "already open");
    }

    #[test]
    fn region_bounds_partition_the_grid() {
        let mut covered = vec![0_u32; 15 * 11];
        for index in 0..6 {
            let rect = region_bounds(15, 11, index, 2, 3).expect("index in range");
            for cell in rect.cells() {
                covered[(cell.row() * 15 + cell.column()) as usize] += 1;
            }
        }
        assert!(covered.iter().all(|count| *count == 1));

        let last = region_bounds(15, 11, 5, 2, 3).expect("index in range");
        assert_eq!(last.origin(), CellCoord::new(10, 6));
        assert_eq!(last.size(), CellRectSize::new(5, 5));
        assert_eq!(region_bounds(15, 11, 6, 2, 3), None);
        assert_eq!(region_bounds(15, 11, 0, 0, 3), None);
    }

    #[test]
    fn reveal_region_counts_only_new_cells() {
        let mut maze = Maze::new(9, 9).expect("valid dimensions");
        let first = maze.reveal_region(0, 3, 3);
        assert_eq!(first, 9);
        assert_eq!(maze.reveal_region(0, 3, 3), 0);
        assert!(maze.is_explored(CellCoord::new(2, 2)));
        assert!(!maze.is_explored(CellCoord::new(3, 3)));
    }

    #[test]
    fn mark_explored_around_clips_to_grid() {
        let mut maze = Maze::new(7, 7).expect("valid dimensions");
        assert_eq!(maze.mark_explored_around(CellCoord::new(0, 0), 2), 9);
        assert_eq!(maze.mark_explored_around(CellCoord::new(9, 9), 2), 0);
    }
}
