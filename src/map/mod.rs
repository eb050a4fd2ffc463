//! The wall grid shared by the generator, the robot and the renderer.
//!
//! Cells are stored row-major. Whenever a [`Point`] is used, `x` is the
//! column and `y` is the row; the tuple APIs take `(row, col)`.

pub mod generator;

use std::fmt;

use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::{Algorithm2D, BaseMap, DijkstraMap, DistanceAlg};
use smallvec::SmallVec;
use thiserror::Error;

pub use generator::{GenerationReport, WallMapGenerator, carve_path, generate};

pub const WALL_GLYPH: char = 'x';
pub const OPEN_GLYPH: char = ' ';

/// Upper bound on `rows * cols`, keeping every cell index inside `i32`.
pub const MAX_CELLS: i32 = 1 << 20;

/// Unit `(drow, dcol)` steps in canonical Up, Down, Left, Right order.
pub const NEIGHBOR_DELTAS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Wall,
    Open,
}

impl Cell {
    pub const fn is_wall(self) -> bool {
        matches!(self, Cell::Wall)
    }

    pub const fn glyph(self) -> char {
        match self {
            Cell::Wall => WALL_GLYPH,
            Cell::Open => OPEN_GLYPH,
        }
    }

    pub const fn from_glyph(glyph: char) -> Self {
        if glyph == WALL_GLYPH {
            Cell::Wall
        } else {
            Cell::Open
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("map must be at least 3x3, got {rows}x{cols}")]
    TooSmall { rows: i32, cols: i32 },

    #[error("map may hold at most {MAX_CELLS} cells, got {rows}x{cols}")]
    TooLarge { rows: i32, cols: i32 },

    #[error("wall density must be between 0 and 100 percent, got {0}")]
    InvalidDensity(u32),

    #[error("no rows to parse")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
}

pub type MapResult<T> = Result<T, MapError>;

pub(crate) fn check_size(rows: i32, cols: i32) -> MapResult<()> {
    if rows < 3 || cols < 3 {
        return Err(MapError::TooSmall { rows, cols });
    }
    match rows.checked_mul(cols) {
        Some(cells) if cells <= MAX_CELLS => Ok(()),
        _ => Err(MapError::TooLarge { rows, cols }),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WallMap {
    rows: i32,
    cols: i32,
    cells: Vec<Cell>,
}

impl WallMap {
    fn filled(rows: i32, cols: i32, cell: Cell) -> Self {
        Self {
            rows,
            cols,
            cells: vec![cell; (rows * cols) as usize],
        }
    }

    /// An all-open interior surrounded by a wall border.
    pub fn bordered(rows: i32, cols: i32) -> MapResult<Self> {
        check_size(rows, cols)?;
        let mut map = Self::filled(rows, cols, Cell::Open);
        map.seal_border();
        Ok(map)
    }

    /// Parses rows of glyphs, `'x'` being a wall and anything else open.
    /// The border is taken as given.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> MapResult<Self> {
        let first = rows.first().ok_or(MapError::Empty)?;
        let expected = first.as_ref().chars().count();
        if expected == 0 {
            return Err(MapError::Empty);
        }

        if expected.saturating_mul(rows.len()) > MAX_CELLS as usize {
            return Err(MapError::TooLarge {
                rows: i32::try_from(rows.len()).unwrap_or(i32::MAX),
                cols: i32::try_from(expected).unwrap_or(i32::MAX),
            });
        }

        let mut cells = Vec::with_capacity(expected * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let found = line.as_ref().chars().count();
            if found != expected {
                return Err(MapError::RaggedRows {
                    row,
                    expected,
                    found,
                });
            }
            cells.extend(line.as_ref().chars().map(Cell::from_glyph));
        }

        Ok(Self {
            rows: rows.len() as i32,
            cols: expected as i32,
            cells,
        })
    }

    pub fn to_rows(&self) -> Vec<String> {
        (0..self.rows)
            .map(|row| {
                (0..self.cols)
                    .map(|col| self.cell(row, col).glyph())
                    .collect()
            })
            .collect()
    }

    pub const fn rows(&self) -> i32 {
        self.rows
    }

    pub const fn cols(&self) -> i32 {
        self.cols
    }

    fn idx(&self, row: i32, col: i32) -> Option<usize> {
        if self.in_bounds(row, col) {
            Some((row * self.cols + col) as usize)
        } else {
            None
        }
    }

    pub const fn in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && row < self.rows && col >= 0 && col < self.cols
    }

    pub const fn is_border(&self, row: i32, col: i32) -> bool {
        row == 0 || col == 0 || row == self.rows - 1 || col == self.cols - 1
    }

    /// Out-of-bounds cells read as walls.
    pub fn cell(&self, row: i32, col: i32) -> Cell {
        self.idx(row, col)
            .map_or(Cell::Wall, |idx| self.cells[idx])
    }

    pub fn is_wall(&self, row: i32, col: i32) -> bool {
        self.cell(row, col).is_wall()
    }

    pub(crate) fn set(&mut self, row: i32, col: i32, cell: Cell) {
        if let Some(idx) = self.idx(row, col) {
            self.cells[idx] = cell;
        }
    }

    pub(crate) fn seal_border(&mut self) {
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.is_border(row, col) {
                    self.set(row, col, Cell::Wall);
                }
            }
        }
    }

    pub fn border_is_sealed(&self) -> bool {
        (0..self.rows).all(|row| {
            (0..self.cols).all(|col| !self.is_border(row, col) || self.is_wall(row, col))
        })
    }

    pub fn wall_neighbors(&self, row: i32, col: i32) -> usize {
        NEIGHBOR_DELTAS
            .iter()
            .filter(|(drow, dcol)| self.is_wall(row + drow, col + dcol))
            .count()
    }

    pub fn open_neighbors(&self, row: i32, col: i32) -> SmallVec<[(i32, i32); 4]> {
        NEIGHBOR_DELTAS
            .iter()
            .map(|(drow, dcol)| (row + drow, col + dcol))
            .filter(|&(r, c)| !self.is_wall(r, c))
            .collect()
    }

    pub fn interior_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (1..self.rows - 1).flat_map(move |row| (1..self.cols - 1).map(move |col| (row, col)))
    }

    pub fn open_cells(&self) -> Vec<(i32, i32)> {
        let mut cells = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                if !self.is_wall(row, col) {
                    cells.push((row, col));
                }
            }
        }
        cells
    }

    pub fn interior_open_count(&self) -> usize {
        self.interior_cells()
            .filter(|&(row, col)| !self.is_wall(row, col))
            .count()
    }

    /// Number of open cells reachable from `(row, col)` through 4-connected
    /// moves, the start included. Zero when the start is a wall.
    pub fn reachable_from(&self, row: i32, col: i32) -> usize {
        let Some(start) = self.idx(row, col) else {
            return 0;
        };
        if self.cells[start].is_wall() {
            return 0;
        }
        let max_depth = (self.rows * self.cols) as f32;
        let dijkstra = DijkstraMap::new(self.cols, self.rows, &[start], self, max_depth);
        dijkstra
            .map
            .iter()
            .filter(|&&depth| depth < f32::MAX)
            .count()
    }
}

impl fmt::Display for WallMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, row) in self.to_rows().iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{row}")?;
        }
        Ok(())
    }
}

impl BaseMap for WallMap {
    fn is_opaque(&self, idx: usize) -> bool {
        self.cells.get(idx).is_none_or(|cell| cell.is_wall())
    }

    fn get_available_exits(&self, idx: usize) -> SmallVec<[(usize, f32); 10]> {
        let mut exits = SmallVec::new();
        let point = self.index_to_point2d(idx);
        for (row, col) in self.open_neighbors(point.y, point.x) {
            if let Some(dest) = self.idx(row, col) {
                exits.push((dest, 1.0));
            }
        }
        exits
    }

    fn get_pathing_distance(&self, idx1: usize, idx2: usize) -> f32 {
        let p1 = self.index_to_point2d(idx1);
        let p2 = self.index_to_point2d(idx2);
        DistanceAlg::Pythagoras.distance2d(p1, p2)
    }
}

impl Algorithm2D for WallMap {
    fn dimensions(&self) -> Point {
        Point::new(self.cols, self.rows)
    }

    fn in_bounds(&self, point: Point) -> bool {
        WallMap::in_bounds(self, point.y, point.x)
    }
}
