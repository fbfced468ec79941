use core::fmt;
use core::ops::{Index, IndexMut};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::{GameError, Result};

/// Value held by a single cell; `0` marks an empty cell.
pub type Tile = u32;

/// Running score and best score.
pub type Score = u64;

/// Row-major position of a cell, `row * SIDE + column`.
pub type CellIndex = u8;

/// Cells along one edge of the board.
pub const SIDE: usize = 4;

/// Total cells on the board.
pub const CELL_COUNT: usize = SIDE * SIDE;

/// Largest tile a grid may hold. Tiles of this value no longer merge, so no
/// move can produce anything larger. Normal play cannot reach past 2^17.
pub const MAX_TILE: Tile = 1 << 20;

/// Returns true for `0` or a power of two no larger than [`MAX_TILE`].
pub const fn is_valid_tile(value: Tile) -> bool {
    value == 0 || (value.is_power_of_two() && value <= MAX_TILE)
}

/// Whether two neighbouring tiles combine when slid together.
pub const fn can_merge(value: Tile, other: Tile) -> bool {
    value != 0 && value == other && value < MAX_TILE
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// The axis a move travels along; rows for horizontal moves, columns for vertical ones.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub const fn axis(self) -> Axis {
        match self {
            Self::Left | Self::Right => Axis::Row,
            Self::Up | Self::Down => Axis::Column,
        }
    }

    /// Whether tiles travel toward the far end of their line (right or bottom edge).
    pub const fn is_reversed(self) -> bool {
        matches!(self, Self::Right | Self::Down)
    }

    /// Cell indices of line `line` ordered so that the move travels toward element 0.
    ///
    /// Writing a processed line back through the same indices undoes the orientation.
    pub const fn line(self, line: usize) -> [CellIndex; SIDE] {
        let mut out = [0; SIDE];
        let mut step = 0;
        while step < SIDE {
            let along = if self.is_reversed() {
                SIDE - 1 - step
            } else {
                step
            };
            let index = match self.axis() {
                Axis::Row => line * SIDE + along,
                Axis::Column => along * SIDE + line,
            };
            out[step] = index as CellIndex;
            step += 1;
        }
        out
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Direction {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Up),
            1 => Ok(Self::Down),
            2 => Ok(Self::Left),
            3 => Ok(Self::Right),
            _ => Err(GameError::InvalidDirection),
        }
    }
}

impl FromStr for Direction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let is_any = |names: &[&str]| names.iter().any(|name| s.eq_ignore_ascii_case(name));
        if is_any(&["up", "w", "k"]) {
            Ok(Self::Up)
        } else if is_any(&["down", "s", "j"]) {
            Ok(Self::Down)
        } else if is_any(&["left", "a", "h"]) {
            Ok(Self::Left)
        } else if is_any(&["right", "d", "l"]) {
            Ok(Self::Right)
        } else {
            Err(GameError::InvalidDirection)
        }
    }
}

/// The 16 cells of the board in row-major order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Grid([Tile; CELL_COUNT]);

impl Grid {
    pub const EMPTY: Grid = Grid([0; CELL_COUNT]);

    /// Wraps `cells` without checking the tile invariant.
    pub const fn new_unchecked(cells: [Tile; CELL_COUNT]) -> Self {
        Self(cells)
    }

    pub fn from_cells(cells: &[Tile]) -> Result<Self> {
        let cells: [Tile; CELL_COUNT] = cells
            .try_into()
            .map_err(|_| GameError::InvalidGridLength(cells.len()))?;
        if let Some((index, &value)) = cells
            .iter()
            .enumerate()
            .find(|&(_, &value)| !is_valid_tile(value))
        {
            return Err(GameError::InvalidTile { index, value });
        }
        Ok(Self(cells))
    }

    pub const fn cells(&self) -> &[Tile; CELL_COUNT] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&value| value == 0)
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().all(|&value| value != 0)
    }

    pub fn empty_count(&self) -> usize {
        self.0.iter().filter(|&&value| value == 0).count()
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|&(_, &value)| value == 0)
            .map(|(index, _)| index as CellIndex)
    }

    pub fn max_tile(&self) -> Tile {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// Sum of all tile values.
    pub fn mass(&self) -> u64 {
        self.0.iter().map(|&value| u64::from(value)).sum()
    }

    pub fn contains(&self, value: Tile) -> bool {
        self.0.contains(&value)
    }

    /// True when two horizontally or vertically adjacent cells hold the same non-zero value.
    pub fn has_adjacent_pair(&self) -> bool {
        (0..SIDE).any(|row| {
            (0..SIDE).any(|col| {
                let value = self.0[row * SIDE + col];
                (col + 1 < SIDE && can_merge(value, self.0[row * SIDE + col + 1]))
                    || (row + 1 < SIDE && can_merge(value, self.0[(row + 1) * SIDE + col]))
            })
        })
    }

    pub fn line(&self, direction: Direction, line: usize) -> [Tile; SIDE] {
        direction.line(line).map(|index| self[index])
    }

    pub fn set_line(&mut self, direction: Direction, line: usize, values: [Tile; SIDE]) {
        for (index, value) in direction.line(line).into_iter().zip(values) {
            self[index] = value;
        }
    }
}

impl Index<CellIndex> for Grid {
    type Output = Tile;

    fn index(&self, index: CellIndex) -> &Self::Output {
        &self.0[usize::from(index)]
    }
}

impl IndexMut<CellIndex> for Grid {
    fn index_mut(&mut self, index: CellIndex) -> &mut Self::Output {
        &mut self.0[usize::from(index)]
    }
}

impl TryFrom<&[Tile]> for Grid {
    type Error = GameError;

    fn try_from(cells: &[Tile]) -> Result<Self> {
        Self::from_cells(cells)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.0.chunks(SIDE) {
            for (col, &value) in row.iter().enumerate() {
                if col > 0 {
                    f.write_str(" ")?;
                }
                if value == 0 {
                    write!(f, "{:>5}", ".")?;
                } else {
                    write!(f, "{:>5}", value)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_indices_face_the_move_direction() {
        assert_eq!(Direction::Left.line(1), [4, 5, 6, 7]);
        assert_eq!(Direction::Right.line(1), [7, 6, 5, 4]);
        assert_eq!(Direction::Up.line(2), [2, 6, 10, 14]);
        assert_eq!(Direction::Down.line(2), [14, 10, 6, 2]);
    }

    #[test]
    fn every_direction_covers_each_cell_once() {
        for direction in Direction::ALL {
            let mut seen = [false; CELL_COUNT];
            for line in 0..SIDE {
                for index in direction.line(line) {
                    assert!(!seen[usize::from(index)]);
                    seen[usize::from(index)] = true;
                }
            }
            assert!(seen.iter().all(|&hit| hit), "{direction}");
        }
    }

    #[test]
    fn direction_conversions_reject_unknown_input() {
        assert_eq!(Direction::try_from(3), Ok(Direction::Right));
        assert_eq!(Direction::try_from(4), Err(GameError::InvalidDirection));
        assert_eq!("W".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!(" left ".parse::<Direction>(), Ok(Direction::Left));
        assert_eq!("sideways".parse::<Direction>(), Err(GameError::InvalidDirection));
    }

    #[test]
    fn from_cells_rejects_bad_length_and_values() {
        assert_eq!(
            Grid::from_cells(&[2, 4]),
            Err(GameError::InvalidGridLength(2))
        );

        let mut cells = [0; CELL_COUNT];
        cells[5] = 6;
        assert_eq!(
            Grid::from_cells(&cells),
            Err(GameError::InvalidTile { index: 5, value: 6 })
        );

        cells[5] = MAX_TILE * 2;
        assert!(Grid::from_cells(&cells).is_err());

        cells[5] = 1024;
        assert_eq!(Grid::from_cells(&cells).map(|grid| grid[5]), Ok(1024));
    }

    #[test]
    fn adjacent_pair_checks_rows_and_columns() {
        let checker = Grid::new_unchecked([2, 4, 2, 4, 4, 2, 4, 2, 2, 4, 2, 4, 4, 2, 4, 2]);
        assert!(!checker.has_adjacent_pair());

        let mut vertical = checker;
        vertical[4] = 2;
        assert!(vertical.has_adjacent_pair());

        let mut horizontal = checker;
        horizontal[15] = 4;
        assert!(horizontal.has_adjacent_pair());
    }

    #[test]
    fn largest_tile_pairs_are_not_mergeable() {
        let mut cells = [2, 4, 2, 4, 4, 2, 4, 2, 2, 4, 2, 4, 4, 2, 4, 2];
        cells[0] = MAX_TILE;
        cells[1] = MAX_TILE;
        let grid = Grid::new_unchecked(cells);
        assert!(!grid.has_adjacent_pair());
        assert!(can_merge(MAX_TILE / 2, MAX_TILE / 2));
        assert!(!can_merge(0, 0));
    }

    #[test]
    fn set_line_writes_back_through_orientation() {
        let mut grid = Grid::EMPTY;
        grid.set_line(Direction::Down, 0, [8, 4, 2, 0]);
        assert_eq!(grid[12], 8);
        assert_eq!(grid[8], 4);
        assert_eq!(grid[4], 2);
        assert_eq!(grid[0], 0);
        assert_eq!(grid.line(Direction::Down, 0), [8, 4, 2, 0]);
        assert_eq!(grid.line(Direction::Up, 0), [0, 2, 4, 8]);
    }
}
