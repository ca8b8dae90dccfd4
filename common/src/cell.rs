use std::fmt;

/// A zero-based `(row, col)` coordinate on the board.
///
/// Ordering is row-major, so iterating a `BTreeSet<Cell>` walks the board
/// top to bottom, left to right.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }

    /// Whether the cell lies inside a `height × width` grid.
    pub fn in_bounds(self, height: usize, width: usize) -> bool {
        self.row < height && self.col < width
    }

    /// All cells within one row and one column of this one, clipped to the
    /// grid and excluding the cell itself.
    pub fn neighbors(self, height: usize, width: usize) -> impl Iterator<Item = Cell> {
        (-1..=1).flat_map(move |dr| {
            (-1..=1).filter_map(move |dc| {
                if dr == 0 && dc == 0 {
                    return None;
                }

                let r = self.row as isize + dr;
                let c = self.col as isize + dc;

                if r >= 0 && r < height as isize && c >= 0 && c < width as isize {
                    Some(Cell {
                        row: r as usize,
                        col: c as usize,
                    })
                } else {
                    None
                }
            })
        })
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Every cell of a `height × width` grid in row-major order.
pub fn all_cells(height: usize, width: usize) -> impl Iterator<Item = Cell> {
    (0..height).flat_map(move |row| (0..width).map(move |col| Cell { row, col }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_clipped_to_grid() {
        // Corner, edge and centre of a 3x3 grid
        assert_eq!(Cell::new(0, 0).neighbors(3, 3).count(), 3);
        assert_eq!(Cell::new(0, 1).neighbors(3, 3).count(), 5);
        assert_eq!(Cell::new(1, 1).neighbors(3, 3).count(), 8);

        // A 1x1 grid has no neighbours at all
        assert_eq!(Cell::new(0, 0).neighbors(1, 1).count(), 0);
    }

    #[test]
    fn test_neighbors_exclude_self() {
        let center = Cell::new(4, 4);
        for n in center.neighbors(10, 10) {
            assert_ne!(n, center);
            assert!(n.row.abs_diff(center.row) <= 1);
            assert!(n.col.abs_diff(center.col) <= 1);
        }
    }

    #[test]
    fn test_ordering_is_row_major() {
        let cells: Vec<Cell> = all_cells(2, 3).collect();
        let mut sorted = cells.clone();
        sorted.sort();
        assert_eq!(cells, sorted);
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[3], Cell::new(1, 0));
    }

    #[test]
    fn test_in_bounds() {
        assert!(Cell::new(2, 4).in_bounds(3, 5));
        assert!(!Cell::new(3, 0).in_bounds(3, 5));
        assert!(!Cell::new(0, 5).in_bounds(3, 5));
    }
}
