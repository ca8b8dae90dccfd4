use crate::cell::Cell;
use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt;

/// A logical statement about the board: exactly `count` of `cells` are mines.
///
/// The cell set is kept sorted, so two constraints compare equal exactly when
/// they cover the same cells with the same count, regardless of the order the
/// cells were supplied in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Constraint {
    cells: BTreeSet<Cell>,
    count: usize,
}

impl Constraint {
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Self {
        Constraint {
            cells: cells.into_iter().collect(),
            count,
        }
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// `count` never exceeds the number of cells it is spread over.
    pub fn is_well_formed(&self) -> bool {
        self.count <= self.cells.len()
    }

    /// Cells that must all be mines: the count accounts for every cell.
    pub fn known_mines(&self) -> BTreeSet<Cell> {
        if self.count == self.cells.len() {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Cells that must all be safe: no mines remain among them.
    pub fn known_safes(&self) -> BTreeSet<Cell> {
        if self.count == 0 {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Removes a cell known to be a mine, taking its mine out of the count.
    pub fn mark_mine(&mut self, cell: Cell) {
        if self.cells.remove(&cell) {
            assert!(
                self.count > 0,
                "mine {cell} marked in a constraint that owes no mines"
            );
            self.count -= 1;
        }
    }

    /// Removes a cell known to be safe.
    pub fn mark_safe(&mut self, cell: Cell) {
        self.cells.remove(&cell);
    }

    pub fn is_subset(&self, other: &Constraint) -> bool {
        self.cells.is_subset(&other.cells)
    }

    /// The constraint left over once `subset` is taken out of `self`.
    ///
    /// `subset` must cover a subset of `self`'s cells. Its mines are all
    /// inside `self`, so the remaining cells owe the difference of the counts.
    pub fn subtract(&self, subset: &Constraint) -> Constraint {
        debug_assert!(subset.is_subset(self));
        assert!(
            subset.count <= self.count,
            "subset {subset} owes more mines than its superset {self}"
        );
        Constraint {
            cells: self.cells.difference(&subset.cells).copied().collect(),
            count: self.count - subset.count,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} = {}", self.cells.iter().join(", "), self.count)
    }
}
