use crate::cell::{self, Cell};
use rand::Rng;
use rand::seq::IteratorRandom;
use std::collections::BTreeSet;

/// Tracks the current status of the game (playing, won, lost).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// The hidden layout of a game. This is the ground truth that observations
/// fed to the engine are computed from.
#[derive(Debug, Clone)]
pub struct Board {
    pub height: usize,
    pub width: usize,
    mines: BTreeSet<Cell>,
    /// Mines the player has flagged so far.
    mines_found: BTreeSet<Cell>,
}

impl Board {
    /// Places `mines` mines uniformly at random.
    pub fn new<R: Rng + ?Sized>(height: usize, width: usize, mines: usize, rng: &mut R) -> Self {
        if mines >= height * width {
            panic!("Total mines must be less than the number of cells on the board.");
        }

        let layout = cell::all_cells(height, width).choose_multiple(rng, mines);
        Board::with_mines(height, width, layout)
    }

    /// Builds a board with mines at exactly the given cells.
    pub fn with_mines(height: usize, width: usize, mines: impl IntoIterator<Item = Cell>) -> Self {
        let mines: BTreeSet<Cell> = mines.into_iter().collect();
        assert!(
            mines.iter().all(|m| m.in_bounds(height, width)),
            "mine outside a {height}x{width} board"
        );
        Board {
            height,
            width,
            mines,
            mines_found: BTreeSet::new(),
        }
    }

    pub fn mines(&self) -> &BTreeSet<Cell> {
        &self.mines
    }

    pub fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }

    /// Number of mines within one row and column of `cell`, not counting
    /// the cell itself.
    pub fn nearby_mines(&self, cell: Cell) -> usize {
        cell.neighbors(self.height, self.width)
            .filter(|n| self.mines.contains(n))
            .count()
    }

    /// Records that the player believes `cell` holds a mine.
    pub fn flag(&mut self, cell: Cell) {
        self.mines_found.insert(cell);
    }

    pub fn flagged(&self) -> &BTreeSet<Cell> {
        &self.mines_found
    }

    /// Checks if all mines have been flagged.
    pub fn won(&self) -> bool {
        self.mines_found == self.mines
    }
}
