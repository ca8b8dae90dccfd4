use crate::cell::{self, Cell};
use crate::constraint::Constraint;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::BTreeSet;

/// The player's knowledge about one game.
///
/// Holds every live constraint along with the cells proven safe, the cells
/// proven to be mines and the cells already played. `safes` and `mines` are
/// cached conclusions of `knowledge`; they only ever grow and never overlap.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KnowledgeBase {
    height: usize,
    width: usize,
    /// Cells the player has already selected.
    moves_made: BTreeSet<Cell>,
    /// Cells proven safe.
    safes: BTreeSet<Cell>,
    /// Cells proven to be mines.
    mines: BTreeSet<Cell>,
    /// Live constraints. Never empty, never duplicated once propagation settles.
    knowledge: Vec<Constraint>,
}

impl KnowledgeBase {
    pub fn new(height: usize, width: usize) -> Self {
        KnowledgeBase {
            height,
            width,
            moves_made: BTreeSet::new(),
            safes: BTreeSet::new(),
            mines: BTreeSet::new(),
            knowledge: Vec::new(),
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn moves_made(&self) -> &BTreeSet<Cell> {
        &self.moves_made
    }

    pub fn safes(&self) -> &BTreeSet<Cell> {
        &self.safes
    }

    pub fn mines(&self) -> &BTreeSet<Cell> {
        &self.mines
    }

    pub fn knowledge(&self) -> &[Constraint] {
        &self.knowledge
    }

    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> {
        cell.neighbors(self.height, self.width)
    }

    pub fn all_cells(&self) -> impl Iterator<Item = Cell> {
        cell::all_cells(self.height, self.width)
    }

    /// Deserializes an engine from bytes.
    pub fn deserialize(bts: &[u8]) -> anyhow::Result<Self> {
        Ok(bcs::from_bytes(bts)?)
    }

    /// Serializes the engine to bytes.
    pub fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    /// Records `cell` as a mine and removes it from every constraint.
    ///
    /// Does not run inference on its own; call [`KnowledgeBase::propagate`]
    /// afterwards to draw conclusions from the rewritten constraints.
    pub fn mark_mine(&mut self, cell: Cell) {
        assert!(
            !self.safes.contains(&cell),
            "cell {cell} proven both safe and a mine"
        );
        self.mines.insert(cell);
        for constraint in &mut self.knowledge {
            constraint.mark_mine(cell);
        }
    }

    /// Records `cell` as safe and removes it from every constraint.
    pub fn mark_safe(&mut self, cell: Cell) {
        assert!(
            !self.mines.contains(&cell),
            "cell {cell} proven both a mine and safe"
        );
        self.safes.insert(cell);
        for constraint in &mut self.knowledge {
            constraint.mark_safe(cell);
        }
    }

    /// Called when the board reveals `cell` and reports that `count` of its
    /// neighbours are mines.
    ///
    /// The cell is recorded as played and safe, a constraint over its
    /// undetermined neighbours is added, and inference runs until nothing
    /// more can be concluded. Observations that contradict what is already
    /// known are rejected before anything changes.
    pub fn add_knowledge(&mut self, cell: Cell, count: usize) -> anyhow::Result<()> {
        if !cell.in_bounds(self.height, self.width) {
            anyhow::bail!("cell_out_of_bounds");
        }
        if self.mines.contains(&cell) {
            anyhow::bail!("cell_is_known_mine");
        }

        let observation = self.reduce(&Constraint::new(self.neighbors(cell), count))?;

        self.moves_made.insert(cell);
        self.mark_safe(cell);
        self.insert(observation);
        self.propagate();

        Ok(())
    }

    /// Adds an arbitrary fact about the board and runs inference.
    ///
    /// Cells already known are folded out of the constraint first, the same
    /// way neighbours are for [`KnowledgeBase::add_knowledge`].
    pub fn add_constraint(&mut self, constraint: &Constraint) -> anyhow::Result<()> {
        let reduced = self.reduce(constraint)?;
        self.insert(reduced);
        self.propagate();
        Ok(())
    }

    /// Returns a cell known to be safe that has not been played yet.
    ///
    /// Never changes any state. The smallest candidate in row-major order is
    /// returned so repeated calls agree.
    pub fn make_safe_move(&self) -> Option<Cell> {
        self.safes.difference(&self.moves_made).next().copied()
    }

    /// Picks uniformly among cells that are neither played nor known mines.
    pub fn make_random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        let candidates: Vec<Cell> = self
            .all_cells()
            .filter(|c| !self.moves_made.contains(c) && !self.mines.contains(c))
            .collect();

        candidates.choose(rng).copied()
    }

    /// Runs inference passes until one changes nothing.
    ///
    /// Returns whether any pass made progress. Each productive pass either
    /// settles a cell, shrinks or drops a constraint, or adds a constraint
    /// over a new subset of the finitely many frontier cells, so the loop
    /// always ends.
    pub fn propagate(&mut self) -> bool {
        let mut progressed = false;
        while self.inference_pass() {
            progressed = true;
        }
        progressed
    }

    fn inference_pass(&mut self) -> bool {
        let mut changed = false;

        let mut safes = BTreeSet::new();
        let mut mines = BTreeSet::new();
        for constraint in &self.knowledge {
            safes.extend(constraint.known_safes());
            mines.extend(constraint.known_mines());
        }

        for cell in safes {
            if !self.safes.contains(&cell) {
                self.mark_safe(cell);
                changed = true;
            }
        }
        for cell in mines {
            if !self.mines.contains(&cell) {
                self.mark_mine(cell);
                changed = true;
            }
        }

        self.prune();

        let derived = self.subset_inferences();
        if !derived.is_empty() {
            self.knowledge.extend(derived);
            changed = true;
        }

        self.assert_consistent();
        changed
    }

    /// Drops emptied constraints, plus any that marking made equal to an
    /// earlier one.
    fn prune(&mut self) {
        let mut kept: Vec<Constraint> = Vec::with_capacity(self.knowledge.len());
        for constraint in self.knowledge.drain(..) {
            if !constraint.is_empty() && !kept.contains(&constraint) {
                kept.push(constraint);
            }
        }
        self.knowledge = kept;
    }

    /// For every pair where one constraint's cells sit inside another's, the
    /// leftover cells owe the difference of the counts.
    fn subset_inferences(&self) -> Vec<Constraint> {
        let mut derived: Vec<Constraint> = Vec::new();

        for (i, subset) in self.knowledge.iter().enumerate() {
            for (j, superset) in self.knowledge.iter().enumerate() {
                if i == j || subset.is_empty() || subset == superset || !subset.is_subset(superset)
                {
                    continue;
                }

                let inferred = superset.subtract(subset);
                if !inferred.is_empty()
                    && !self.knowledge.contains(&inferred)
                    && !derived.contains(&inferred)
                {
                    derived.push(inferred);
                }
            }
        }

        derived
    }

    /// Folds already-settled cells out of `constraint`, checking it against
    /// the board and against what is known.
    fn reduce(&self, constraint: &Constraint) -> anyhow::Result<Constraint> {
        let mut undetermined = BTreeSet::new();
        let mut known_mines = 0;

        for &cell in constraint.cells() {
            if !cell.in_bounds(self.height, self.width) {
                anyhow::bail!("cell_out_of_bounds");
            }
            if self.mines.contains(&cell) {
                known_mines += 1;
            } else if !self.safes.contains(&cell) {
                undetermined.insert(cell);
            }
        }

        let Some(count) = constraint.count().checked_sub(known_mines) else {
            anyhow::bail!("count_below_known_mines");
        };
        if count > undetermined.len() {
            anyhow::bail!("count_exceeds_unknown_cells");
        }

        Ok(Constraint::new(undetermined, count))
    }

    fn insert(&mut self, constraint: Constraint) {
        if !constraint.is_empty() && !self.knowledge.contains(&constraint) {
            self.knowledge.push(constraint);
        }
    }

    fn assert_consistent(&self) {
        assert!(
            self.safes.is_disjoint(&self.mines),
            "safe and mine sets overlap"
        );
        for constraint in &self.knowledge {
            assert!(
                constraint.is_well_formed(),
                "constraint {constraint} owes more mines than it has cells"
            );
        }
    }
}
