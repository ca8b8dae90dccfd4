//! Knowledge-based inference for an automated Minesweeper player.
//!
//! The [`KnowledgeBase`] turns revealed cells and their neighbour counts into
//! [`Constraint`]s ("exactly N of these cells are mines"), then simplifies
//! and combines them until no further cell can be proven safe or proven to be
//! a mine. The [`Board`] supplies ground truth for demos and tests, and
//! [`analysis`] cross-checks a constraint set exhaustively with a SAT solver.

pub mod analysis;
pub mod board;
pub mod cell;
pub mod constraint;
pub mod knowledge;

pub use analysis::{Analysis, DeducedState, analyze};
pub use board::{Board, GameState};
pub use cell::Cell;
pub use constraint::Constraint;
pub use knowledge::KnowledgeBase;
