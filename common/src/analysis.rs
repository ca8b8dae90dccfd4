//! Exhaustive analysis of a set of constraints with a SAT solver.
//!
//! Subset inference only combines constraints nested inside one another, so
//! some certainties implied by overlapping constraints slip past it. This
//! module encodes the constraints as CNF and asks varisat, cell by cell,
//! whether each value is still possible. Like the engine it only reports
//! certain facts.

use crate::cell::Cell;
use crate::constraint::Constraint;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

/// The possible outcomes of the analysis for a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeducedState {
    ForcedMine,   // Every model makes this cell a mine.
    ForcedSafe,   // Every model makes this cell safe.
    Undetermined, // Models exist either way.
}

/// Result of analysing a constraint set.
pub struct Analysis {
    /// The deduced state of every cell mentioned by the constraints.
    pub deductions: BTreeMap<Cell, DeducedState>,
    /// One concrete assignment of mines satisfying every constraint.
    pub sample_assignment: BTreeMap<Cell, bool>,
}

impl Analysis {
    pub fn forced_safes(&self) -> BTreeSet<Cell> {
        self.cells_in(DeducedState::ForcedSafe)
    }

    pub fn forced_mines(&self) -> BTreeSet<Cell> {
        self.cells_in(DeducedState::ForcedMine)
    }

    fn cells_in(&self, wanted: DeducedState) -> BTreeSet<Cell> {
        self.deductions
            .iter()
            .filter(|&(_, &state)| state == wanted)
            .map(|(&cell, _)| cell)
            .collect()
    }
}

/// Classifies every cell appearing in `constraints`.
///
/// Fails with `"unsatisfiable"` when no placement of mines satisfies all of
/// the constraints at once.
pub fn analyze(constraints: &[Constraint]) -> anyhow::Result<Analysis> {
    let mut solver = Solver::new();
    let mut var_map: BTreeMap<Cell, Var> = BTreeMap::new();

    for constraint in constraints {
        for &cell in constraint.cells() {
            var_map.entry(cell).or_insert_with(|| solver.new_var());
        }
    }

    let mut formula = CnfFormula::new();
    for constraint in constraints {
        let lits: Vec<Lit> = constraint
            .cells()
            .iter()
            .map(|cell| Lit::from_var(var_map[cell], true))
            .collect();
        encode_exactly_k_to_formula(&mut formula, &mut solver, &lits, constraint.count());
    }
    solver.add_formula(&formula);

    if !solver.solve()? {
        anyhow::bail!("unsatisfiable");
    }

    let model = solver.model().ok_or(anyhow::anyhow!("solver_model_fail"))?;
    let sample_assignment = var_map
        .iter()
        .map(|(&cell, &var)| (cell, model.contains(&Lit::from_var(var, true))))
        .collect();

    let mut deductions = BTreeMap::new();
    for (&cell, &var) in &var_map {
        let mine_possible = satisfiable_with(&mut solver, Lit::from_var(var, true))?;
        let safe_possible = satisfiable_with(&mut solver, Lit::from_var(var, false))?;

        let state = match (mine_possible, safe_possible) {
            (true, true) => DeducedState::Undetermined,
            (true, false) => DeducedState::ForcedMine,
            (false, true) => DeducedState::ForcedSafe,
            (false, false) => anyhow::bail!("state_collision"),
        };
        deductions.insert(cell, state);
    }

    Ok(Analysis {
        deductions,
        sample_assignment,
    })
}

/// Solves under a single assumption, clearing it again afterwards.
fn satisfiable_with(solver: &mut Solver, assumption: Lit) -> anyhow::Result<bool> {
    solver.assume(&[assumption]);
    let result = solver.solve();
    solver.assume(&[]);
    Ok(result?)
}

/// Encodes an "exactly k" constraint into the CNF formula.
fn encode_exactly_k_to_formula(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    encode_at_most_k_to_formula(formula, solver, vars, k);
    encode_at_least_k_to_formula(formula, solver, vars, k);
}

/// Encodes an "at most k" constraint into the CNF formula.
fn encode_at_most_k_to_formula(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    if k >= vars.len() {
        return;
    }
    if k == 0 {
        for &lit in vars {
            formula.add_clause(&[!lit]);
        }
        return;
    }

    // Neighbourhood constraints have at most eight cells; binomial clauses
    // stay small there.
    if vars.len() <= 10 {
        for combo in vars.iter().copied().combinations(k + 1) {
            let clause: Vec<Lit> = combo.iter().map(|&lit| !lit).collect();
            formula.add_clause(&clause);
        }
    } else {
        encode_sequential_counter_at_most_k_to_formula(formula, solver, vars, k);
    }
}

/// Encodes an "at least k" constraint into the CNF formula.
fn encode_at_least_k_to_formula(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    if k == 0 {
        return;
    }
    if k > vars.len() {
        formula.add_clause(&[]);
        return;
    }

    if vars.len() <= 10 {
        for combo in vars.iter().copied().combinations(vars.len() - k + 1) {
            formula.add_clause(&combo);
        }
    } else {
        // At least k of vars is at most n - k of their negations.
        let negated: Vec<Lit> = vars.iter().map(|&lit| !lit).collect();
        encode_sequential_counter_at_most_k_to_formula(formula, solver, &negated, vars.len() - k);
    }
}

/// Sinz sequential counter: `r[i][j]` holds when at least `j + 1` of the
/// first `i + 1` literals are true.
fn encode_sequential_counter_at_most_k_to_formula(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    let n = vars.len();
    if n == 0 || k >= n {
        return;
    }
    if k == 0 {
        for &lit in vars {
            formula.add_clause(&[!lit]);
        }
        return;
    }

    let registers: Vec<Vec<Lit>> = (0..n - 1)
        .map(|_| (0..k).map(|_| solver.new_lit()).collect())
        .collect();

    formula.add_clause(&[!vars[0], registers[0][0]]);
    for j in 1..k {
        formula.add_clause(&[!registers[0][j]]);
    }

    for i in 1..n - 1 {
        formula.add_clause(&[!vars[i], registers[i][0]]);
        formula.add_clause(&[!registers[i - 1][0], registers[i][0]]);
        for j in 1..k {
            formula.add_clause(&[!vars[i], !registers[i - 1][j - 1], registers[i][j]]);
            formula.add_clause(&[!registers[i - 1][j], registers[i][j]]);
        }
        formula.add_clause(&[!vars[i], !registers[i - 1][k - 1]]);
    }

    formula.add_clause(&[!vars[n - 1], !registers[n - 2][k - 1]]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::knowledge::KnowledgeBase;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn c(row: usize, col: usize) -> Cell {
        Cell::new(row, col)
    }

    #[test]
    fn test_symmetric_pair_is_undetermined() {
        let constraints = [Constraint::new([c(0, 0), c(0, 1)], 1)];
        let analysis = analyze(&constraints).unwrap();

        assert_eq!(analysis.deductions[&c(0, 0)], DeducedState::Undetermined);
        assert_eq!(analysis.deductions[&c(0, 1)], DeducedState::Undetermined);

        let mines = analysis.sample_assignment.values().filter(|&&m| m).count();
        assert_eq!(mines, 1);
    }

    #[test]
    fn test_overlap_without_subset() {
        // {a,b,c}=2 and {b,c,d}=1: b and c hold at most one mine, so a is a
        // mine and d is safe. Neither set contains the other.
        let constraints = [
            Constraint::new([c(0, 0), c(0, 1), c(0, 2)], 2),
            Constraint::new([c(0, 1), c(0, 2), c(0, 3)], 1),
        ];
        let analysis = analyze(&constraints).unwrap();

        assert_eq!(analysis.forced_mines(), BTreeSet::from([c(0, 0)]));
        assert_eq!(analysis.forced_safes(), BTreeSet::from([c(0, 3)]));
        assert_eq!(analysis.deductions[&c(0, 1)], DeducedState::Undetermined);

        // The engine cannot see this on its own
        let mut kb = KnowledgeBase::new(1, 4);
        for constraint in &constraints {
            kb.add_constraint(constraint).unwrap();
        }
        assert!(kb.safes().is_empty());
        assert!(kb.mines().is_empty());
    }

    #[test]
    fn test_contradiction_is_reported() {
        let constraints = [
            Constraint::new([c(0, 0), c(0, 1)], 2),
            Constraint::new([c(0, 0)], 0),
        ];
        let err = analyze(&constraints).err().unwrap();
        assert_eq!(err.to_string(), "unsatisfiable");
    }

    #[test]
    fn test_large_constraint_uses_sequential_counter() {
        // Twelve cells in a row, three mines, with the first nine safe
        let row: Vec<Cell> = (0..12).map(|col| c(0, col)).collect();
        let constraints = [
            Constraint::new(row.clone(), 3),
            Constraint::new(row[..9].iter().copied(), 0),
        ];
        let analysis = analyze(&constraints).unwrap();

        assert_eq!(
            analysis.forced_mines(),
            row[9..].iter().copied().collect::<BTreeSet<_>>()
        );
        assert_eq!(
            analysis.forced_safes(),
            row[..9].iter().copied().collect::<BTreeSet<_>>()
        );

        let mines = analysis.sample_assignment.values().filter(|&&m| m).count();
        assert_eq!(mines, 3);
    }

    #[test]
    fn test_large_constraint_counts_exactly() {
        let row: Vec<Cell> = (0..11).map(|col| c(0, col)).collect();
        let constraints = [Constraint::new(row.clone(), 4)];
        let analysis = analyze(&constraints).unwrap();

        let mines = analysis.sample_assignment.values().filter(|&&m| m).count();
        assert_eq!(mines, 4);
        assert!(
            analysis
                .deductions
                .values()
                .all(|&s| s == DeducedState::Undetermined)
        );
    }

    #[test]
    fn test_engine_deductions_are_entailed() {
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let board = Board::new(8, 8, 10, &mut rng);
            let mut kb = KnowledgeBase::new(8, 8);
            let mut observations = Vec::new();

            while let Some(cell) = kb
                .make_safe_move()
                .or_else(|| kb.make_random_move(&mut rng))
            {
                if board.is_mine(cell) {
                    break;
                }
                let count = board.nearby_mines(cell);
                kb.add_knowledge(cell, count).unwrap();
                observations.push(Constraint::new([cell], 0));
                observations.push(Constraint::new(cell.neighbors(8, 8), count));
            }

            let analysis = analyze(&observations).unwrap();
            for safe in kb.safes() {
                assert_eq!(analysis.deductions[safe], DeducedState::ForcedSafe);
            }
            for mine in kb.mines() {
                assert_eq!(analysis.deductions[mine], DeducedState::ForcedMine);
            }
        }
    }
}
