use log::{debug, trace};

use crate::error::SolveError;
use crate::tableau::{Basis, OBJECTIVE_ROW, Tableau};

/// A pivot position in tableau coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pivot {
    /// Leaving row (tableau row, 1-based among constraints)
    pub row: usize,
    /// Entering column
    pub col: usize,
}

/// Result of a single engine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotOutcome {
    /// A pivot was applied
    Pivoted(Pivot),
    /// No improving column remains
    Optimal,
    /// The entering column has no eligible leaving row
    Unbounded { column: usize },
}

/// How an engine run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Termination {
    Optimal,
    Unbounded,
}

/// Copy of the tableau state before a pivot decision is applied.
///
/// The last snapshot of a run holds the terminal state and no pivot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub tableau: Tableau,
    pub basis: Basis,
    pub pivot: Option<Pivot>,
}

impl Snapshot {
    /// Name of the basic variable in each constraint row.
    pub fn basis_names(&self) -> Vec<String> {
        self.basis.names(&self.tableau)
    }

    pub fn entering(&self) -> Option<&str> {
        self.pivot.map(|p| self.tableau.variable(p.col).name.as_str())
    }

    pub fn leaving(&self) -> Option<&str> {
        self.pivot.map(|p| self.tableau.variable(self.basis.column(p.row)).name.as_str())
    }
}

/// Outcome of [`PivotEngine::solve`].
#[derive(Debug, Clone)]
pub struct PivotRun {
    pub tableau: Tableau,
    pub basis: Basis,
    pub termination: Termination,
    pub history: Vec<Snapshot>,
}

impl PivotRun {
    pub fn pivots(&self) -> usize {
        self.history.iter().filter(|s| s.pivot.is_some()).count()
    }
}

/// Primal simplex pivoting with lowest-index tie breaking.
#[derive(Debug, Clone, Copy)]
pub struct PivotEngine {
    tolerance: f64,
    max_iterations: usize,
}

impl Default for PivotEngine {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: 10_000,
        }
    }
}

impl PivotEngine {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Column with the most negative objective coefficient among non-artificial
    /// variables; the first one scanned wins ties.
    ///
    /// A Big-M row is tested on its penalty part first, then on its real part.
    pub fn entering_column(&self, tableau: &Tableau) -> Option<usize> {
        let z = tableau.objective_row();
        let split = tableau.penalty_objective();
        let mut min_val = f64::INFINITY;
        let mut min_col = None;

        for j in 0..tableau.rhs_col() {
            if tableau.variable(j).is_artificial() {
                continue;
            }
            let cost = match split {
                Some(p) => p.improving_cost(j, self.tolerance),
                None => Some(z[j]).filter(|&c| c < -self.tolerance),
            };
            if let Some(c) = cost.filter(|&c| c < min_val) {
                min_val = c;
                min_col = Some(j);
            }
        }

        min_col
    }

    /// Minimum-ratio row for `col` among rows with a strictly positive entry;
    /// the lowest row wins ties.
    pub fn leaving_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.rhs_col();
        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for i in 1..tableau.num_rows() {
            let val = tableau.get(i, col);
            if val > self.tolerance {
                let ratio = tableau.get(i, rhs_col) / val;
                if ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    /// Selects the next pivot without applying it.
    pub fn select(&self, tableau: &Tableau) -> PivotOutcome {
        let Some(col) = self.entering_column(tableau) else {
            return PivotOutcome::Optimal;
        };
        let Some(row) = self.leaving_row(tableau, col) else {
            return PivotOutcome::Unbounded { column: col };
        };
        PivotOutcome::Pivoted(Pivot { row, col })
    }

    /// Performs one iteration: selection, elimination and basis update.
    pub fn step(&self, tableau: &mut Tableau, basis: &mut Basis) -> PivotOutcome {
        let outcome = self.select(tableau);
        if let PivotOutcome::Pivoted(p) = outcome {
            apply(tableau, basis, p);
        }
        outcome
    }

    /// Pivots until the tableau is optimal or unbounded, recording every state.
    pub fn solve(&self, mut tableau: Tableau, mut basis: Basis) -> Result<PivotRun, SolveError> {
        let mut history = Vec::new();

        for _ in 0..=self.max_iterations {
            let outcome = self.select(&tableau);
            let pivot = match outcome {
                PivotOutcome::Pivoted(p) => Some(p),
                _ => None,
            };
            history.push(Snapshot {
                tableau: tableau.clone(),
                basis: basis.clone(),
                pivot,
            });

            match outcome {
                PivotOutcome::Pivoted(p) => {
                    if history.len() > self.max_iterations {
                        break;
                    }
                    apply(&mut tableau, &mut basis, p);
                }
                PivotOutcome::Optimal => {
                    debug!("optimal after {} pivots, z = {}", history.len() - 1, tableau.objective_value());
                    return Ok(PivotRun {
                        tableau,
                        basis,
                        termination: Termination::Optimal,
                        history,
                    });
                }
                PivotOutcome::Unbounded { column } => {
                    debug!(
                        "unbounded along {} after {} pivots",
                        tableau.variable(column).name,
                        history.len() - 1
                    );
                    return Ok(PivotRun {
                        tableau,
                        basis,
                        termination: Termination::Unbounded,
                        history,
                    });
                }
            }
        }

        Err(SolveError::IterationLimit(self.max_iterations))
    }
}

fn apply(tableau: &mut Tableau, basis: &mut Basis, p: Pivot) {
    debug!(
        "pivot at row {} col {}: {} enters, {} leaves",
        p.row,
        p.col,
        tableau.variable(p.col).name,
        tableau.variable(basis.column(p.row)).name
    );
    tableau.pivot(p.row, p.col);
    basis.set(p.row, p.col);
    trace!("objective row now {:?}", tableau.row(OBJECTIVE_ROW));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ConstraintOp, LpProblem, Sense};
    use crate::tableau::ObjectiveRow;

    fn textbook_problem() -> LpProblem {
        // Max 3x1 + 5x2, x1 <= 4, 2x2 <= 12, 3x1 + 2x2 <= 18
        let mut problem = LpProblem::new(vec!["x1".to_string(), "x2".to_string()]);
        problem.set_objective(vec![3.0, 5.0], Sense::Maximize);
        problem.add_constraint("", vec![1.0, 0.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("", vec![0.0, 2.0], ConstraintOp::Le, 12.0);
        problem.add_constraint("", vec![3.0, 2.0], ConstraintOp::Le, 18.0);
        problem
    }

    #[test]
    fn test_select_first_pivot() {
        let (tableau, _) = Tableau::build(&textbook_problem(), ObjectiveRow::Real).unwrap();
        let engine = PivotEngine::default();
        assert_eq!(engine.entering_column(&tableau), Some(1));
        assert_eq!(engine.leaving_row(&tableau, 1), Some(2));
        assert_eq!(engine.select(&tableau), PivotOutcome::Pivoted(Pivot { row: 2, col: 1 }));
    }

    #[test]
    fn test_solve_textbook_problem() {
        let (tableau, basis) = Tableau::build(&textbook_problem(), ObjectiveRow::Real).unwrap();
        let run = PivotEngine::default().solve(tableau, basis).unwrap();

        assert_eq!(run.termination, Termination::Optimal);
        assert_eq!(run.pivots(), 2);
        assert_eq!(run.history.len(), 3);
        assert!((run.tableau.objective_value() - 36.0).abs() < 1e-9);
        assert!((run.basis.value_of(&run.tableau, 0) - 2.0).abs() < 1e-9);
        assert!((run.basis.value_of(&run.tableau, 1) - 6.0).abs() < 1e-9);

        assert_eq!(run.history[0].entering(), Some("x2"));
        assert_eq!(run.history[0].leaving(), Some("s2"));
        assert_eq!(run.history[1].entering(), Some("x1"));
        assert_eq!(run.history[1].leaving(), Some("s3"));
        assert_eq!(run.history[2].pivot, None);
    }

    #[test]
    fn test_basis_invariant_holds_after_every_pivot() {
        let (mut tableau, mut basis) = Tableau::build(&textbook_problem(), ObjectiveRow::Real).unwrap();
        let engine = PivotEngine::default();
        while let PivotOutcome::Pivoted(_) = engine.step(&mut tableau, &mut basis) {
            assert!(tableau.is_canonical(&basis, true, 1e-9));
        }
    }

    #[test]
    fn test_history_is_not_aliased() {
        let (tableau, basis) = Tableau::build(&textbook_problem(), ObjectiveRow::Real).unwrap();
        let initial = tableau.clone();
        let run = PivotEngine::default().solve(tableau, basis).unwrap();
        assert_eq!(run.history[0].tableau, initial);
        assert_ne!(run.history[0].tableau, run.tableau);
        assert_eq!(run.history.last().unwrap().tableau, run.tableau);
    }

    #[test]
    fn test_unbounded_column() {
        // Max x1 + x2 with only x1 - x2 <= 1
        let mut problem = LpProblem::new(vec!["x1".to_string(), "x2".to_string()]);
        problem.set_objective(vec![1.0, 1.0], Sense::Maximize);
        problem.add_constraint("", vec![1.0, -1.0], ConstraintOp::Le, 1.0);
        let (tableau, basis) = Tableau::build(&problem, ObjectiveRow::Real).unwrap();

        let engine = PivotEngine::default();
        let mut t = tableau.clone();
        let mut b = basis.clone();
        assert!(matches!(engine.step(&mut t, &mut b), PivotOutcome::Pivoted(Pivot { row: 1, col: 0 })));
        assert_eq!(engine.step(&mut t, &mut b), PivotOutcome::Unbounded { column: 1 });

        let run = engine.solve(tableau, basis).unwrap();
        assert_eq!(run.termination, Termination::Unbounded);
        assert_eq!(run.history.last().unwrap().pivot, None);
    }

    #[test]
    fn test_ties_break_on_lowest_index() {
        // Max x1 + x2, x1 + x2 <= 2, x1 + x2 <= 2
        let mut problem = LpProblem::new(vec!["x1".to_string(), "x2".to_string()]);
        problem.set_objective(vec![1.0, 1.0], Sense::Maximize);
        problem.add_constraint("", vec![1.0, 1.0], ConstraintOp::Le, 2.0);
        problem.add_constraint("", vec![1.0, 1.0], ConstraintOp::Le, 2.0);
        let (tableau, _) = Tableau::build(&problem, ObjectiveRow::Real).unwrap();

        let engine = PivotEngine::default();
        assert_eq!(engine.select(&tableau), PivotOutcome::Pivoted(Pivot { row: 1, col: 0 }));
    }

    #[test]
    fn test_artificial_columns_never_enter() {
        let mut problem = LpProblem::new(vec!["x1".to_string()]);
        problem.set_objective(vec![1.0], Sense::Maximize);
        problem.add_constraint("", vec![1.0], ConstraintOp::Eq, 3.0);
        let (mut tableau, basis) = Tableau::build(&problem, ObjectiveRow::Real).unwrap();

        // force a negative reduced cost on the artificial column
        let mut z = tableau.objective_row().to_vec();
        z[0] = 0.0;
        z[1] = -5.0;
        tableau.set_objective_row(z);
        let engine = PivotEngine::default();
        assert_eq!(engine.entering_column(&tableau), None);

        let run = engine.solve(tableau, basis).unwrap();
        assert_eq!(run.termination, Termination::Optimal);
        assert_eq!(run.pivots(), 0);
    }

    #[test]
    fn test_big_m_row_keeps_small_real_costs() {
        // Max 0.004x1, x1 <= 5000: the real reduced cost is tiny next to M
        let mut problem = LpProblem::new(vec!["x1".to_string()]);
        problem.set_objective(vec![0.004], Sense::Maximize);
        problem.add_constraint("", vec![1.0], ConstraintOp::Le, 5000.0);
        let (tableau, basis) = Tableau::build(&problem, ObjectiveRow::BigM(5e9)).unwrap();

        let engine = PivotEngine::default();
        assert_eq!(engine.entering_column(&tableau), Some(0));
        let run = engine.solve(tableau, basis).unwrap();
        assert_eq!(run.termination, Termination::Optimal);
        assert!((run.tableau.objective_value() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_big_m_row_prefers_penalty_part() {
        // Max x1 + 100x2, x1 = 1, x2 <= 1: only x1 reduces the penalty part
        let mut problem = LpProblem::new(vec!["x1".to_string(), "x2".to_string()]);
        problem.set_objective(vec![1.0, 100.0], Sense::Maximize);
        problem.add_constraint("", vec![1.0, 0.0], ConstraintOp::Eq, 1.0);
        problem.add_constraint("", vec![0.0, 1.0], ConstraintOp::Le, 1.0);
        let (tableau, _) = Tableau::build(&problem, ObjectiveRow::BigM(1e12)).unwrap();

        let split = tableau.penalty_objective().unwrap();
        assert_eq!(split.penalty()[0], -1.0);
        assert_eq!(split.penalty()[1], 0.0);
        assert_eq!(PivotEngine::default().entering_column(&tableau), Some(0));
    }

    #[test]
    fn test_iteration_limit() {
        let (tableau, basis) = Tableau::build(&textbook_problem(), ObjectiveRow::Real).unwrap();
        let err = PivotEngine::new(1e-9, 1).solve(tableau, basis).unwrap_err();
        assert_eq!(err, SolveError::IterationLimit(1));
    }
}
