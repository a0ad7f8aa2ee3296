use std::fmt;

use log::{info, warn};

use crate::error::SolveError;
use crate::pivot::{PivotEngine, Snapshot, Termination};
use crate::problem::LpProblem;
use crate::solution::{Phase, PhaseHistory, Solution, extract};
use crate::tableau::{Basis, ObjectiveRow, Tableau};

/// Scale applied to the problem magnitude when choosing M automatically.
const PENALTY_SCALE: f64 = 1e6;
/// A fixed M must be at least this many times the problem magnitude.
const PENALTY_DOMINANCE: f64 = 100.0;

/// Solution method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Method {
    /// Textbook simplex; every row must be `<=` after normalization
    Simplex,
    /// Artificial variables penalized in the objective
    BigM,
    /// Feasibility phase followed by optimization phase
    TwoPhase,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Method::Simplex => write!(f, "Simplex"),
            Method::BigM => write!(f, "Big-M"),
            Method::TwoPhase => write!(f, "Two-Phase"),
        }
    }
}

/// Choice of the Big-M penalty constant
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Penalty {
    /// Scaled from the largest magnitude in the problem
    #[default]
    Auto,
    /// Caller-supplied constant, checked against the problem magnitude
    Fixed(f64),
}

impl Penalty {
    /// The penalty constant to use for `problem`.
    pub fn resolve(self, problem: &LpProblem) -> Result<f64, SolveError> {
        let magnitude = problem.magnitude().max(1.0);
        match self {
            Penalty::Auto => Ok(PENALTY_SCALE * magnitude),
            Penalty::Fixed(m) if m.is_finite() && m >= PENALTY_DOMINANCE * magnitude => Ok(m),
            Penalty::Fixed(m) => Err(SolveError::PenaltyTooSmall {
                penalty: m,
                magnitude: problem.magnitude(),
            }),
        }
    }
}

/// Receives every tableau as the solver produces it.
pub trait IterationObserver {
    fn on_snapshot(&mut self, _phase: Phase, _index: usize, _snapshot: &Snapshot) {}

    fn on_phase_end(&mut self, _phase: Phase, _termination: Termination) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl IterationObserver for NoopObserver {}

/// Simplex solver for linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Tolerance for floating point comparisons in pivot selection
    tolerance: f64,
    /// Largest artificial value still considered zero
    feasibility_tolerance: f64,
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Penalty used by [`Method::BigM`] through [`Solver::solve`]
    penalty: Penalty,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            feasibility_tolerance: 1e-5,
            max_iterations: 10_000,
            penalty: Penalty::Auto,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_feasibility_tolerance(mut self, tol: f64) -> Self {
        self.feasibility_tolerance = tol;
        self
    }

    pub fn with_penalty(mut self, penalty: Penalty) -> Self {
        self.penalty = penalty;
        self
    }

    /// Solve the LP problem with `method`
    pub fn solve(&self, problem: &LpProblem, method: Method) -> Result<Solution, SolveError> {
        self.solve_with(problem, method, &mut NoopObserver)
    }

    /// Solve the LP problem with `method`, reporting every tableau to `observer`
    pub fn solve_with(
        &self,
        problem: &LpProblem,
        method: Method,
        observer: &mut dyn IterationObserver,
    ) -> Result<Solution, SolveError> {
        match method {
            Method::Simplex => self.simplex(problem, observer),
            Method::BigM => self.big_m(problem, self.penalty, observer),
            Method::TwoPhase => self.two_phase(problem, observer),
        }
    }

    pub fn solve_simplex(&self, problem: &LpProblem) -> Result<Solution, SolveError> {
        self.simplex(problem, &mut NoopObserver)
    }

    pub fn solve_big_m(&self, problem: &LpProblem, penalty: Penalty) -> Result<Solution, SolveError> {
        self.big_m(problem, penalty, &mut NoopObserver)
    }

    pub fn solve_two_phase(&self, problem: &LpProblem) -> Result<Solution, SolveError> {
        self.two_phase(problem, &mut NoopObserver)
    }

    fn engine(&self) -> PivotEngine {
        PivotEngine::new(self.tolerance, self.max_iterations)
    }

    fn simplex(&self, problem: &LpProblem, observer: &mut dyn IterationObserver) -> Result<Solution, SolveError> {
        problem.validate()?;
        if let Some(i) = problem
            .constraints
            .iter()
            .position(|c| c.normalized().op.needs_artificial())
        {
            return Err(SolveError::ArtificialsRequired(problem.constraint_label(i)));
        }

        let (tableau, basis) = Tableau::build(problem, ObjectiveRow::Real)?;
        let mut phases = Vec::new();
        let (tableau, basis, termination) =
            self.run_phase(self.engine(), Phase::Simplex, tableau, basis, observer, &mut phases)?;

        Ok(conclude(Method::Simplex, problem, &tableau, &basis, termination, phases))
    }

    fn big_m(
        &self,
        problem: &LpProblem,
        penalty: Penalty,
        observer: &mut dyn IterationObserver,
    ) -> Result<Solution, SolveError> {
        problem.validate()?;
        let m = penalty.resolve(problem)?;
        info!("Big-M penalty M = {}", m);

        let (tableau, basis) = Tableau::build(problem, ObjectiveRow::BigM(m))?;
        let mut phases = Vec::new();
        let (tableau, basis, termination) =
            self.run_phase(self.engine(), Phase::BigM, tableau, basis, observer, &mut phases)?;

        if termination == Termination::Optimal && basis.has_positive_artificial(&tableau, self.feasibility_tolerance) {
            info!("artificial variable basic at a positive value: infeasible");
            return Ok(Solution::infeasible(Method::BigM, problem.objective.sense, phases));
        }

        Ok(conclude(Method::BigM, problem, &tableau, &basis, termination, phases))
    }

    fn two_phase(&self, problem: &LpProblem, observer: &mut dyn IterationObserver) -> Result<Solution, SolveError> {
        problem.validate()?;
        let mut phases = Vec::new();

        let (tableau, basis) = if problem.needs_artificials() {
            let (tableau, basis) = Tableau::build(problem, ObjectiveRow::PhaseOne)?;
            let (mut tableau, mut basis, termination) =
                self.run_phase(self.engine(), Phase::PhaseOne, tableau, basis, observer, &mut phases)?;

            if termination == Termination::Unbounded {
                return Err(SolveError::UnboundedPhaseOne);
            }
            if tableau.objective_value().abs() > self.feasibility_tolerance {
                info!(
                    "phase 1 optimum {} is not zero: infeasible",
                    -tableau.objective_value()
                );
                return Ok(Solution::infeasible(Method::TwoPhase, problem.objective.sense, phases));
            }

            self.drive_out_artificials(&mut tableau, &mut basis);
            tableau.drop_artificials(&mut basis);
            tableau.set_objective_row(tableau.real_objective_row(problem));
            tableau.canonicalize(&basis);
            (tableau, basis)
        } else {
            Tableau::build(problem, ObjectiveRow::Real)?
        };

        let (tableau, basis, termination) =
            self.run_phase(self.engine(), Phase::PhaseTwo, tableau, basis, observer, &mut phases)?;

        Ok(conclude(Method::TwoPhase, problem, &tableau, &basis, termination, phases))
    }

    /// Removes artificials left basic at zero after phase 1.
    ///
    /// Each is swapped for a non-artificial column with a non-zero entry in its
    /// row, a positive one if available. A row without one is a redundant
    /// constraint and is dropped.
    fn drive_out_artificials(&self, tableau: &mut Tableau, basis: &mut Basis) {
        for row in basis.artificial_rows(tableau).into_iter().rev() {
            let name = tableau.variable(basis.column(row)).name.clone();
            let eligible: Vec<usize> = (0..tableau.rhs_col())
                .filter(|&j| !tableau.variable(j).is_artificial() && tableau.get(row, j).abs() > self.tolerance)
                .collect();
            let col = eligible
                .iter()
                .copied()
                .find(|&j| tableau.get(row, j) > 0.0)
                .or_else(|| eligible.first().copied());

            match col {
                Some(col) => {
                    // the artificial sits within the feasibility tolerance of zero
                    tableau.set_rhs(row, 0.0);
                    warn!(
                        "degenerate artificial {} replaced by {} in row {}",
                        name,
                        tableau.variable(col).name,
                        row
                    );
                    tableau.pivot(row, col);
                    basis.set(row, col);
                }
                None => {
                    warn!("row {} is redundant, dropping it with artificial {}", row, name);
                    tableau.remove_row(basis, row);
                }
            }
        }
    }

    fn run_phase(
        &self,
        engine: PivotEngine,
        phase: Phase,
        tableau: Tableau,
        basis: Basis,
        observer: &mut dyn IterationObserver,
        phases: &mut Vec<PhaseHistory>,
    ) -> Result<(Tableau, Basis, Termination), SolveError> {
        let run = engine.solve(tableau, basis)?;
        info!("{} finished {:?} after {} pivots", phase, run.termination, run.pivots());

        for (i, snapshot) in run.history.iter().enumerate() {
            observer.on_snapshot(phase, i, snapshot);
        }
        observer.on_phase_end(phase, run.termination);

        phases.push(PhaseHistory {
            phase,
            termination: run.termination,
            snapshots: run.history,
        });
        Ok((run.tableau, run.basis, run.termination))
    }
}

fn conclude(
    method: Method,
    problem: &LpProblem,
    tableau: &Tableau,
    basis: &Basis,
    termination: Termination,
    phases: Vec<PhaseHistory>,
) -> Solution {
    let sense = problem.objective.sense;
    match termination {
        Termination::Optimal => Solution::optimal(method, extract(tableau, basis, sense), phases),
        Termination::Unbounded => Solution::unbounded(method, sense, phases),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ConstraintOp, Sense};
    use crate::solution::SolutionStatus;

    fn vars(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("x{}", i)).collect()
    }

    fn assert_close(actual: f64, expected: f64, what: &str) {
        assert!((actual - expected).abs() < 1e-4, "{} = {} (expected {})", what, actual, expected);
    }

    fn textbook() -> LpProblem {
        let mut problem = LpProblem::new(vars(2));
        problem.set_objective(vec![3.0, 5.0], Sense::Maximize);
        problem.add_constraint("c1", vec![1.0, 0.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("c2", vec![0.0, 2.0], ConstraintOp::Le, 12.0);
        problem.add_constraint("c3", vec![3.0, 2.0], ConstraintOp::Le, 18.0);
        problem
    }

    fn mixed() -> LpProblem {
        let mut problem = LpProblem::new(vars(2));
        problem.set_objective(vec![2.0, 3.0], Sense::Minimize);
        problem.add_constraint("c1", vec![0.5, 0.25], ConstraintOp::Le, 4.0);
        problem.add_constraint("c2", vec![1.0, 3.0], ConstraintOp::Ge, 20.0);
        problem.add_constraint("c3", vec![1.0, 1.0], ConstraintOp::Eq, 10.0);
        problem
    }

    fn infeasible() -> LpProblem {
        let mut problem = LpProblem::new(vars(2));
        problem.set_objective(vec![1.0, 1.0], Sense::Maximize);
        problem.add_constraint("c1", vec![1.0, 0.0], ConstraintOp::Ge, 5.0);
        problem.add_constraint("c2", vec![0.0, 1.0], ConstraintOp::Ge, 5.0);
        problem.add_constraint("c3", vec![1.0, 1.0], ConstraintOp::Le, 5.0);
        problem
    }

    fn unbounded() -> LpProblem {
        let mut problem = LpProblem::new(vars(2));
        problem.set_objective(vec![1.0, 1.0], Sense::Maximize);
        problem.add_constraint("c1", vec![1.0, 0.0], ConstraintOp::Ge, 0.0);
        problem
    }

    fn all_methods(problem: &LpProblem) -> Vec<Solution> {
        let solver = Solver::new();
        vec![
            solver.solve(problem, Method::BigM).unwrap(),
            solver.solve(problem, Method::TwoPhase).unwrap(),
        ]
    }

    #[test]
    fn test_textbook_maximization() {
        let solver = Solver::new();
        for method in [Method::Simplex, Method::BigM, Method::TwoPhase] {
            let solution = solver.solve(&textbook(), method).unwrap();
            assert_eq!(solution.status, SolutionStatus::Optimal, "{}", method);
            assert_close(solution.values[0], 2.0, "x1");
            assert_close(solution.values[1], 6.0, "x2");
            assert_close(solution.objective_value, 36.0, "obj");
        }
    }

    #[test]
    fn test_mixed_constraints_both_methods() {
        for solution in all_methods(&mixed()) {
            println!("{}: {:?} {:?} {}", solution.method, solution.status, solution.values, solution.objective_value);
            assert_eq!(solution.status, SolutionStatus::Optimal);
            assert_close(solution.values[0], 5.0, "x1");
            assert_close(solution.values[1], 5.0, "x2");
            assert_close(solution.objective_value, 25.0, "obj");

            let s1 = solution.auxiliary.iter().find(|v| v.name == "s1").unwrap();
            assert_close(s1.value, 0.25, "s1");
        }
    }

    #[test]
    fn test_two_phase_history() {
        let solution = Solver::new().solve_two_phase(&mixed()).unwrap();
        assert_eq!(solution.phases.len(), 2);
        assert_eq!(solution.phases[0].phase, Phase::PhaseOne);
        assert_eq!(solution.phases[1].phase, Phase::PhaseTwo);
        assert_eq!(solution.phases[0].snapshots.len(), 3);
        assert_eq!(solution.phases[0].snapshots[0].entering(), Some("x2"));
        assert_eq!(solution.phases[0].snapshots[0].leaving(), Some("a2"));
        assert_eq!(solution.phases[0].snapshots[1].entering(), Some("x1"));
        assert_eq!(solution.phases[0].snapshots[1].leaving(), Some("a3"));

        // phase 2 starts without artificial columns and is already optimal
        let start = &solution.phases[1].snapshots[0];
        assert!(!start.tableau.has_artificials());
        assert_eq!(start.basis_names(), vec!["s1", "x2", "x1"]);
        assert_eq!(solution.phases[1].snapshots.len(), 1);
        assert_eq!(solution.iterations(), 2);
    }

    #[test]
    fn test_infeasible_problem() {
        for solution in all_methods(&infeasible()) {
            assert_eq!(solution.status, SolutionStatus::Infeasible, "{}", solution.method);
            assert!(solution.values.is_empty());
        }
        let two_phase = Solver::new().solve_two_phase(&infeasible()).unwrap();
        assert_eq!(two_phase.phases.len(), 1, "phase 2 must not run");
    }

    #[test]
    fn test_unbounded_problem() {
        for solution in all_methods(&unbounded()) {
            assert_eq!(solution.status, SolutionStatus::Unbounded, "{}", solution.method);
            assert_eq!(solution.objective_value, f64::INFINITY);
        }
    }

    #[test]
    fn test_negative_rhs_matches_normalized() {
        let mut raw = LpProblem::new(vars(2));
        raw.set_objective(vec![1.0, 2.0], Sense::Minimize);
        raw.add_constraint("", vec![-1.0, -1.0], ConstraintOp::Le, -10.0);

        let mut normalized = LpProblem::new(vars(2));
        normalized.set_objective(vec![1.0, 2.0], Sense::Minimize);
        normalized.add_constraint("", vec![1.0, 1.0], ConstraintOp::Ge, 10.0);

        let solver = Solver::new();
        for method in [Method::BigM, Method::TwoPhase] {
            let a = solver.solve(&raw, method).unwrap();
            let b = solver.solve(&normalized, method).unwrap();
            assert!(a.agrees_with(&b, 1e-9));
            assert_close(a.values[0], 10.0, "x1");
            assert_close(a.values[1], 0.0, "x2");
            assert_close(a.objective_value, 10.0, "obj");
        }
    }

    #[test]
    fn test_sense_symmetry() {
        let mut negated = mixed();
        negated.set_objective(vec![-2.0, -3.0], Sense::Maximize);

        let solver = Solver::new();
        for method in [Method::BigM, Method::TwoPhase] {
            let min = solver.solve(&mixed(), method).unwrap();
            let max = solver.solve(&negated, method).unwrap();
            assert_close(min.objective_value, -max.objective_value, "obj");
            assert_close(min.values[0], max.values[0], "x1");
            assert_close(min.values[1], max.values[1], "x2");
        }
    }

    #[test]
    fn test_methods_agree_on_larger_problem() {
        // Min 4x1 + x2 + 3x3
        //   3x1 + x2 + x3 = 3
        //   4x1 + 3x2 + 2x3 >= 6
        //   x1 + 2x2 + x3 <= 4
        let mut problem = LpProblem::new(vars(3));
        problem.set_objective(vec![4.0, 1.0, 3.0], Sense::Minimize);
        problem.add_constraint("", vec![3.0, 1.0, 1.0], ConstraintOp::Eq, 3.0);
        problem.add_constraint("", vec![4.0, 3.0, 2.0], ConstraintOp::Ge, 6.0);
        problem.add_constraint("", vec![1.0, 2.0, 1.0], ConstraintOp::Le, 4.0);

        let solutions = all_methods(&problem);
        assert!(solutions[0].is_optimal());
        assert!(solutions[0].agrees_with(&solutions[1], 1e-4));
        for v in &solutions[0].values {
            assert!(*v >= -1e-9);
        }
        assert_close(solutions[0].objective_value, 3.4, "obj");
    }

    #[test]
    fn test_redundant_equality_is_dropped() {
        // x1 + x2 = 4 stated twice
        let mut problem = LpProblem::new(vars(2));
        problem.set_objective(vec![1.0, 2.0], Sense::Maximize);
        problem.add_constraint("", vec![1.0, 1.0], ConstraintOp::Eq, 4.0);
        problem.add_constraint("", vec![1.0, 1.0], ConstraintOp::Eq, 4.0);

        let solution = Solver::new().solve_two_phase(&problem).unwrap();
        assert!(solution.is_optimal());
        assert_close(solution.values[1], 4.0, "x2");
        assert_close(solution.objective_value, 8.0, "obj");
        let phase_two = &solution.phases[1].snapshots[0];
        assert_eq!(phase_two.tableau.num_constraints(), 1);

        let big_m = Solver::new().solve_big_m(&problem, Penalty::Auto).unwrap();
        assert!(big_m.agrees_with(&solution, 1e-4));
    }

    fn assert_methods_agree(problem: &LpProblem, values: &[f64], objective: f64) {
        let solutions = all_methods(problem);
        for solution in &solutions {
            assert_eq!(solution.status, SolutionStatus::Optimal, "{} status", solution.method);
            for (i, (&actual, &expected)) in solution.values.iter().zip(values).enumerate() {
                assert_close(actual, expected, &format!("{} x{}", solution.method, i + 1));
            }
            assert_close(solution.objective_value, objective, &format!("{} obj", solution.method));
        }
        assert!(solutions[0].agrees_with(&solutions[1], 1e-4));
    }

    #[test]
    fn test_big_m_keeps_small_costs_beside_large_rhs() {
        // Max 0.004x1, x1 <= 5000
        let mut problem = LpProblem::new(vars(1));
        problem.set_objective(vec![0.004], Sense::Maximize);
        problem.add_constraint("", vec![1.0], ConstraintOp::Le, 5000.0);
        assert_methods_agree(&problem, &[5000.0], 20.0);
    }

    #[test]
    fn test_big_m_ratio_test_with_large_penalty() {
        // Max x1, 0.5x1 <= 1e6, x1 >= 1
        let mut problem = LpProblem::new(vars(1));
        problem.set_objective(vec![1.0], Sense::Maximize);
        problem.add_constraint("", vec![0.5], ConstraintOp::Le, 1e6);
        problem.add_constraint("", vec![1.0], ConstraintOp::Ge, 1.0);
        assert_methods_agree(&problem, &[2e6], 2e6);
    }

    #[test]
    fn test_methods_agree_on_small_costs_and_large_demand() {
        // Min 0.001x1 + 0.002x2, x1 + x2 >= 100000, x1 <= 60000
        let mut problem = LpProblem::new(vars(2));
        problem.set_objective(vec![0.001, 0.002], Sense::Minimize);
        problem.add_constraint("", vec![1.0, 1.0], ConstraintOp::Ge, 1e5);
        problem.add_constraint("", vec![1.0, 0.0], ConstraintOp::Le, 6e4);
        assert_methods_agree(&problem, &[6e4, 4e4], 140.0);
    }

    #[test]
    fn test_drive_out_keeps_rhs_non_negative() {
        // -x1 + x2 = 0, with the artificial left slightly above zero
        let mut problem = LpProblem::new(vars(2));
        problem.set_objective(vec![1.0, 1.0], Sense::Minimize);
        problem.add_constraint("", vec![-1.0, 1.0], ConstraintOp::Eq, 0.0);
        let (mut tableau, mut basis) = Tableau::build(&problem, ObjectiveRow::PhaseOne).unwrap();
        tableau.set_rhs(1, 1e-7);

        let solver = Solver::new();
        solver.drive_out_artificials(&mut tableau, &mut basis);
        assert_eq!(basis.names(&tableau), vec!["x2"]);
        assert_eq!(tableau.rhs(1), 0.0);

        // only a negative entry to pivot on
        let mut problem = LpProblem::new(vars(2));
        problem.set_objective(vec![1.0, 1.0], Sense::Minimize);
        problem.add_constraint("", vec![-1.0, 0.0], ConstraintOp::Eq, 0.0);
        let (mut tableau, mut basis) = Tableau::build(&problem, ObjectiveRow::PhaseOne).unwrap();
        tableau.set_rhs(1, 1e-7);

        solver.drive_out_artificials(&mut tableau, &mut basis);
        assert_eq!(basis.names(&tableau), vec!["x1"]);
        assert!(tableau.rhs(1) >= 0.0);
    }

    #[test]
    fn test_simplex_rejects_artificial_rows() {
        let err = Solver::new().solve_simplex(&mixed()).unwrap_err();
        assert_eq!(err, SolveError::ArtificialsRequired("c2".to_string()));
    }

    #[test]
    fn test_malformed_input_is_reported_before_pivoting() {
        let mut problem = mixed();
        problem.add_constraint("c4", vec![1.0, 2.0, 3.0], ConstraintOp::Le, 1.0);
        for method in [Method::Simplex, Method::BigM, Method::TwoPhase] {
            let err = Solver::new().solve(&problem, method).unwrap_err();
            assert!(err.is_malformed_input(), "{}: {}", method, err);
        }
    }

    #[test]
    fn test_penalty_validation() {
        let problem = mixed();
        assert_eq!(Penalty::Auto.resolve(&problem), Ok(2e7));
        assert_eq!(Penalty::Fixed(1e4).resolve(&problem), Ok(1e4));
        assert_eq!(
            Penalty::Fixed(50.0).resolve(&problem),
            Err(SolveError::PenaltyTooSmall {
                penalty: 50.0,
                magnitude: 20.0
            })
        );
        assert!(Penalty::Fixed(f64::INFINITY).resolve(&problem).is_err());

        let solution = Solver::new().solve_big_m(&problem, Penalty::Fixed(1e4)).unwrap();
        assert_close(solution.objective_value, 25.0, "obj");
    }

    #[test]
    fn test_observer_sees_every_snapshot() {
        #[derive(Default)]
        struct Recorder {
            seen: Vec<(Phase, usize)>,
            ended: Vec<(Phase, Termination)>,
        }

        impl IterationObserver for Recorder {
            fn on_snapshot(&mut self, phase: Phase, index: usize, _snapshot: &Snapshot) {
                self.seen.push((phase, index));
            }

            fn on_phase_end(&mut self, phase: Phase, termination: Termination) {
                self.ended.push((phase, termination));
            }
        }

        let mut recorder = Recorder::default();
        let solution = Solver::new()
            .solve_with(&mixed(), Method::TwoPhase, &mut recorder)
            .unwrap();

        let total: usize = solution.phases.iter().map(|p| p.snapshots.len()).sum();
        assert_eq!(recorder.seen.len(), total);
        assert_eq!(recorder.seen[0], (Phase::PhaseOne, 0));
        assert_eq!(
            recorder.ended,
            vec![(Phase::PhaseOne, Termination::Optimal), (Phase::PhaseTwo, Termination::Optimal)]
        );
    }

    #[test]
    fn test_basis_invariant_in_recorded_history() {
        for solution in all_methods(&mixed()) {
            for phase in &solution.phases {
                for snapshot in &phase.snapshots {
                    assert!(snapshot.tableau.is_canonical(&snapshot.basis, true, 1e-9));
                }
            }
        }
    }
}
