mod error;
mod pivot;
mod problem;
mod simplex;
mod solution;
mod tableau;

pub use error::SolveError;
pub use pivot::{Pivot, PivotEngine, PivotOutcome, PivotRun, Snapshot, Termination};
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, Sense};
pub use simplex::{IterationObserver, Method, NoopObserver, Penalty, Solver};
pub use solution::{Extracted, Phase, PhaseHistory, Solution, SolutionStatus, VariableValue, extract};
pub use tableau::{Basis, OBJECTIVE_ROW, ObjectiveRow, PenaltyObjective, Tableau, VarKind, Variable};
