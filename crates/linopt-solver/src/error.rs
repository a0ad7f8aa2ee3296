use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Problem declares no decision variables")]
    NoVariables,
    #[error("Objective has {found} coefficients but the problem declares {expected} variables")]
    ObjectiveDimension { expected: usize, found: usize },
    #[error("Constraint '{name}' has {found} coefficients but the problem declares {expected} variables")]
    ConstraintDimension {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Non-finite value in {0}")]
    NonFinite(String),
    #[error("Constraint '{0}' needs an artificial variable; use the Big-M or two-phase method")]
    ArtificialsRequired(String),
    #[error("Penalty {penalty} does not dominate the problem magnitude {magnitude}")]
    PenaltyTooSmall { penalty: f64, magnitude: f64 },
    #[error("Phase 1 auxiliary problem reported unbounded")]
    UnboundedPhaseOne,
    #[error("Iteration limit of {0} pivots reached")]
    IterationLimit(usize),
}

impl SolveError {
    /// Whether the error stems from the shape or content of the input problem.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            SolveError::NoVariables
                | SolveError::ObjectiveDimension { .. }
                | SolveError::ConstraintDimension { .. }
                | SolveError::NonFinite(_)
        )
    }
}
