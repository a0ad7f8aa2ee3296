use std::fmt;

use crate::error::SolveError;

/// Represents a linear programming problem
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LpProblem {
    /// Decision variable names
    pub variables: Vec<String>,
    /// Objective function
    pub objective: Objective,
    /// Constraints
    #[cfg_attr(feature = "serde", serde(default))]
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to maximize or minimize
    pub sense: Sense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Sense {
    Maximize,
    Minimize,
}

impl Sense {
    /// Factor turning a coefficient of this sense into its maximization form.
    pub fn factor(self) -> f64 {
        match self {
            Sense::Maximize => 1.0,
            Sense::Minimize => -1.0,
        }
    }
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Sense::Maximize => write!(f, "Max"),
            Sense::Minimize => write!(f, "Min"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    Le,
    /// Greater than or equal (>=)
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    Ge,
    /// Equal (=)
    #[cfg_attr(feature = "serde", serde(rename = "="))]
    Eq,
}

impl ConstraintOp {
    /// The operator obtained by multiplying both sides by -1.
    pub fn flipped(self) -> Self {
        match self {
            ConstraintOp::Le => ConstraintOp::Ge,
            ConstraintOp::Ge => ConstraintOp::Le,
            ConstraintOp::Eq => ConstraintOp::Eq,
        }
    }

    /// Whether a row of this kind starts with an artificial basic variable.
    pub fn needs_artificial(self) -> bool {
        !matches!(self, ConstraintOp::Le)
    }
}

impl fmt::Display for ConstraintOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConstraintOp::Le => write!(f, "\u{2264}"),
            ConstraintOp::Ge => write!(f, "\u{2265}"),
            ConstraintOp::Eq => write!(f, "="),
        }
    }
}

impl Constraint {
    /// Returns the constraint with a non-negative right-hand side.
    ///
    /// A negative RHS multiplies the whole row by -1, flipping the operator.
    pub fn normalized(&self) -> Constraint {
        if self.rhs >= 0.0 {
            return self.clone();
        }
        Constraint {
            name: self.name.clone(),
            coefficients: self.coefficients.iter().map(|c| -c).collect(),
            op: self.op.flipped(),
            rhs: -self.rhs,
        }
    }
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                sense: Sense::Maximize,
            },
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, sense: Sense) {
        self.objective = Objective { coefficients, sense };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Display label of the constraint at `index`, falling back to its 1-based position.
    pub fn constraint_label(&self, index: usize) -> String {
        match self.constraints.get(index) {
            Some(c) if !c.name.is_empty() => c.name.clone(),
            _ => format!("#{}", index + 1),
        }
    }

    /// Checks dimensions and finiteness of every number in the problem.
    pub fn validate(&self) -> Result<(), SolveError> {
        let n = self.num_variables();
        if n == 0 {
            return Err(SolveError::NoVariables);
        }
        if self.objective.coefficients.len() != n {
            return Err(SolveError::ObjectiveDimension {
                expected: n,
                found: self.objective.coefficients.len(),
            });
        }
        if self.objective.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(SolveError::NonFinite("objective".to_string()));
        }

        for (i, c) in self.constraints.iter().enumerate() {
            if c.coefficients.len() != n {
                return Err(SolveError::ConstraintDimension {
                    name: self.constraint_label(i),
                    expected: n,
                    found: c.coefficients.len(),
                });
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|v| !v.is_finite()) {
                return Err(SolveError::NonFinite(format!("constraint {}", self.constraint_label(i))));
            }
        }
        Ok(())
    }

    /// Constraints with their right-hand sides made non-negative.
    pub fn normalized_constraints(&self) -> Vec<Constraint> {
        self.constraints.iter().map(Constraint::normalized).collect()
    }

    /// Whether any normalized row is `>=` or `=`.
    pub fn needs_artificials(&self) -> bool {
        self.constraints.iter().any(|c| c.normalized().op.needs_artificial())
    }

    /// Largest absolute value among the objective, constraint coefficients and RHS values.
    pub fn magnitude(&self) -> f64 {
        let objective = self.objective.coefficients.iter();
        let rows = self
            .constraints
            .iter()
            .flat_map(|c| c.coefficients.iter().chain(std::iter::once(&c.rhs)));
        objective
            .chain(rows)
            .filter(|v| v.is_finite())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Objective coefficients in the internal maximization form.
    pub fn max_coefficients(&self) -> Vec<f64> {
        let factor = self.objective.sense.factor();
        self.objective.coefficients.iter().map(|c| factor * c).collect()
    }
}

impl fmt::Display for LpProblem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let expr = |coefficients: &[f64]| -> String {
            let terms: Vec<String> = coefficients
                .iter()
                .zip(&self.variables)
                .filter(|(c, _)| **c != 0.0)
                .enumerate()
                .map(|(k, (c, name))| match (k, *c < 0.0) {
                    (0, true) => format!("-{}{}", c.abs(), name),
                    (0, false) => format!("{}{}", c, name),
                    (_, true) => format!(" - {}{}", c.abs(), name),
                    (_, false) => format!(" + {}{}", c, name),
                })
                .collect();
            if terms.is_empty() { "0".to_string() } else { terms.concat() }
        };

        writeln!(f, "{} Z = {}", self.objective.sense, expr(&self.objective.coefficients))?;
        writeln!(f, "subject to:")?;
        for c in &self.constraints {
            writeln!(f, "  {} {} {}", expr(&c.coefficients), c.op, c.rhs)?;
        }
        write!(f, "  {} \u{2265} 0", self.variables.join(", "))
    }
}
