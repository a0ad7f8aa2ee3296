use std::fmt;

use crate::pivot::{Snapshot, Termination};
use crate::problem::Sense;
use crate::simplex::Method;
use crate::tableau::{Basis, Tableau, VarKind};

/// The result of solving an LP problem
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Solution {
    /// Method that produced this solution
    pub method: Method,
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal values for each decision variable
    pub values: Vec<f64>,
    /// Optimal objective value in the problem's own sense
    pub objective_value: f64,
    /// Values of the slack and surplus variables at the optimum
    pub auxiliary: Vec<VariableValue>,
    /// Every tableau visited, grouped by phase
    pub phases: Vec<PhaseHistory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "OPTIMAL"),
            SolutionStatus::Infeasible => write!(f, "INFEASIBLE"),
            SolutionStatus::Unbounded => write!(f, "UNBOUNDED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VariableValue {
    pub name: String,
    pub kind: VarKind,
    pub value: f64,
}

/// Stage of a solve that produced a run of tableaux.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Phase {
    Simplex,
    BigM,
    PhaseOne,
    PhaseTwo,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Phase::Simplex => write!(f, "Simplex"),
            Phase::BigM => write!(f, "Big-M"),
            Phase::PhaseOne => write!(f, "Phase 1"),
            Phase::PhaseTwo => write!(f, "Phase 2"),
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PhaseHistory {
    pub phase: Phase,
    pub termination: Termination,
    pub snapshots: Vec<Snapshot>,
}

/// Values read off a final tableau.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub values: Vec<f64>,
    pub objective_value: f64,
    pub auxiliary: Vec<VariableValue>,
}

/// Reads the decision values, slack/surplus values and objective value off an
/// optimal tableau. Non-basic variables are 0.
pub fn extract(tableau: &Tableau, basis: &Basis, sense: Sense) -> Extracted {
    let mut values = Vec::new();
    let mut auxiliary = Vec::new();

    for (col, var) in tableau.variables().iter().enumerate() {
        let value = basis.value_of(tableau, col);
        match var.kind {
            VarKind::Decision => values.push(value),
            VarKind::Slack | VarKind::Surplus => auxiliary.push(VariableValue {
                name: var.name.clone(),
                kind: var.kind,
                value,
            }),
            VarKind::Artificial => {}
        }
    }

    Extracted {
        values,
        objective_value: sense.factor() * tableau.objective_value(),
        auxiliary,
    }
}

impl Solution {
    pub fn optimal(method: Method, extracted: Extracted, phases: Vec<PhaseHistory>) -> Self {
        Self {
            method,
            status: SolutionStatus::Optimal,
            values: extracted.values,
            objective_value: extracted.objective_value,
            auxiliary: extracted.auxiliary,
            phases,
        }
    }

    pub fn infeasible(method: Method, sense: Sense, phases: Vec<PhaseHistory>) -> Self {
        Self {
            method,
            status: SolutionStatus::Infeasible,
            values: Vec::new(),
            objective_value: -sense.factor() * f64::INFINITY,
            auxiliary: Vec::new(),
            phases,
        }
    }

    pub fn unbounded(method: Method, sense: Sense, phases: Vec<PhaseHistory>) -> Self {
        Self {
            method,
            status: SolutionStatus::Unbounded,
            values: Vec::new(),
            objective_value: sense.factor() * f64::INFINITY,
            auxiliary: Vec::new(),
            phases,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Total number of pivots across all phases.
    pub fn iterations(&self) -> usize {
        self.phases
            .iter()
            .flat_map(|p| p.snapshots.iter())
            .filter(|s| s.pivot.is_some())
            .count()
    }

    /// The final tableau of the last phase, if any phase ran.
    pub fn final_snapshot(&self) -> Option<&Snapshot> {
        self.phases.last().and_then(|p| p.snapshots.last())
    }

    /// Whether two optimal solutions agree on objective value and variable values within `tolerance`.
    pub fn agrees_with(&self, other: &Solution, tolerance: f64) -> bool {
        if self.status != other.status {
            return false;
        }
        if !self.is_optimal() {
            return true;
        }
        (self.objective_value - other.objective_value).abs() <= tolerance
            && self.values.len() == other.values.len()
            && self.values.iter().zip(&other.values).all(|(a, b)| (a - b).abs() <= tolerance)
    }
}
