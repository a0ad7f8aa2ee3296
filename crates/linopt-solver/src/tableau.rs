use std::fmt;

use crate::error::SolveError;
use crate::problem::{ConstraintOp, LpProblem};

/// Row index of the objective (Z) row.
pub const OBJECTIVE_ROW: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VarKind {
    Decision,
    Slack,
    Surplus,
    Artificial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
}

impl Variable {
    fn new(name: impl Into<String>, kind: VarKind) -> Self {
        Self { name: name.into(), kind }
    }

    pub fn is_artificial(&self) -> bool {
        self.kind == VarKind::Artificial
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// How the objective row of a freshly built tableau is seeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectiveRow {
    /// The user's objective only. Canonical only when no artificial starts basic.
    Real,
    /// The user's objective plus a penalty of `M` per artificial variable.
    BigM(f64),
    /// Minimize the sum of the artificial variables.
    PhaseOne,
}

/// A Big-M objective row kept as `real + m * penalty`.
///
/// Both parts are pivoted alongside the tableau, so reduced costs can be
/// compared on the penalty part first without the real part drowning in
/// rounding noise of order `m`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PenaltyObjective {
    m: f64,
    real: Vec<f64>,
    penalty: Vec<f64>,
}

impl PenaltyObjective {
    pub fn m(&self) -> f64 {
        self.m
    }

    /// Objective row without the penalty term.
    pub fn real(&self) -> &[f64] {
        &self.real
    }

    /// Coefficient of `m` in each column.
    pub fn penalty(&self) -> &[f64] {
        &self.penalty
    }

    /// Reduced cost of column `col` if entering it improves the objective.
    ///
    /// A penalty part below `-tolerance` always improves; a penalty part
    /// within `tolerance` of zero defers to the real part.
    pub fn improving_cost(&self, col: usize, tolerance: f64) -> Option<f64> {
        let (real, penalty) = (self.real[col], self.penalty[col]);
        if penalty < -tolerance {
            Some(real + self.m * penalty)
        } else if penalty.abs() <= tolerance && real < -tolerance {
            Some(real)
        } else {
            None
        }
    }

    fn combined(&self) -> Vec<f64> {
        self.real.iter().zip(&self.penalty).map(|(r, p)| r + self.m * p).collect()
    }

    fn eliminate(&mut self, col: usize, pivot_row: &[f64]) {
        for part in [&mut self.real, &mut self.penalty] {
            let factor = part[col];
            if factor == 0.0 {
                continue;
            }
            for (v, p) in part.iter_mut().zip(pivot_row) {
                *v -= factor * p;
            }
            part[col] = 0.0;
        }
    }
}

/// Augmented simplex matrix.
///
/// Row 0 is the objective row, rows `1..=m` are the constraints. The last
/// column holds the right-hand side. Columns are laid out as decision
/// variables, slacks, surpluses, then artificials.
///
/// A Big-M tableau also carries its objective split into real and penalty
/// parts; row 0 is then their combination.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tableau {
    data: Vec<Vec<f64>>,
    variables: Vec<Variable>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    penalty: Option<PenaltyObjective>,
}

/// Which column is basic in each constraint row.
///
/// Keyed by tableau row, so the first constraint row is row 1.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Basis {
    columns: Vec<usize>,
}

impl Tableau {
    /// Builds the initial tableau and basis for `problem`.
    pub fn build(problem: &LpProblem, objective: ObjectiveRow) -> Result<(Tableau, Basis), SolveError> {
        problem.validate()?;

        let constraints = problem.normalized_constraints();
        let n_vars = problem.num_variables();
        let n_rows = constraints.len();

        let n_slack = constraints.iter().filter(|c| c.op == ConstraintOp::Le).count();
        let n_surplus = constraints.iter().filter(|c| c.op == ConstraintOp::Ge).count();
        let n_artificial = constraints.iter().filter(|c| c.op.needs_artificial()).count();

        let mut variables: Vec<Variable> = problem
            .variables
            .iter()
            .map(|name| Variable::new(name.clone(), VarKind::Decision))
            .collect();
        variables.reserve(n_slack + n_surplus + n_artificial);

        let mut slack_idx = n_vars;
        let mut surplus_idx = n_vars + n_slack;
        let mut artificial_idx = n_vars + n_slack + n_surplus;
        let total_cols = artificial_idx + n_artificial + 1;
        let rhs_col = total_cols - 1;

        let mut data = vec![vec![0.0; total_cols]; n_rows + 1];
        let mut basis = Vec::with_capacity(n_rows);
        let mut slack_vars = Vec::with_capacity(n_slack);
        let mut surplus_vars = Vec::with_capacity(n_surplus);
        let mut artificial_vars = Vec::with_capacity(n_artificial);

        for (i, c) in constraints.iter().enumerate() {
            let row = &mut data[i + 1];
            row[..n_vars].copy_from_slice(&c.coefficients);
            row[rhs_col] = c.rhs;

            let k = i + 1;
            match c.op {
                ConstraintOp::Le => {
                    row[slack_idx] = 1.0;
                    basis.push(slack_idx);
                    slack_vars.push(Variable::new(format!("s{}", k), VarKind::Slack));
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    row[surplus_idx] = -1.0;
                    surplus_vars.push(Variable::new(format!("e{}", k), VarKind::Surplus));
                    surplus_idx += 1;

                    row[artificial_idx] = 1.0;
                    basis.push(artificial_idx);
                    artificial_vars.push(Variable::new(format!("a{}", k), VarKind::Artificial));
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    row[artificial_idx] = 1.0;
                    basis.push(artificial_idx);
                    artificial_vars.push(Variable::new(format!("a{}", k), VarKind::Artificial));
                    artificial_idx += 1;
                }
            }
        }

        variables.extend(slack_vars);
        variables.extend(surplus_vars);
        variables.extend(artificial_vars);

        let mut tableau = Tableau {
            data,
            variables,
            penalty: None,
        };
        let basis = Basis { columns: basis };

        let mut per_artificial = vec![0.0; total_cols];
        for col in tableau.artificial_columns() {
            per_artificial[col] = 1.0;
        }

        match objective {
            ObjectiveRow::Real => tableau.data[OBJECTIVE_ROW] = tableau.real_objective_row(problem),
            ObjectiveRow::BigM(m) => {
                tableau.penalty = Some(PenaltyObjective {
                    m,
                    real: tableau.real_objective_row(problem),
                    penalty: per_artificial,
                });
            }
            ObjectiveRow::PhaseOne => tableau.data[OBJECTIVE_ROW] = per_artificial,
        }
        tableau.canonicalize(&basis);

        Ok((tableau, basis))
    }

    /// Number of rows, objective row included.
    pub fn num_rows(&self) -> usize {
        self.data.len()
    }

    /// Number of columns, RHS included.
    pub fn num_cols(&self) -> usize {
        self.variables.len() + 1
    }

    pub fn num_constraints(&self) -> usize {
        self.data.len() - 1
    }

    pub fn rhs_col(&self) -> usize {
        self.variables.len()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, col: usize) -> &Variable {
        &self.variables[col]
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row][col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.data
    }

    pub fn objective_row(&self) -> &[f64] {
        &self.data[OBJECTIVE_ROW]
    }

    /// Split form of a Big-M objective row.
    pub fn penalty_objective(&self) -> Option<&PenaltyObjective> {
        self.penalty.as_ref()
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.data[row][self.rhs_col()]
    }

    /// Current value of the internal (maximization) objective.
    ///
    /// For a Big-M tableau this excludes the penalty term.
    pub fn objective_value(&self) -> f64 {
        match &self.penalty {
            Some(p) => p.real[self.rhs_col()],
            None => self.rhs(OBJECTIVE_ROW),
        }
    }

    pub(crate) fn set_rhs(&mut self, row: usize, value: f64) {
        let rhs_col = self.rhs_col();
        self.data[row][rhs_col] = value;
    }

    pub fn columns_of_kind(&self, kind: VarKind) -> impl Iterator<Item = usize> + '_ {
        self.variables
            .iter()
            .enumerate()
            .filter(move |(_, v)| v.kind == kind)
            .map(|(j, _)| j)
    }

    pub fn artificial_columns(&self) -> Vec<usize> {
        self.columns_of_kind(VarKind::Artificial).collect()
    }

    pub fn has_artificials(&self) -> bool {
        self.variables.iter().any(Variable::is_artificial)
    }

    /// The user's objective in maximization form, `Z - c.x = 0`, over this column layout.
    pub fn real_objective_row(&self, problem: &LpProblem) -> Vec<f64> {
        let mut row = vec![0.0; self.num_cols()];
        let decision = self.columns_of_kind(VarKind::Decision);
        for (c, col) in problem.max_coefficients().into_iter().zip(decision) {
            row[col] = -c;
        }
        row
    }

    /// Replaces the objective row, discarding any penalty split.
    pub(crate) fn set_objective_row(&mut self, row: Vec<f64>) {
        debug_assert_eq!(row.len(), self.num_cols());
        self.data[OBJECTIVE_ROW] = row;
        self.penalty = None;
    }

    /// Eliminates every basic column from the objective row.
    ///
    /// For each constraint row whose basic column has a non-zero objective
    /// coefficient `c`, subtracts `c x row` from the objective row.
    pub(crate) fn canonicalize(&mut self, basis: &Basis) {
        let (z, rest) = self.data.split_at_mut(1);
        for (row, col) in basis.entries() {
            let constraint = &rest[row - 1];
            match self.penalty.as_mut() {
                Some(p) => p.eliminate(col, constraint),
                None => {
                    let factor = z[0][col];
                    if factor == 0.0 {
                        continue;
                    }
                    for (z_val, val) in z[0].iter_mut().zip(constraint) {
                        *z_val -= factor * val;
                    }
                    z[0][col] = 0.0;
                }
            }
        }
        if let Some(p) = &self.penalty {
            z[0] = p.combined();
        }
    }

    /// Gauss-Jordan step around `(row, col)`.
    ///
    /// The pivot row is scaled so the pivot element becomes 1, then the pivot
    /// column is eliminated from every other row, objective row included.
    pub(crate) fn pivot(&mut self, row: usize, col: usize) {
        assert!(row != OBJECTIVE_ROW && row < self.num_rows(), "pivot row out of range");
        assert!(col < self.rhs_col(), "pivot column out of range");

        let pivot_val = self.data[row][col];
        assert!(pivot_val != 0.0, "zero pivot element at row {} col {}", row, col);
        for v in self.data[row].iter_mut() {
            *v /= pivot_val;
        }
        self.data[row][col] = 1.0;

        let pivot_row = self.data[row].clone();
        for (i, r) in self.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = r[col];
            if factor == 0.0 {
                continue;
            }
            for (v, p) in r.iter_mut().zip(&pivot_row) {
                *v -= factor * p;
            }
            r[col] = 0.0;
        }

        if let Some(p) = self.penalty.as_mut() {
            p.eliminate(col, &pivot_row);
            self.data[OBJECTIVE_ROW] = p.combined();
        }
    }

    /// Removes constraint row `row` from the tableau and the basis.
    pub(crate) fn remove_row(&mut self, basis: &mut Basis, row: usize) {
        assert!(row != OBJECTIVE_ROW, "cannot remove the objective row");
        self.data.remove(row);
        basis.columns.remove(row - 1);
    }

    /// Removes all artificial columns and remaps the basis.
    ///
    /// Every artificial must already be non-basic.
    pub(crate) fn drop_artificials(&mut self, basis: &mut Basis) {
        let keep: Vec<bool> = self
            .variables
            .iter()
            .map(|v| !v.is_artificial())
            .chain(std::iter::once(true))
            .collect();

        let mut new_index = vec![None; keep.len()];
        let mut next = 0;
        for (j, &k) in keep.iter().enumerate() {
            if k {
                new_index[j] = Some(next);
                next += 1;
            }
        }

        let split = self.penalty.iter_mut().flat_map(|p| [&mut p.real, &mut p.penalty]);
        for r in self.data.iter_mut().chain(split) {
            let mut j = 0;
            r.retain(|_| {
                let k = keep[j];
                j += 1;
                k
            });
        }
        self.variables.retain(|v| !v.is_artificial());

        for col in basis.columns.iter_mut() {
            debug_assert!(new_index[*col].is_some(), "artificial column still basic");
            if let Some(c) = new_index[*col] {
                *col = c;
            }
        }
    }

    /// Checks that each basic column is a unit column in the constraint rows and,
    /// when `include_objective` is set, zero in the objective row.
    pub fn is_canonical(&self, basis: &Basis, include_objective: bool, tolerance: f64) -> bool {
        basis.entries().all(|(row, col)| {
            self.data.iter().enumerate().all(|(i, r)| {
                let expected = if i == row { 1.0 } else { 0.0 };
                (i == OBJECTIVE_ROW && !include_objective) || (r[col] - expected).abs() <= tolerance
            })
        })
    }
}

impl Basis {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// Basic column of tableau row `row` (1-based constraint row).
    pub fn column(&self, row: usize) -> usize {
        self.columns[row - 1]
    }

    pub(crate) fn set(&mut self, row: usize, col: usize) {
        self.columns[row - 1] = col;
    }

    /// `(tableau row, basic column)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.columns.iter().enumerate().map(|(i, &col)| (i + 1, col))
    }

    /// Tableau row in which `col` is basic, if any.
    pub fn row_of(&self, col: usize) -> Option<usize> {
        self.columns.iter().position(|&c| c == col).map(|i| i + 1)
    }

    pub fn names(&self, tableau: &Tableau) -> Vec<String> {
        self.columns.iter().map(|&c| tableau.variable(c).name.clone()).collect()
    }

    /// Rows whose basic variable is artificial.
    pub fn artificial_rows(&self, tableau: &Tableau) -> Vec<usize> {
        self.entries()
            .filter(|&(_, col)| tableau.variable(col).is_artificial())
            .map(|(row, _)| row)
            .collect()
    }

    /// Whether some artificial variable is basic at a value above `tolerance`.
    pub fn has_positive_artificial(&self, tableau: &Tableau, tolerance: f64) -> bool {
        self.artificial_rows(tableau).into_iter().any(|row| tableau.rhs(row) > tolerance)
    }

    /// Value of the variable in column `col`: its row's RHS if basic, 0 otherwise.
    pub fn value_of(&self, tableau: &Tableau, col: usize) -> f64 {
        self.row_of(col).map(|row| tableau.rhs(row)).unwrap_or(0.0)
    }
}
