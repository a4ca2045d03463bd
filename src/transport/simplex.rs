//! Simplex Submodule (of Transport)
//!
//! A dense two-phase simplex for linear programs in equality form:
//!
//!   minimize `c·x` subject to `A x = b`, `x ≥ 0`
//!
//! Phase 1 finds a feasible basis by minimizing the sum of one artificial
//! variable per row. Artificials still basic afterwards are pivoted out, or
//! their row is dropped as redundant (linearly dependent). Phase 2 then
//! optimizes the real objective over the original columns only.
//! Both phases let the most negative reduced cost enter. After a run of
//! degenerate pivots they switch to Bland's rule, which cannot cycle, until
//! a pivot changes the objective again.
//!
//! This module contains the types: `LinearProgram`, `LpSolution`
//!
use log::debug;
use thiserror::Error;

use crate::transport::DEGENERATE_RUN_LIMIT;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LpError {
    #[error("constraint has {found} coefficients, the program has {expected} variables")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("no point satisfies all constraints")]
    Infeasible,
    #[error("objective is unbounded below")]
    Unbounded,
    #[error("no optimum after {0} pivots")]
    IterationLimit(usize),
}

/// minimize `costs·x` subject to the equality rows, `x ≥ 0`
#[derive(Debug, Clone)]
pub struct LinearProgram {
    costs: Vec<f64>,
    rows: Vec<(Vec<f64>, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    pub values: Vec<f64>,
    pub objective: f64,
    /// pivots over both phases
    pub iterations: usize,
}

/// Working state: `m` rows of width `n + m + 1` (originals, artificials, rhs)
/// and a reduced-cost row whose last entry is minus the objective value.
struct Tableau {
    rows: Vec<Vec<f64>>,
    objective: Vec<f64>,
    basis: Vec<usize>,
    n_original: usize,
    iterations: usize,
}

//   ------------------------------- LINEAR PROGRAM Implementation
impl LinearProgram {
    /// # Arguments
    /// * `costs` - objective coefficients, one per variable
    pub fn new(costs: Vec<f64>) -> Self {
        LinearProgram { costs, rows: vec![] }
    }
    pub fn n_variables(&self) -> usize {
        self.costs.len()
    }
    pub fn n_constraints(&self) -> usize {
        self.rows.len()
    }
    /// Adds the constraint `coefficients·x = rhs`.
    pub fn add_equality(&mut self, coefficients: Vec<f64>, rhs: f64) -> Result<(), LpError> {
        if coefficients.len() != self.costs.len() {
            return Err(LpError::DimensionMismatch {
                expected: self.costs.len(),
                found: coefficients.len(),
            });
        }
        self.rows.push((coefficients, rhs));
        Ok(())
    }
    /// Solves the program.
    /// # Arguments
    /// * `max_iterations` - cap on pivots, summed over both phases
    /// * `tolerance` - values below this magnitude count as zero
    pub fn solve(&self, max_iterations: usize, tolerance: f64) -> Result<LpSolution, LpError> {
        let n = self.n_variables();
        let mut tableau = Tableau::new(self);
        //------------------------phase 1
        tableau.phase_one_objective();
        tableau.optimize(n + self.n_constraints(), max_iterations, tolerance)?;
        let scale = self
            .rows
            .iter()
            .map(|(_, rhs)| rhs.abs())
            .sum::<f64>()
            .max(1.0);
        let residual = tableau.artificial_mass();
        if residual > tolerance * scale {
            debug!("phase 1 left residual {residual}, problem infeasible");
            return Err(LpError::Infeasible);
        }
        let dropped = tableau.drive_out_artificials(tolerance);
        debug!(
            "phase 1 done after {} pivots, {} redundant rows dropped",
            tableau.iterations, dropped
        );
        //------------------------phase 2
        tableau.phase_two_objective(&self.costs);
        tableau.optimize(n, max_iterations, tolerance)?;
        let values = tableau.values();
        let objective: f64 = values.iter().zip(&self.costs).map(|(x, c)| x * c).sum();
        debug!(
            "simplex optimum {objective} after {} pivots",
            tableau.iterations
        );
        Ok(LpSolution {
            values,
            objective,
            iterations: tableau.iterations,
        })
    }
}

//   ------------------------------- TABLEAU Implementation
impl Tableau {
    fn new(lp: &LinearProgram) -> Self {
        let n = lp.n_variables();
        let m = lp.n_constraints();
        let width = n + m + 1;
        let mut rows = Vec::with_capacity(m);
        for (i, (coefficients, rhs)) in lp.rows.iter().enumerate() {
            //artificials need a non-negative start, flip rows with negative rhs
            let sign = if *rhs < 0.0 { -1.0 } else { 1.0 };
            let mut row = vec![0.0; width];
            for (j, a) in coefficients.iter().enumerate() {
                row[j] = sign * a;
            }
            row[n + i] = 1.0;
            row[width - 1] = sign * rhs;
            rows.push(row);
        }
        Tableau {
            rows,
            objective: vec![0.0; width],
            basis: (n..n + m).collect(),
            n_original: n,
            iterations: 0,
        }
    }
    fn width(&self) -> usize {
        self.objective.len()
    }
    fn rhs(&self, row: usize) -> f64 {
        self.rows[row][self.width() - 1]
    }
    /// minimize the sum of artificials; they start basic with cost 1
    fn phase_one_objective(&mut self) {
        let width = self.width();
        let n = self.n_original;
        let mut objective = vec![0.0; width];
        for j in n..width - 1 {
            objective[j] = 1.0;
        }
        for row in &self.rows {
            for j in 0..width {
                objective[j] -= row[j];
            }
        }
        self.objective = objective;
    }
    fn phase_two_objective(&mut self, costs: &[f64]) {
        let width = self.width();
        let mut objective = vec![0.0; width];
        objective[..costs.len()].copy_from_slice(costs);
        for (row, &basic) in self.rows.iter().zip(&self.basis) {
            let c = costs.get(basic).copied().unwrap_or(0.0);
            if c == 0.0 {
                continue;
            }
            for j in 0..width {
                objective[j] -= c * row[j];
            }
        }
        self.objective = objective;
    }
    /// runs pivots until no column below `allowed` improves the objective
    fn optimize(&mut self, allowed: usize, max_iterations: usize, tolerance: f64) -> Result<(), LpError> {
        let mut degenerate_run = 0;
        loop {
            let bland = degenerate_run >= DEGENERATE_RUN_LIMIT;
            let Some(col) = self.entering_column(allowed, tolerance, bland) else {
                return Ok(());
            };
            if self.iterations >= max_iterations {
                return Err(LpError::IterationLimit(self.iterations));
            }
            let (row, ratio) = self.leaving_row(col, tolerance).ok_or(LpError::Unbounded)?;
            self.pivot(row, col);
            self.iterations += 1;
            if ratio <= tolerance {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }
        }
    }
    /// Dantzig: most negative reduced cost; Bland: lowest improving column
    fn entering_column(&self, allowed: usize, tolerance: f64, bland: bool) -> Option<usize> {
        let mut improving = (0..allowed).filter(|&j| self.objective[j] < -tolerance);
        if bland {
            return improving.next();
        }
        improving.min_by(|&a, &b| self.objective[a].total_cmp(&self.objective[b]))
    }
    /// minimum ratio test, ties broken by the lowest basic variable
    fn leaving_row(&self, col: usize, tolerance: f64) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, row) in self.rows.iter().enumerate() {
            if row[col] <= tolerance {
                continue;
            }
            let ratio = (self.rhs(i) / row[col]).max(0.0);
            best = match best {
                None => Some((i, ratio)),
                Some((b, best_ratio)) => {
                    if ratio < best_ratio - tolerance
                        || (ratio <= best_ratio + tolerance && self.basis[i] < self.basis[b])
                    {
                        Some((i, ratio))
                    } else {
                        Some((b, best_ratio))
                    }
                }
            };
        }
        best
    }
    fn pivot(&mut self, row: usize, col: usize) {
        let width = self.width();
        let p = self.rows[row][col];
        for j in 0..width {
            self.rows[row][j] /= p;
        }
        let pivot_row = self.rows[row].clone();
        for (i, other) in self.rows.iter_mut().enumerate() {
            let factor = other[col];
            if i == row || factor == 0.0 {
                continue;
            }
            for j in 0..width {
                other[j] -= factor * pivot_row[j];
            }
        }
        let factor = self.objective[col];
        if factor != 0.0 {
            for j in 0..width {
                self.objective[j] -= factor * pivot_row[j];
            }
        }
        self.basis[row] = col;
    }
    fn artificial_mass(&self) -> f64 {
        (0..self.rows.len())
            .filter(|&i| self.basis[i] >= self.n_original)
            .map(|i| self.rhs(i).abs())
            .sum()
    }
    /// Pivots remaining (zero-valued) artificials out of the basis and drops
    /// rows where that is impossible. Returns the number of dropped rows.
    fn drive_out_artificials(&mut self, tolerance: f64) -> usize {
        let mut dropped = 0;
        let mut i = 0;
        while i < self.rows.len() {
            if self.basis[i] < self.n_original {
                i += 1;
                continue;
            }
            let entering = (0..self.n_original).find(|&j| self.rows[i][j].abs() > tolerance);
            match entering {
                Some(col) => {
                    self.pivot(i, col);
                    i += 1;
                }
                None => {
                    //row is a combination of the others
                    self.rows.remove(i);
                    self.basis.remove(i);
                    dropped += 1;
                }
            }
        }
        dropped
    }
    fn values(&self) -> Vec<f64> {
        let mut values = vec![0.0; self.n_original];
        for (i, &basic) in self.basis.iter().enumerate() {
            if basic < self.n_original {
                values[basic] = self.rhs(i).max(0.0);
            }
        }
        values
    }
}
