//! Transport Module
//!
//! Discrete optimal transport (earth mover's / Wasserstein distance) between
//! two label distributions. The transportation problem is stated as a linear
//! program over the `n²` entries of the plan, with `n` row-sum and `n`
//! column-sum constraints. Two solvers are available: the transportation
//! simplex in `transportation` (default), which works on the `2n - 1` basic
//! cells of the plan directly, and the general dense simplex in `simplex`.
//!
//! Solver failures are returned as errors, never as a zero cost, so callers
//! looping over many label pairs can skip the failing ones.
//!
//! This module contains the types: `TransportPlan`, `TransportOptions`, `TransportSolver`
//!
use log::debug;
use thiserror::Error;

use crate::transport::simplex::LinearProgram;
use crate::transport::simplex::LpError;

pub mod simplex;
mod transportation;

/// accepted deviation of a distribution's total mass from 1
const MASS_TOLERANCE: f64 = 1e-6;
/// consecutive degenerate pivots before the solvers fall back to Bland's rule
pub(crate) const DEGENERATE_RUN_LIMIT: usize = 50;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("cost entry ({row}, {col}) is negative or not finite")]
    InvalidCost { row: usize, col: usize },
    #[error("distribution {name} is not a probability vector (mass {sum})")]
    InvalidDistribution { name: &'static str, sum: f64 },
    #[error("transport problem is infeasible")]
    Infeasible,
    #[error("transport problem is unbounded")]
    Unbounded,
    #[error("solver did not converge within {0} iterations")]
    NotConverged(usize),
}

/// Which algorithm solves the transportation problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportSolver {
    /// transportation simplex (MODI) from a north-west corner basis
    #[default]
    Transportation,
    /// general two-phase dense simplex over all `n²` variables
    DenseSimplex,
}

/// Solver settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportOptions {
    /// cap on simplex pivots
    pub max_iterations: usize,
    /// values below this magnitude count as zero
    pub tolerance: f64,
    pub solver: TransportSolver,
}

/// An optimal plan: `plan[i][j]` is the mass moved from label `i` of `P`
/// to label `j` of `Q`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportPlan {
    plan: Vec<Vec<f64>>,
    cost: f64,
    iterations: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        TransportOptions {
            max_iterations: 50_000,
            tolerance: 1e-9,
            solver: TransportSolver::default(),
        }
    }
}

impl From<LpError> for TransportError {
    fn from(error: LpError) -> Self {
        match error {
            LpError::DimensionMismatch { expected, found } => TransportError::DimensionMismatch { expected, found },
            LpError::Infeasible => TransportError::Infeasible,
            LpError::Unbounded => TransportError::Unbounded,
            LpError::IterationLimit(n) => TransportError::NotConverged(n),
        }
    }
}

// --------------------------- PUBLIC
/// Minimal cost of moving distribution `p` onto `q` under `cost`.
/// # Arguments
/// * `p` - source distribution, non-negative, summing to 1
/// * `q` - target distribution, same length as `p`
/// * `cost` - `n×n` non-negative cost matrix, e.g. restricted cophenetic distances
/// * `options` - solver settings
pub fn wasserstein(
    p: &[f64],
    q: &[f64],
    cost: &[Vec<f64>],
    options: &TransportOptions,
) -> Result<TransportPlan, TransportError> {
    let n = p.len();
    check_inputs(p, q, cost)?;
    let result = match options.solver {
        TransportSolver::Transportation => {
            let solution = transportation::solve(p, q, cost, options.max_iterations, options.tolerance)?;
            TransportPlan {
                plan: solution.flow,
                cost: solution.cost,
                iterations: solution.iterations,
            }
        }
        TransportSolver::DenseSimplex => dense_simplex(p, q, cost, options)?,
    };
    debug!(
        "transport over {n} labels ({:?}): cost {} after {} pivots",
        options.solver, result.cost, result.iterations
    );
    Ok(result)
}

// --------------------------- helpers
fn dense_simplex(
    p: &[f64],
    q: &[f64],
    cost: &[Vec<f64>],
    options: &TransportOptions,
) -> Result<TransportPlan, TransportError> {
    let n = p.len();
    //variable i*n + j is the mass moved from i to j
    let costs: Vec<f64> = cost.iter().flatten().copied().collect();
    let mut lp = LinearProgram::new(costs);
    for i in 0..n {
        let mut row = vec![0.0; n * n];
        row[i * n..(i + 1) * n].fill(1.0);
        lp.add_equality(row, p[i])?;
    }
    for j in 0..n {
        let mut col = vec![0.0; n * n];
        for i in 0..n {
            col[i * n + j] = 1.0;
        }
        lp.add_equality(col, q[j])?;
    }
    let solution = lp.solve(options.max_iterations, options.tolerance)?;
    Ok(TransportPlan {
        plan: solution.values.chunks(n).map(<[f64]>::to_vec).collect(),
        cost: solution.objective,
        iterations: solution.iterations,
    })
}
fn check_inputs(p: &[f64], q: &[f64], cost: &[Vec<f64>]) -> Result<(), TransportError> {
    let n = p.len();
    if q.len() != n {
        return Err(TransportError::DimensionMismatch { expected: n, found: q.len() });
    }
    if cost.len() != n {
        return Err(TransportError::DimensionMismatch { expected: n, found: cost.len() });
    }
    for (i, row) in cost.iter().enumerate() {
        if row.len() != n {
            return Err(TransportError::DimensionMismatch { expected: n, found: row.len() });
        }
        if let Some(j) = row.iter().position(|c| !c.is_finite() || *c < 0.0) {
            return Err(TransportError::InvalidCost { row: i, col: j });
        }
    }
    check_distribution("p", p)?;
    check_distribution("q", q)
}
fn check_distribution(name: &'static str, values: &[f64]) -> Result<(), TransportError> {
    let sum: f64 = values.iter().sum();
    let valid_entries = values.iter().all(|v| v.is_finite() && *v >= 0.0);
    if !valid_entries || !sum.is_finite() || (sum - 1.0).abs() > MASS_TOLERANCE {
        return Err(TransportError::InvalidDistribution { name, sum });
    }
    Ok(())
}

//   ------------------------------- TRANSPORT PLAN Implementation
impl TransportPlan {
    pub fn plan(&self) -> &[Vec<f64>] {
        &self.plan
    }
    /// the transport cost, i.e. the Wasserstein distance
    pub fn cost(&self) -> f64 {
        self.cost
    }
    pub fn iterations(&self) -> usize {
        self.iterations
    }
    pub fn row_sums(&self) -> Vec<f64> {
        self.plan.iter().map(|row| row.iter().sum()).collect()
    }
    pub fn col_sums(&self) -> Vec<f64> {
        let n = self.plan.len();
        (0..n)
            .map(|j| self.plan.iter().map(|row| row[j]).sum())
            .collect()
    }
}
