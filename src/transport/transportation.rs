//! Transportation Submodule (of Transport)
//!
//! The transportation simplex (MODI method). A basis is a spanning tree over
//! the `m` supply and `n` demand nodes with `m + n - 1` basic cells. The
//! north-west corner rule gives a feasible starting tree, so no phase 1 is
//! needed. Each pivot prices the cells with the dual potentials `u + v`, lets
//! the most negative reduced cost enter and shifts mass around the cycle it
//! closes in the tree.
//!
//! Runs of degenerate pivots switch the entering rule to Bland's, which
//! cannot cycle; the first pivot that moves mass switches back.
//!
use std::collections::VecDeque;

use log::debug;

use crate::transport::simplex::LpError;
use crate::transport::DEGENERATE_RUN_LIMIT;

/// optimal flow between supplies and demands
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TransportSolution {
    pub flow: Vec<Vec<f64>>,
    pub cost: f64,
    pub iterations: usize,
}

struct Basis<'a> {
    cost: &'a [Vec<f64>],
    flow: Vec<Vec<f64>>,
    is_basic: Vec<Vec<bool>>,
    /// basic cells (row, col), always m + n - 1 of them
    cells: Vec<(usize, usize)>,
}

// --------------------------- PUBLIC
/// Minimizes `Σ cost[i][j]·flow[i][j]` with row sums `supply` and column sums
/// `demand`. Both must be non-empty, non-negative and of equal mass.
/// # Arguments
/// * `max_iterations` - cap on pivots
/// * `tolerance` - reduced costs above `-tolerance` count as non-negative
pub(crate) fn solve(
    supply: &[f64],
    demand: &[f64],
    cost: &[Vec<f64>],
    max_iterations: usize,
    tolerance: f64,
) -> Result<TransportSolution, LpError> {
    let mut basis = Basis::north_west_corner(supply, demand, cost);
    let mut iterations = 0;
    let mut degenerate_run = 0;
    loop {
        let (u, v) = basis.potentials();
        let bland = degenerate_run >= DEGENERATE_RUN_LIMIT;
        let Some(entering) = basis.entering_cell(&u, &v, tolerance, bland) else {
            break;
        };
        if iterations >= max_iterations {
            return Err(LpError::IterationLimit(iterations));
        }
        let moved = basis.pivot(entering);
        iterations += 1;
        if moved <= tolerance {
            degenerate_run += 1;
        } else {
            degenerate_run = 0;
        }
    }
    let cost = basis.cost();
    debug!(
        "transportation simplex optimum {cost} after {iterations} pivots ({} basic cells)",
        basis.cells.len()
    );
    Ok(TransportSolution {
        flow: basis.flow,
        cost,
        iterations,
    })
}

//   ------------------------------- BASIS Implementation
impl<'a> Basis<'a> {
    /// Staircase from the top left cell: every step exhausts a row or a
    /// column, so the cells form a spanning tree even when allocations are 0.
    fn north_west_corner(supply: &[f64], demand: &[f64], cost: &'a [Vec<f64>]) -> Self {
        let m = supply.len();
        let n = demand.len();
        let mut basis = Basis {
            cost,
            flow: vec![vec![0.0; n]; m],
            is_basic: vec![vec![false; n]; m],
            cells: Vec::with_capacity(m + n - 1),
        };
        let mut supply = supply.to_vec();
        let mut demand = demand.to_vec();
        let (mut i, mut j) = (0, 0);
        loop {
            let x = supply[i].min(demand[j]).max(0.0);
            basis.flow[i][j] = x;
            basis.is_basic[i][j] = true;
            basis.cells.push((i, j));
            supply[i] -= x;
            demand[j] -= x;
            if i == m - 1 && j == n - 1 {
                break;
            }
            if i == m - 1 {
                j += 1;
            } else if j == n - 1 || supply[i] <= demand[j] {
                i += 1;
            } else {
                j += 1;
            }
        }
        basis
    }
    fn m(&self) -> usize {
        self.flow.len()
    }
    fn n(&self) -> usize {
        self.flow.first().map_or(0, Vec::len)
    }
    /// tree adjacency over nodes `0..m` (rows) and `m..m+n` (columns),
    /// each entry the neighbour node
    fn adjacency(&self) -> Vec<Vec<usize>> {
        let m = self.m();
        let mut adjacency = vec![vec![]; m + self.n()];
        for &(i, j) in &self.cells {
            adjacency[i].push(m + j);
            adjacency[m + j].push(i);
        }
        adjacency
    }
    /// dual potentials with `u[0] = 0` and `u[i] + v[j] = cost[i][j]` on basic cells
    fn potentials(&self) -> (Vec<f64>, Vec<f64>) {
        let m = self.m();
        let mut u = vec![0.0; m];
        let mut v = vec![0.0; self.n()];
        let mut seen = vec![false; m + self.n()];
        let adjacency = self.adjacency();
        let mut work_list = vec![0];
        seen[0] = true;
        while let Some(node) = work_list.pop() {
            for &next in &adjacency[node] {
                if seen[next] {
                    continue;
                }
                seen[next] = true;
                if node < m {
                    v[next - m] = self.cost[node][next - m] - u[node];
                } else {
                    u[next] = self.cost[next][node - m] - v[node - m];
                }
                work_list.push(next);
            }
        }
        (u, v)
    }
    /// most negative reduced cost, or the first negative one in row-major order under `bland`
    fn entering_cell(&self, u: &[f64], v: &[f64], tolerance: f64, bland: bool) -> Option<(usize, usize)> {
        let mut best: Option<((usize, usize), f64)> = None;
        for (i, row) in self.cost.iter().enumerate() {
            for (j, c) in row.iter().enumerate() {
                if self.is_basic[i][j] {
                    continue;
                }
                let reduced = c - u[i] - v[j];
                if reduced >= -tolerance {
                    continue;
                }
                if bland {
                    return Some((i, j));
                }
                if best.map_or(true, |(_, b)| reduced < b) {
                    best = Some(((i, j), reduced));
                }
            }
        }
        best.map(|(cell, _)| cell)
    }
    /// basic cells on the tree path from row `i` to column `j`, starting at row `i`
    fn path(&self, i: usize, j: usize) -> Vec<(usize, usize)> {
        let m = self.m();
        let adjacency = self.adjacency();
        let target = m + j;
        let mut previous: Vec<Option<usize>> = vec![None; adjacency.len()];
        let mut queue = VecDeque::from([i]);
        previous[i] = Some(i);
        while let Some(node) = queue.pop_front() {
            if node == target {
                break;
            }
            for &next in &adjacency[node] {
                if previous[next].is_none() {
                    previous[next] = Some(node);
                    queue.push_back(next);
                }
            }
        }
        //walk back from the column to the row
        let mut cells = vec![];
        let mut node = target;
        while node != i {
            let Some(prev) = previous[node] else {
                break;
            };
            cells.push(if prev < m { (prev, node - m) } else { (node, prev - m) });
            node = prev;
        }
        cells.reverse();
        cells
    }
    /// Brings `entering` into the basis. Returns the mass moved around the cycle.
    fn pivot(&mut self, entering: (usize, usize)) -> f64 {
        let (ei, ej) = entering;
        let path = self.path(ei, ej);
        let n = self.n();
        //the cycle is entering(+), path[0](-), path[1](+), ...
        let donors: Vec<(usize, usize)> = path.iter().copied().step_by(2).collect();
        let theta = donors
            .iter()
            .map(|&(i, j)| self.flow[i][j])
            .fold(f64::INFINITY, f64::min);
        //ties leave by lowest cell index
        let leaving = donors
            .iter()
            .copied()
            .filter(|&(i, j)| self.flow[i][j] <= theta)
            .min_by_key(|&(i, j)| i * n + j)
            .unwrap_or(entering);
        self.flow[ei][ej] += theta;
        for (k, &(i, j)) in path.iter().enumerate() {
            let updated = if k % 2 == 0 {
                self.flow[i][j] - theta
            } else {
                self.flow[i][j] + theta
            };
            self.flow[i][j] = updated.max(0.0);
        }
        let (li, lj) = leaving;
        self.flow[li][lj] = 0.0;
        self.is_basic[li][lj] = false;
        self.is_basic[ei][ej] = true;
        if let Some(slot) = self.cells.iter_mut().find(|cell| **cell == leaving) {
            *slot = entering;
        }
        theta
    }
    fn cost(&self) -> f64 {
        self.cells
            .iter()
            .map(|&(i, j)| self.cost[i][j] * self.flow[i][j])
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn north_west_corner_is_spanning() {
        let cost = vec![vec![0.0; 3]; 3];
        let basis = Basis::north_west_corner(&[0.5, 0.5, 0.0], &[0.25, 0.25, 0.5], &cost);
        assert_eq!(basis.cells.len(), 5);
        assert_eq!(basis.cells, vec![(0, 0), (0, 1), (1, 1), (1, 2), (2, 2)]);
        assert!((basis.flow[1][2] - 0.5).abs() < TOL);
    }

    #[test]
    fn pivot_moves_mass_off_the_diagonal() {
        let cost = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let solution = solve(&[0.5, 0.5], &[0.5, 0.5], &cost, 100, TOL).unwrap();
        assert!(solution.cost.abs() < TOL);
        assert_eq!(solution.iterations, 1);
        assert!((solution.flow[0][1] - 0.5).abs() < TOL);
        assert!((solution.flow[1][0] - 0.5).abs() < TOL);
    }

    #[test]
    fn starting_basis_already_optimal() {
        let cost = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let solution = solve(&[0.5, 0.5], &[0.25, 0.75], &cost, 0, TOL).unwrap();
        assert!((solution.cost - 0.25).abs() < TOL);
        assert_eq!(solution.iterations, 0);
    }

    #[test]
    fn iteration_cap() {
        let cost = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert_eq!(
            solve(&[0.5, 0.5], &[0.5, 0.5], &cost, 0, TOL),
            Err(LpError::IterationLimit(0))
        );
    }
}
