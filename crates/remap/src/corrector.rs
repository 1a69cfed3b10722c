use crate::error::RemapError;

use common::linalg::nalgebra::{spd_solve, Matrix, Vector};

use tracing::warn;

/// Rewrites `coeff` in place with the minimum-Frobenius-norm feasible
/// correction enforcing the two map invariants:
///
/// - consistency: every row sums to one;
/// - conservation: every column, weighted by `target_area`, sums to the
///   matching entry of `source_area`.
///
/// One of the `nrows + ncols` conditions is linearly dependent on the others
/// (the row sums weighted by `target_area` equal the weighted column sums
/// whenever total areas agree), so the last conservation equation is
/// dropped. The constrained least-squares problem is reduced to its Schur
/// complement, whose matrix is assembled analytically and solved by
/// Cholesky factorization.
///
/// With `monotone` set, a remaining negative coefficient is removed by
/// blending with the low-order donor map; see [`apply_monotone_blend`].
pub fn force_consistency_conservation(
  source_area: &Vector,
  target_area: &Vector,
  coeff: &mut Matrix,
  monotone: bool,
) -> Result<(), RemapError> {
  let nrows = coeff.nrows();
  let ncols = coeff.ncols();
  assert!(source_area.len() == ncols && target_area.len() == nrows);
  let ncoeff = nrows * ncols;

  let constraints = constraint_matrix(target_area, nrows, ncols);

  // Least-squares target: the current coefficients, flattened row-major.
  let mut flat = Vector::from_fn(ncoeff, |ix, _| coeff[(ix / ncols, ix % ncols)]);

  // Constraint targets, the dependent conservation equation dropped.
  let mut rhs = Vector::zeros(nrows + ncols - 1);
  for i in 0..nrows {
    rhs[i] = 1.0;
  }
  for j in 0..ncols - 1 {
    rhs[nrows + j] = source_area[j];
  }

  // rhs <- C^T flat - rhs
  rhs.gemv_tr(1.0, &constraints, &flat, -1.0);

  let schur = schur_matrix(target_area, nrows, ncols);
  let multipliers = spd_solve(schur, &rhs).ok_or(RemapError::SchurSolveFailed)?;

  // flat <- flat - C multipliers
  flat.gemv(-1.0, &constraints, &multipliers, 1.0);

  for i in 0..nrows {
    for j in 0..ncols {
      coeff[(i, j)] = flat[i * ncols + j];
    }
  }

  if monotone {
    apply_monotone_blend(source_area, target_area, coeff);
  }
  Ok(())
}

/// Constraint matrix `C`: one column per imposed condition, over the
/// row-major flattened coefficients. The first `nrows` columns carry the
/// consistency conditions, the remaining `ncols - 1` the conservation
/// conditions weighted by the target areas.
pub fn constraint_matrix(target_area: &Vector, nrows: usize, ncols: usize) -> Matrix {
  let mut constraints = Matrix::zeros(nrows * ncols, nrows + ncols - 1);
  for i in 0..nrows {
    for j in 0..ncols {
      constraints[(i * ncols + j, i)] = 1.0;
      if j != ncols - 1 {
        constraints[(i * ncols + j, nrows + j)] = target_area[i];
      }
    }
  }
  constraints
}

/// The Gram matrix `C^T C` of [`constraint_matrix`], assembled analytically:
/// `diag(ncols)` on the consistency block, the target areas on the coupling
/// blocks and `diag(sum_i target_area[i]^2)` on the conservation block.
pub fn schur_matrix(target_area: &Vector, nrows: usize, ncols: usize) -> Matrix {
  let ncond = nrows + ncols - 1;
  let mut schur = Matrix::zeros(ncond, ncond);
  let squared_area: f64 = target_area.iter().map(|a| a * a).sum();

  for i in 0..nrows {
    schur[(i, i)] = ncols as f64;
    for j in 0..ncols - 1 {
      schur[(i, nrows + j)] = target_area[i];
      schur[(nrows + j, i)] = target_area[i];
    }
  }
  for j in 0..ncols - 1 {
    schur[(nrows + j, nrows + j)] = squared_area;
  }
  schur
}

/// Blends `coeff` with the low-order donor map `D[(i, j)] = source_area[j] /
/// sum(source_area)` by the smallest convex combination wiping out every
/// negative coefficient.
///
/// The donor has unit row sums, so consistency survives the blend.
/// Conservation generally does not (the donor is only a feasible column
/// profile under uniform target areas); the residual is reported and left
/// in place, since re-projecting would reintroduce negative weights.
fn apply_monotone_blend(source_area: &Vector, target_area: &Vector, coeff: &mut Matrix) {
  let total: f64 = source_area.sum();

  let mut lambda = 0.0f64;
  for i in 0..coeff.nrows() {
    for j in 0..coeff.ncols() {
      let value = coeff[(i, j)];
      if value < 0.0 {
        let donor = source_area[j] / total;
        lambda = lambda.max(-value / (donor - value).abs());
      }
    }
  }
  if lambda == 0.0 {
    return;
  }

  for j in 0..coeff.ncols() {
    let donor = source_area[j] / total;
    for i in 0..coeff.nrows() {
      coeff[(i, j)] = (1.0 - lambda) * coeff[(i, j)] + lambda * donor;
    }
  }

  let mut drift = 0.0f64;
  for j in 0..coeff.ncols() {
    let column: f64 = (0..coeff.nrows()).map(|i| target_area[i] * coeff[(i, j)]).sum();
    drift = drift.max((column - source_area[j]).abs());
  }
  warn!(lambda, drift, "monotone blend applied; conservation residual left unprojected");
}
