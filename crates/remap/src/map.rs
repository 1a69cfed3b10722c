use common::linalg::nalgebra::Vector;
use common::sparse::SparseMatrix;

use tracing::warn;

/// The assembled remap operator `W`: rows are target faces, columns source
/// DOFs, so `v = W u` carries a nodal source field to target cell averages.
///
/// Assembly only ever adds; duplicate `(row, col)` contributions combine
/// additively on compression.
pub struct OfflineMap {
  matrix: SparseMatrix,
}

impl OfflineMap {
  pub fn new(ntarget_faces: usize, nsource_dofs: usize) -> Self {
    Self {
      matrix: SparseMatrix::zeros(ntarget_faces, nsource_dofs),
    }
  }

  pub fn nrows(&self) -> usize {
    self.matrix.nrows()
  }
  pub fn ncols(&self) -> usize {
    self.matrix.ncols()
  }
  pub fn matrix(&self) -> &SparseMatrix {
    &self.matrix
  }

  pub fn add(&mut self, target_face: usize, source_dof: usize, weight: f64) {
    self.matrix.push(target_face, source_dof, weight);
  }

  pub fn to_csr(&self) -> nas::CsrMatrix<f64> {
    self.matrix.to_nalgebra_csr()
  }

  /// Applies the operator to a source field.
  pub fn apply(&self, u: &Vector) -> Vector {
    assert!(u.len() == self.ncols());
    let csr = self.to_csr();
    let mut v = Vector::zeros(csr.nrows());
    for (r, row) in csr.row_iter().enumerate() {
      v[r] = row
        .col_indices()
        .iter()
        .zip(row.values())
        .map(|(&c, &w)| w * u[c])
        .sum();
    }
    v
  }

  /// Largest deviation of any row sum from one. A constant source field maps
  /// to the same constant exactly when this vanishes.
  pub fn consistency_residual(&self) -> f64 {
    let csr = self.to_csr();
    csr
      .row_iter()
      .map(|row| (row.values().iter().sum::<f64>() - 1.0).abs())
      .fold(0.0, f64::max)
  }

  /// Largest deviation of the target-area-weighted column sums from the
  /// source DOF areas. The map preserves integrals exactly when this
  /// vanishes.
  pub fn conservation_residual(&self, source_dof_area: &Vector, target_area: &[f64]) -> f64 {
    assert!(source_dof_area.len() == self.ncols() && target_area.len() == self.nrows());
    let csr = self.to_csr();
    let mut column_sums = Vector::zeros(self.ncols());
    for (r, row) in csr.row_iter().enumerate() {
      for (&c, &w) in row.col_indices().iter().zip(row.values()) {
        column_sums[c] += target_area[r] * w;
      }
    }
    (column_sums - source_dof_area).abs().max()
  }

  /// Magnitude of the most negative weight, zero if none are negative.
  pub fn monotonicity_residual(&self) -> f64 {
    self
      .to_csr()
      .values()
      .iter()
      .fold(0.0f64, |worst, &w| worst.max(-w))
  }

  pub fn is_consistent(&self, tol: f64) -> bool {
    let residual = self.consistency_residual();
    if residual > tol {
      warn!(residual, "map is not consistent");
      return false;
    }
    true
  }

  pub fn is_conservative(
    &self,
    source_dof_area: &Vector,
    target_area: &[f64],
    tol: f64,
  ) -> bool {
    let residual = self.conservation_residual(source_dof_area, target_area);
    if residual > tol {
      warn!(residual, "map is not conservative");
      return false;
    }
    true
  }

  pub fn is_monotone(&self, tol: f64) -> bool {
    let residual = self.monotonicity_residual();
    if residual > tol {
      warn!(residual, "map is not monotone");
      return false;
    }
    true
  }
}
