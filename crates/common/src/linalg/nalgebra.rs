pub type Vector<T = f64> = na::DVector<T>;
pub type Matrix<T = f64> = na::DMatrix<T>;

pub trait MatrixExt {
  fn is_symmetric(&self, eps: f64) -> bool;
  fn is_spd(&self) -> bool;
}
impl MatrixExt for Matrix {
  fn is_symmetric(&self, eps: f64) -> bool {
    if self.nrows() != self.ncols() {
      return false;
    }
    (self - self.transpose()).abs().max() <= eps
  }
  fn is_spd(&self) -> bool {
    na::Cholesky::new(self.clone()).is_some()
  }
}

/// Solves the symmetric positive definite system `A x = b` by Cholesky
/// factorization. Returns `None` if the factorization breaks down.
pub fn spd_solve(a: Matrix, b: &Vector) -> Option<Vector> {
  na::Cholesky::new(a).map(|chol| chol.solve(b))
}

#[cfg(test)]
mod test {
  use super::*;

  use approx::assert_relative_eq;

  #[test]
  fn spd_solve_roundtrip() {
    let a = na::dmatrix![
      4.0, 1.0, 0.0;
      1.0, 3.0, 1.0;
      0.0, 1.0, 2.0;
    ];
    assert!(a.is_symmetric(0.0));
    assert!(a.is_spd());

    let x = na::dvector![1.0, -2.0, 0.5];
    let b = &a * &x;
    let solved = spd_solve(a, &b).unwrap();
    assert_relative_eq!(solved, x, epsilon = 1e-13);
  }

  #[test]
  fn indefinite_matrix_is_rejected() {
    let a = na::dmatrix![
      0.0, 1.0;
      1.0, 0.0;
    ];
    assert!(!a.is_spd());
    assert!(spd_solve(a, &na::dvector![1.0, 1.0]).is_none());
  }
}
