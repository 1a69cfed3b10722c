use faer::linalg::solvers::Solve;

use super::nalgebra::{Matrix, Vector};

pub fn faervec2navec(faer: &faer::Mat<f64>) -> Vector {
  assert!(faer.ncols() == 1);
  Vector::from_iterator(faer.nrows(), faer.row_iter().map(|r| r[0]))
}

pub fn navec2faervec(na: &Vector) -> faer::Mat<f64> {
  let mut faer = faer::Mat::zeros(na.nrows(), 1);
  for (i, &v) in na.iter().enumerate() {
    faer[(i, 0)] = v;
  }
  faer
}

pub fn namat2faermat(na: &Matrix) -> faer::Mat<f64> {
  faer::Mat::from_fn(na.nrows(), na.ncols(), |i, j| na[(i, j)])
}

/// Dense symmetric-indefinite solver (Bunch-Kaufman LDLT).
pub struct FaerSymmetric {
  raw: faer::linalg::solvers::Lblt<f64>,
}
impl FaerSymmetric {
  pub fn new(a: &Matrix) -> Self {
    let a = namat2faermat(a);
    let raw = faer::linalg::solvers::Lblt::new(a.as_ref(), faer::Side::Lower);
    Self { raw }
  }
  pub fn solve(&self, b: &Vector) -> Vector {
    let b = navec2faervec(b);
    let x = self.raw.solve(&b);
    faervec2navec(&x)
  }
}
