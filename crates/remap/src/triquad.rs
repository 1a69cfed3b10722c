use common::linalg::nalgebra::{Matrix, Vector};

/// Symmetric quadrature rule on the reference triangle, in barycentric form.
///
/// Weights sum to one, so `area * sum_l w_l f(g_l)` approximates the
/// integral of `f` over a triangle of that area.
pub struct TriangleQuadrature {
  points: Matrix,
  weights: Vector,
}

impl TriangleQuadrature {
  /// The 6-point rule of polynomial degree 4.
  pub fn degree4() -> Self {
    const W1: f64 = 0.223_381_589_678_011;
    const A1: f64 = 0.445_948_490_915_965;
    const B1: f64 = 0.108_103_018_168_070;
    const W2: f64 = 0.109_951_743_655_322;
    const A2: f64 = 0.091_576_213_509_771;
    const B2: f64 = 0.816_847_572_980_459;

    let points = na::dmatrix![
      B1, A1, A1;
      A1, B1, A1;
      A1, A1, B1;
      B2, A2, A2;
      A2, B2, A2;
      A2, A2, B2;
    ];
    let weights = na::dvector![W1, W1, W1, W2, W2, W2];
    Self { points, weights }
  }

  pub fn npoints(&self) -> usize {
    self.weights.len()
  }
  /// Barycentric coordinates of quadrature point `l`.
  pub fn point(&self, l: usize) -> [f64; 3] {
    [
      self.points[(l, 0)],
      self.points[(l, 1)],
      self.points[(l, 2)],
    ]
  }
  pub fn weight(&self, l: usize) -> f64 {
    self.weights[l]
  }
}

#[cfg(test)]
mod test {
  use super::*;

  use approx::assert_abs_diff_eq;

  #[test]
  fn barycentric_points_and_weights_normalized() {
    let rule = TriangleQuadrature::degree4();
    assert_abs_diff_eq!(rule.weights.sum(), 1.0, epsilon = 1e-12);
    for l in 0..rule.npoints() {
      let [g0, g1, g2] = rule.point(l);
      assert_abs_diff_eq!(g0 + g1 + g2, 1.0, epsilon = 1e-14);
      assert!(g0 > 0.0 && g1 > 0.0 && g2 > 0.0);
    }
  }

  #[test]
  fn exact_through_degree_four() {
    let rule = TriangleQuadrature::degree4();
    for a in 0..=4usize {
      for b in 0..=4 - a {
        for c in 0..=4 - a - b {
          let computed: f64 = (0..rule.npoints())
            .map(|l| {
              let [g0, g1, g2] = rule.point(l);
              rule.weight(l) * g0.powi(a as i32) * g1.powi(b as i32) * g2.powi(c as i32)
            })
            .sum();
          // Mean of a barycentric monomial over the triangle.
          let exact =
            2.0 * (factorial(a) * factorial(b) * factorial(c)) / factorial(a + b + c + 2);
          assert_abs_diff_eq!(computed, exact, epsilon = 1e-13);
        }
      }
    }
  }

  fn factorial(n: usize) -> f64 {
    (1..=n).product::<usize>() as f64
  }
}
