use common::linalg::nalgebra::{Matrix, Vector};

use std::f64::consts::PI;

/// Gauss-Lobatto-Legendre nodes and quadrature weights of order `np`
/// (`np` points including both endpoints), mapped onto [0, 1].
pub fn gauss_lobatto_points(np: usize) -> (Vector, Vector) {
  assert!(np >= 2);
  let n = np - 1;

  let mut nodes = Vector::zeros(np);
  nodes[0] = -1.0;
  nodes[n] = 1.0;
  for k in 1..n {
    // The interior nodes are the roots of P'_n. Newton iteration from the
    // Chebyshev-Gauss-Lobatto guess.
    let mut x: f64 = -(PI * k as f64 / n as f64).cos();
    for _ in 0..100 {
      let (p, pm1) = legendre_with_prev(n, x);
      let dp = n as f64 * (pm1 - x * p) / (1.0 - x * x);
      let ddp = (2.0 * x * dp - (n * (n + 1)) as f64 * p) / (1.0 - x * x);
      let dx = dp / ddp;
      x -= dx;
      if dx.abs() < 1e-15 {
        break;
      }
    }
    nodes[k] = x;
  }

  let mut weights = Vector::zeros(np);
  for k in 0..np {
    let (p, _) = legendre_with_prev(n, nodes[k]);
    weights[k] = 2.0 / ((n * np) as f64 * p * p);
  }

  // Affine map [-1, 1] -> [0, 1].
  let nodes = nodes.map(|x| (x + 1.0) / 2.0);
  let weights = weights / 2.0;
  (nodes, weights)
}

/// Legendre values `(P_n(x), P_{n-1}(x))` by the three-term recurrence.
fn legendre_with_prev(n: usize, x: f64) -> (f64, f64) {
  assert!(n >= 1);
  let mut pm1 = 1.0;
  let mut p = x;
  for k in 2..=n {
    let pk = ((2 * k - 1) as f64 * x * p - (k - 1) as f64 * pm1) / k as f64;
    pm1 = p;
    p = pk;
  }
  (p, pm1)
}

/// Tensor-product nodal basis values at `(alpha, beta)` in the unit square.
///
/// The standard branch evaluates the Lagrange interpolants through the GLL
/// nodes, `S[(p, q)] = L_p(alpha) * L_q(beta)`; these take negative values
/// for `np >= 3`. The monotone branch instead spreads the sample bilinearly
/// over the four GLL nodes surrounding it, keeping every weight
/// nonnegative. Both branches form a partition of unity.
pub fn sample_basis(nodes: &Vector, alpha: f64, beta: f64, monotone: bool) -> Matrix {
  if monotone {
    sample_bilinear(nodes, alpha, beta)
  } else {
    let np = nodes.len();
    let la = lagrange_coeffs(nodes, alpha);
    let lb = lagrange_coeffs(nodes, beta);
    Matrix::from_fn(np, np, |p, q| la[p] * lb[q])
  }
}

fn lagrange_coeffs(nodes: &Vector, x: f64) -> Vector {
  let np = nodes.len();
  Vector::from_fn(np, |p, _| {
    (0..np)
      .filter(|&m| m != p)
      .map(|m| (x - nodes[m]) / (nodes[p] - nodes[m]))
      .product()
  })
}

/// Piecewise-bilinear weights on the GLL sub-grid: only the four nodes of
/// the sub-cell containing `(alpha, beta)` receive weight.
fn sample_bilinear(nodes: &Vector, alpha: f64, beta: f64) -> Matrix {
  let np = nodes.len();
  let i = subcell(nodes, alpha);
  let j = subcell(nodes, beta);
  let ta = (alpha - nodes[i]) / (nodes[i + 1] - nodes[i]);
  let tb = (beta - nodes[j]) / (nodes[j + 1] - nodes[j]);

  let mut basis = Matrix::zeros(np, np);
  basis[(i, j)] = (1.0 - ta) * (1.0 - tb);
  basis[(i + 1, j)] = ta * (1.0 - tb);
  basis[(i, j + 1)] = (1.0 - ta) * tb;
  basis[(i + 1, j + 1)] = ta * tb;
  basis
}

/// Index of the GLL sub-cell containing `x`; a shared boundary belongs to
/// the lower-indexed cell.
fn subcell(nodes: &Vector, x: f64) -> usize {
  let ncells = nodes.len() - 1;
  (0..ncells).rev().find(|&i| nodes[i] <= x).unwrap_or(0)
}

#[cfg(test)]
mod test {
  use super::*;

  use approx::{assert_abs_diff_eq, assert_relative_eq};
  use rand::{Rng, SeedableRng};

  #[test]
  fn known_nodes_and_weights() {
    let (g2, w2) = gauss_lobatto_points(2);
    assert_relative_eq!(g2, na::dvector![0.0, 1.0]);
    assert_relative_eq!(w2, na::dvector![0.5, 0.5]);

    let (g3, w3) = gauss_lobatto_points(3);
    assert_relative_eq!(g3, na::dvector![0.0, 0.5, 1.0], epsilon = 1e-15);
    assert_relative_eq!(
      w3,
      na::dvector![1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0],
      epsilon = 1e-15
    );

    let (g4, w4) = gauss_lobatto_points(4);
    let x = 1.0 / 5.0f64.sqrt();
    assert_relative_eq!(
      g4,
      na::dvector![0.0, (1.0 - x) / 2.0, (1.0 + x) / 2.0, 1.0],
      epsilon = 1e-14
    );
    assert_relative_eq!(
      w4,
      na::dvector![1.0 / 12.0, 5.0 / 12.0, 5.0 / 12.0, 1.0 / 12.0],
      epsilon = 1e-14
    );

    let (g5, w5) = gauss_lobatto_points(5);
    let x = (3.0f64 / 7.0).sqrt();
    assert_relative_eq!(
      g5,
      na::dvector![0.0, (1.0 - x) / 2.0, 0.5, (1.0 + x) / 2.0, 1.0],
      epsilon = 1e-14
    );
    assert_relative_eq!(
      w5,
      na::dvector![
        1.0 / 20.0,
        49.0 / 180.0,
        16.0 / 45.0,
        49.0 / 180.0,
        1.0 / 20.0
      ],
      epsilon = 1e-14
    );
  }

  #[test]
  fn weights_integrate_constants() {
    for np in 2..=8 {
      let (_, weights) = gauss_lobatto_points(np);
      assert_relative_eq!(weights.sum(), 1.0, epsilon = 1e-14);
    }
  }

  #[test]
  fn lagrange_basis_is_cardinal() {
    for np in 2..=5 {
      let (nodes, _) = gauss_lobatto_points(np);
      for m in 0..np {
        let basis = sample_basis(&nodes, nodes[m], nodes[m], false);
        for p in 0..np {
          for q in 0..np {
            let expected = if p == m && q == m { 1.0 } else { 0.0 };
            assert_abs_diff_eq!(basis[(p, q)], expected, epsilon = 1e-12);
          }
        }
      }
    }
  }

  #[test]
  fn partition_of_unity() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(3407);
    for np in 2..=5 {
      let (nodes, _) = gauss_lobatto_points(np);
      for _ in 0..1000 {
        let alpha = rng.gen::<f64>();
        let beta = rng.gen::<f64>();
        for monotone in [false, true] {
          let basis = sample_basis(&nodes, alpha, beta, monotone);
          assert_abs_diff_eq!(basis.sum(), 1.0, epsilon = 1e-13);
        }
      }
    }
  }

  #[test]
  fn monotone_branch_is_nonnegative_and_local() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(271);
    for np in 2..=5 {
      let (nodes, _) = gauss_lobatto_points(np);
      for _ in 0..200 {
        let basis = sample_basis(&nodes, rng.gen(), rng.gen(), true);
        assert!(basis.iter().all(|&v| v >= 0.0));
        assert!(basis.iter().filter(|&&v| v > 0.0).count() <= 4);
      }
    }
  }

  #[test]
  fn subcell_boundary_belongs_to_lower_cell() {
    let (nodes, _) = gauss_lobatto_points(4);
    // Sampling exactly on an interior node puts all weight on that node,
    // resolved through the lower-indexed sub-cell.
    let basis = sample_basis(&nodes, nodes[1], nodes[1], true);
    assert_abs_diff_eq!(basis[(1, 1)], 1.0, epsilon = 1e-15);
    assert_eq!(subcell(&nodes, nodes[1]), 1);
    assert_eq!(subcell(&nodes, 1.0), 2);
  }
}
