use crate::{Face, Mesh};

/// Newton steps before the inverse map gives up.
const MAX_NEWTON_ITER: usize = 50;
/// Convergence threshold on the residual norm of the inverse map.
const NEWTON_TOL: f64 = 1e-12;

/// A spherical quadrilateral: four unit-sphere corners, bilinearly
/// interpolated over the unit square and renormalized onto the sphere.
#[derive(Debug, Clone)]
pub struct SphericalQuad {
  corners: [na::Vector3<f64>; 4],
}

impl SphericalQuad {
  pub fn new(corners: [na::Vector3<f64>; 4]) -> Self {
    Self { corners }
  }

  pub fn from_face(mesh: &Mesh, face: &Face) -> Self {
    assert!(face.nedges() == 4);
    Self::new(std::array::from_fn(|i| mesh.node(face.vertex(i))))
  }

  /// Bilinear interpolation of the corners; not unit length.
  pub fn map(&self, alpha: f64, beta: f64) -> na::Vector3<f64> {
    let [v0, v1, v2, v3] = &self.corners;
    v0 * ((1.0 - alpha) * (1.0 - beta))
      + v1 * (alpha * (1.0 - beta))
      + v2 * (alpha * beta)
      + v3 * ((1.0 - alpha) * beta)
  }

  /// The reference-to-sphere map `G`.
  pub fn map_sphere(&self, alpha: f64, beta: f64) -> na::Vector3<f64> {
    self.map(alpha, beta).normalize()
  }

  fn dmap(&self, alpha: f64, beta: f64) -> (na::Vector3<f64>, na::Vector3<f64>) {
    let [v0, v1, v2, v3] = &self.corners;
    let dalpha = (v1 - v0) * (1.0 - beta) + (v2 - v3) * beta;
    let dbeta = (v3 - v0) * (1.0 - alpha) + (v2 - v1) * alpha;
    (dalpha, dbeta)
  }

  /// Jacobian determinant of `G`, the local area element on the sphere.
  pub fn sphere_jacobian(&self, alpha: f64, beta: f64) -> f64 {
    let (ga, gb) = self.dmap_sphere(alpha, beta);
    ga.cross(&gb).norm()
  }

  /// Partial derivatives of `G`; they live in the tangent plane at
  /// `G(alpha, beta)`.
  fn dmap_sphere(&self, alpha: f64, beta: f64) -> (na::Vector3<f64>, na::Vector3<f64>) {
    let f = self.map(alpha, beta);
    let norm = f.norm();
    let n = f / norm;
    let (fa, fb) = self.dmap(alpha, beta);
    let ga = (fa - &n * n.dot(&fa)) / norm;
    let gb = (fb - &n * n.dot(&fb)) / norm;
    (ga, gb)
  }

  /// Recovers the reference coordinates of a unit-sphere point on the quad by
  /// Gauss-Newton iteration on the residual `G(alpha, beta) - query`.
  ///
  /// The result is not range checked; callers decide how much excursion
  /// beyond the unit square to accept.
  pub fn invert_map(&self, query: &na::Vector3<f64>) -> (f64, f64) {
    let mut alpha = 0.5;
    let mut beta = 0.5;
    for _ in 0..MAX_NEWTON_ITER {
      let residual = self.map_sphere(alpha, beta) - query;
      if residual.norm() < NEWTON_TOL {
        break;
      }
      let (ga, gb) = self.dmap_sphere(alpha, beta);
      let gram = na::Matrix2::new(
        ga.dot(&ga),
        ga.dot(&gb),
        gb.dot(&ga),
        gb.dot(&gb),
      );
      let rhs = na::Vector2::new(-ga.dot(&residual), -gb.dot(&residual));
      let Some(step) = gram.lu().solve(&rhs) else {
        break;
      };
      alpha += step.x;
      beta += step.y;
    }
    (alpha, beta)
  }
}
