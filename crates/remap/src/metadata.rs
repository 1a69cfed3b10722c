use crate::{error::RemapError, gll};

use common::linalg::nalgebra::Vector;
use itertools::Itertools;
use spheremesh::{quad::SphericalQuad, Mesh};

use std::collections::HashMap;
use tracing::debug;

/// Spectral-element metadata of a quadrilateral mesh: the global degree of
/// freedom behind each elementwise GLL node `(p, q)` and the spherical
/// Jacobian weight attached to it.
pub struct GllMetadata {
  order: usize,
  nelements: usize,
  ndofs: usize,
  nodes: Vec<usize>,
  jacobian: Vec<f64>,
}

impl GllMetadata {
  pub fn order(&self) -> usize {
    self.order
  }
  pub fn nelements(&self) -> usize {
    self.nelements
  }
  pub fn ndofs(&self) -> usize {
    self.ndofs
  }

  fn idx(&self, p: usize, q: usize, e: usize) -> usize {
    assert!(p < self.order && q < self.order && e < self.nelements);
    (p * self.order + q) * self.nelements + e
  }

  /// Global DOF of the `(p, q)` node of element `e`.
  pub fn node(&self, p: usize, q: usize, e: usize) -> usize {
    self.nodes[self.idx(p, q, e)]
  }
  pub fn jacobian(&self, p: usize, q: usize, e: usize) -> f64 {
    self.jacobian[self.idx(p, q, e)]
  }

  /// Builds metadata from arrays carrying 1-based DOF ids, the convention of
  /// SE metadata files. Ids are normalized to 0-based here, once.
  pub fn from_one_based(
    order: usize,
    nelements: usize,
    nodes: Vec<usize>,
    jacobian: Vec<f64>,
  ) -> Self {
    assert!(order >= 2);
    assert!(nodes.len() == order * order * nelements);
    assert!(jacobian.len() == nodes.len());
    assert!(nodes.iter().all(|&id| id >= 1), "DOF ids are 1-based");
    let nodes: Vec<_> = nodes.into_iter().map(|id| id - 1).collect();
    let ndofs = nodes.iter().max().map_or(0, |&id| id + 1);
    Self {
      order,
      nelements,
      ndofs,
      nodes,
      jacobian,
    }
  }

  /// Nodal Jacobians of one element, flattened as `p * order + q`.
  pub fn element_jacobians(&self, e: usize) -> Vector {
    Vector::from_fn(self.order * self.order, |pq, _| {
      self.jacobian[pq * self.nelements + e]
    })
  }

  /// Area attached to each global DOF: the nodal Jacobians summed over the
  /// elements sharing it.
  pub fn dof_areas(&self) -> Vector {
    let mut areas = Vector::zeros(self.ndofs);
    for e in 0..self.nelements {
      for (p, q) in (0..self.order).cartesian_product(0..self.order) {
        areas[self.node(p, q, e)] += self.jacobian(p, q, e);
      }
    }
    areas
  }

  /// Numerical area of the mesh: the sum of all nodal Jacobians.
  pub fn total_jacobian(&self) -> f64 {
    self.jacobian.iter().sum()
  }
}

/// Numbers the continuous GLL DOFs of a quadrilateral SE mesh and computes
/// the spherical Jacobian weight `w_p w_q |J|` at every nodal point.
///
/// Nodes shared across element boundaries are merged by quantized position,
/// so the numbering is continuous. The numerical area is reported against
/// the geometric mesh area but not enforced.
///
/// With `bubble` set (order 3 and up), the per-element defect between the
/// geometric face area and the nodal Jacobian sum is folded back onto the
/// interior nodes, so each element's Jacobians sum to its face area exactly.
pub fn generate_metadata(mesh: &Mesh, order: usize, bubble: bool) -> Result<GllMetadata, RemapError> {
  assert!(order >= 2);
  assert!(!bubble || order >= 3, "bubble adjustment needs interior nodes");
  let np = order;
  let nelements = mesh.nfaces();
  let (gll_nodes, gll_weights) = gll::gauss_lobatto_points(np);

  let mut nodes = vec![0; np * np * nelements];
  let mut jacobian = vec![0.0; np * np * nelements];
  let mut dof_index: HashMap<[i64; 3], usize> = HashMap::new();

  for e in 0..nelements {
    let face = mesh.face(e);
    if face.nedges() != 4 {
      return Err(RemapError::UnsupportedElement {
        element: e,
        nedges: face.nedges(),
      });
    }
    let element = SphericalQuad::from_face(mesh, face);

    for (p, q) in (0..np).cartesian_product(0..np) {
      let point = element.map_sphere(gll_nodes[p], gll_nodes[q]);
      let key = [quantize(point.x), quantize(point.y), quantize(point.z)];
      let next_dof = dof_index.len();
      let dof = *dof_index.entry(key).or_insert(next_dof);

      let ix = (p * np + q) * nelements + e;
      nodes[ix] = dof;
      jacobian[ix] =
        gll_weights[p] * gll_weights[q] * element.sphere_jacobian(gll_nodes[p], gll_nodes[q]);
    }

    if bubble {
      let numerical: f64 = (0..np * np).map(|pq| jacobian[pq * nelements + e]).sum();
      let defect = mesh.face_area(e) - numerical;
      let interior = (1..np - 1).cartesian_product(1..np - 1);
      let bubble_mass: f64 = interior
        .clone()
        .map(|(p, q)| gll_weights[p] * gll_weights[q])
        .sum();
      for (p, q) in interior {
        jacobian[(p * np + q) * nelements + e] +=
          defect * gll_weights[p] * gll_weights[q] / bubble_mass;
      }
    }
  }

  let metadata = GllMetadata {
    order,
    nelements,
    ndofs: dof_index.len(),
    nodes,
    jacobian,
  };
  debug!(
    numerical = metadata.total_jacobian(),
    geometric = mesh.total_area(),
    "numerical vs geometric mesh area"
  );
  Ok(metadata)
}

fn quantize(x: f64) -> i64 {
  (x * 1e7).round() as i64
}
